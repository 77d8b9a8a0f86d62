mod cli;

use std::sync::Arc;

use anyhow::{bail, Context};
use modelhub_core::providers::create_provider_registry;
use modelhub_core::tools::create_tool_dispatcher;
use modelhub_core::{ConversationStore, ProviderRegistry, ProviderType, ToolDispatcher};
use serde_json::{json, Value};

fn main() {
    if let Err(error) = run() {
        eprintln!("modelhub failed: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse_args();
    let config = modelhub_core::config::load(args.config.as_deref())?;
    modelhub_core::logging::init_tracing(args.log_level.as_deref().unwrap_or(&config.logging.level));

    let registry = Arc::new(create_provider_registry(&config));
    tracing::debug!(command = ?args.command, "running command");

    match args.command {
        cli::Command::Providers => print_providers(&registry)?,
        cli::Command::Resolve { model } => match registry.provider_for_model(&model)? {
            Some(provider) => println!(
                "{model} -> {} ({})",
                provider.provider_type(),
                provider.resolve_model_name(&model)
            ),
            None => bail!("no configured provider serves model '{model}'"),
        },
        cli::Command::Fallback { category } => {
            println!("{}", registry.preferred_fallback_model(category)?);
        }
        cli::Command::Models { json } => print_models(&registry, json)?,
        cli::Command::Chat {
            prompt,
            model,
            continuation_id,
            files,
            temperature,
            max_tokens,
        } => {
            let dispatcher = dispatcher(&config, &registry)?;
            let result = call_tool(
                &dispatcher,
                "chat",
                json!({
                    "prompt": prompt,
                    "model": model,
                    "continuation_id": continuation_id,
                    "files": files,
                    "temperature": temperature,
                    "max_tokens": max_tokens,
                }),
            )?;
            println!("{}", result["response"].as_str().unwrap_or_default());
            if let Some(thread) = result["continuation_id"].as_str() {
                eprintln!("continuation_id: {thread}");
            }
        }
        cli::Command::Version => {
            let dispatcher = dispatcher(&config, &registry)?;
            let result = call_tool(&dispatcher, "get_version", Value::Null)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        cli::Command::Tools => {
            let dispatcher = dispatcher(&config, &registry)?;
            for (name, description) in dispatcher.tools() {
                println!("{name:<12} {description}");
            }
        }
    }

    Ok(())
}

fn dispatcher(
    config: &modelhub_core::Config,
    registry: &Arc<ProviderRegistry>,
) -> anyhow::Result<ToolDispatcher> {
    let store = ConversationStore::from_config(&config.conversation)
        .context("failed to open conversation store")?;
    Ok(create_tool_dispatcher(Arc::clone(registry), Arc::new(store)))
}

fn call_tool(dispatcher: &ToolDispatcher, name: &str, args: Value) -> anyhow::Result<Value> {
    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    Ok(runtime.block_on(dispatcher.call(name, args))?)
}

fn print_models(registry: &ProviderRegistry, json: bool) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for (model, provider_type) in registry.available_models()? {
        let spec = registry
            .get_provider(provider_type, false)?
            .and_then(|provider| provider.model_info(&model).cloned());
        rows.push(json!({
            "model": model,
            "provider": provider_type.as_str(),
            "context_window": spec.as_ref().map(|spec| spec.context_window),
            "extended_thinking": spec.as_ref().is_some_and(|spec| spec.supports_extended_thinking),
            "description": spec.and_then(|spec| spec.description),
        }));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No models available. Set a provider API key first.");
    } else {
        for row in &rows {
            let context = row["context_window"]
                .as_u64()
                .map(|tokens| tokens.to_string())
                .unwrap_or_else(|| "-".to_owned());
            println!(
                "{:<40} {:<10} {:>9}  {}",
                row["model"].as_str().unwrap_or_default(),
                row["provider"].as_str().unwrap_or_default(),
                context,
                row["description"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn print_providers(registry: &ProviderRegistry) -> anyhow::Result<()> {
    let with_keys = registry.available_providers_with_keys()?;
    println!("Providers (resolution order):");
    for provider_type in ProviderType::PRIORITY_ORDER {
        if !registry.is_registered(provider_type) {
            continue;
        }
        let status = if with_keys.contains(&provider_type) {
            "ready"
        } else if provider_type == ProviderType::Custom {
            "missing CUSTOM_API_URL"
        } else {
            "missing API key"
        };
        println!(
            "- {provider_type:<10} {status:<24} ({})",
            provider_type.api_key_env()
        );
    }
    Ok(())
}
