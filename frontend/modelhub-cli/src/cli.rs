use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelhub_core::ToolModelCategory;

#[derive(Debug, Parser)]
#[command(name = "modelhub", about = "Resolve model names to configured providers")]
pub struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(long, env = "MODELHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset. Overrides `[logging] level`.
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List registered providers and whether their credentials resolve.
    Providers,
    /// Show which provider serves a model.
    Resolve { model: String },
    /// Print the default model for a tool category.
    Fallback {
        #[arg(long, value_parser = parse_category)]
        category: Option<ToolModelCategory>,
    },
    /// List every model the usable providers advertise.
    Models {
        #[arg(long)]
        json: bool,
    },
    /// Send a prompt to whichever provider serves the model.
    Chat {
        prompt: String,
        /// Model name or alias; the balanced fallback model when omitted.
        #[arg(long)]
        model: Option<String>,
        /// Continue an earlier thread (needs `[conversation] store_path`
        /// to survive between runs).
        #[arg(long)]
        continuation_id: Option<String>,
        /// Files to note against the user turn.
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long, default_value_t = 0.5)]
        temperature: f32,
        #[arg(long, default_value_t = 4_096)]
        max_tokens: usize,
    },
    /// Print version, platform, and configured providers as JSON.
    Version,
    /// List the built-in tools.
    Tools,
}

fn parse_category(value: &str) -> Result<ToolModelCategory, String> {
    value.parse().map_err(|err: modelhub_core::Error| err.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
