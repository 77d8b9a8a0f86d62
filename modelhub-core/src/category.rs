use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coarse classification a tool uses to ask for a sensible default model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolModelCategory {
    ExtendedReasoning,
    FastResponse,
    Balanced,
}

impl ToolModelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtendedReasoning => "extended_reasoning",
            Self::FastResponse => "fast_response",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for ToolModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ToolModelCategory {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "extended_reasoning" => Ok(Self::ExtendedReasoning),
            "fast_response" => Ok(Self::FastResponse),
            "balanced" => Ok(Self::Balanced),
            other => Err(Error::Validation(format!(
                "unknown tool model category '{other}' (expected extended_reasoning, fast_response or balanced)"
            ))),
        }
    }
}
