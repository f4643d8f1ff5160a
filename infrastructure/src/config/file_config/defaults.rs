//! Default settings from TOML (`[defaults]` section)

use serde::{Deserialize, Serialize};

/// Fallbacks applied to agents that omit a field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDefaultsConfig {
    /// Provider used when an agent names none
    pub provider: Option<String>,
    /// Model used when an agent names none
    pub model: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f64>,
    /// Completion cap override
    pub max_tokens: Option<u32>,
}
