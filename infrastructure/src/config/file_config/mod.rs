//! Top-level configuration file format.
//!
//! ```toml
//! [providers]
//! default = "openai"
//!
//! [providers.openai]
//! api_key_env = "OPENAI_API_KEY"
//!
//! [defaults]
//! model = "gpt-4o"
//! temperature = 0.7
//!
//! [[agents]]
//! id = "critic"
//! name = "The Critic"
//! provider = "anthropic"
//! personality = { preset = "critic" }
//! ```

mod agents;
mod defaults;
mod providers;

pub use agents::{FileAgentConfig, FileCustomPersonality, FilePersonalityConfig};
pub use defaults::FileDefaultsConfig;
pub use providers::{
    FileAnthropicConfig, FileGeminiConfig, FileOpenAiConfig, FileProvidersConfig,
};

use serde::{Deserialize, Serialize};

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider endpoints and credentials
    pub providers: FileProvidersConfig,
    /// Fallbacks applied to agents that omit a field
    pub defaults: FileDefaultsConfig,
    /// Participating agents
    pub agents: Vec<FileAgentConfig>,
}

impl FileConfig {
    /// Validate the whole tree, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let mut seen_ids = std::collections::HashSet::new();
        for agent in &self.agents {
            if !seen_ids.insert(agent.id.as_str()) {
                issues.push(format!("agents: duplicate agent id {:?}", agent.id));
            }
            issues.extend(agent.validate());
            if !self.providers.is_known(&agent.provider) {
                issues.push(format!(
                    "agents: agent {:?} references unknown provider {:?}",
                    agent.id, agent.provider
                ));
            }
        }
        if let Some(default) = &self.providers.default
            && !self.providers.is_known(default)
        {
            issues.push(format!("providers: unknown default provider {:?}", default));
        }
        issues
    }
}
