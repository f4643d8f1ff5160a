//! Agent configuration from TOML (`[[agents]]` entries)

use conclave_domain::personality::{CommunicationStyle, Personality};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Personality selection: a preset key, or a full custom block.
///
/// Preset keys: `analyst`, `creative`, `critic`, `diplomat`, and
/// `expert:<domain>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersonalityConfig {
    pub preset: Option<String>,
    pub custom: Option<FileCustomPersonality>,
}

/// Custom personality block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCustomPersonality {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub expertise: Option<String>,
    pub creativity: Option<f64>,
    pub precision: Option<f64>,
    pub communication_style: Option<String>,
    pub traits: BTreeMap<String, String>,
}

/// One participating agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAgentConfig {
    /// Stable agent id
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider name ("openai", "anthropic", "gemini")
    pub provider: String,
    /// Model override; the provider default applies when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Personality selection
    #[serde(default)]
    pub personality: FilePersonalityConfig,
}

impl FileAgentConfig {
    /// Shorthand used by tests and examples
    pub fn preset(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        preset: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            model: None,
            personality: FilePersonalityConfig {
                preset: Some(preset.into()),
                custom: None,
            },
        }
    }

    /// Validate this entry, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.id.is_empty() {
            issues.push("agents: agent id must not be empty".to_string());
        }
        match (&self.personality.preset, &self.personality.custom) {
            (Some(preset), _) if Personality::preset(preset).is_none() => {
                issues.push(format!(
                    "agents: agent {:?} has unknown personality preset {:?}",
                    self.id, preset
                ));
            }
            (None, None) => {
                issues.push(format!(
                    "agents: agent {:?} needs a personality preset or custom block",
                    self.id
                ));
            }
            _ => {}
        }
        if let Some(custom) = &self.personality.custom
            && let Some(style) = &custom.communication_style
            && style.parse::<CommunicationStyle>().is_err()
        {
            issues.push(format!(
                "agents: agent {:?} has unknown communication style {:?}",
                self.id, style
            ));
        }
        issues
    }

    /// Resolve the configured personality.
    ///
    /// Preset wins when both are present. Numeric dials are clamped by
    /// the builder; an unparseable communication style falls back to the
    /// default (`validate` reports it).
    pub fn personality(&self) -> Option<Personality> {
        if let Some(preset) = &self.personality.preset {
            return Personality::preset(preset);
        }
        let custom = self.personality.custom.as_ref()?;

        let mut builder = Personality::builder(if custom.name.is_empty() {
            self.name.clone()
        } else {
            custom.name.clone()
        })
        .description(custom.description.clone())
        .system_prompt(custom.system_prompt.clone());
        if let Some(expertise) = &custom.expertise {
            builder = builder.expertise(expertise.clone());
        }
        if let Some(creativity) = custom.creativity {
            builder = builder.creativity(creativity);
        }
        if let Some(precision) = custom.precision {
            builder = builder.precision(precision);
        }
        if let Some(style) = custom
            .communication_style
            .as_deref()
            .and_then(|s| s.parse::<CommunicationStyle>().ok())
        {
            builder = builder.style(style);
        }
        for (key, value) in &custom.traits {
            builder = builder.trait_value(key.clone(), value.clone());
        }
        Some(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_resolution() {
        let agent = FileAgentConfig::preset("a1", "A1", "openai", "critic");
        let personality = agent.personality().unwrap();
        assert_eq!(personality.name, "Critic");
        assert!(agent.validate().is_empty());
    }

    #[test]
    fn test_expert_preset_resolution() {
        let agent = FileAgentConfig::preset("a1", "A1", "openai", "expert:storage");
        let personality = agent.personality().unwrap();
        assert_eq!(personality.expertise.as_deref(), Some("storage"));
    }

    #[test]
    fn test_unknown_preset_flagged() {
        let agent = FileAgentConfig::preset("a1", "A1", "openai", "prophet");
        let issues = agent.validate();
        assert!(issues.iter().any(|i| i.contains("unknown personality preset")));
        assert!(agent.personality().is_none());
    }

    #[test]
    fn test_missing_personality_flagged() {
        let agent = FileAgentConfig {
            id: "a1".into(),
            name: "A1".into(),
            provider: "openai".into(),
            model: None,
            personality: FilePersonalityConfig::default(),
        };
        let issues = agent.validate();
        assert!(issues.iter().any(|i| i.contains("needs a personality")));
    }

    #[test]
    fn test_custom_personality_resolution() {
        let agent = FileAgentConfig {
            id: "a1".into(),
            name: "Fallback Name".into(),
            provider: "openai".into(),
            model: Some("gpt-4o".into()),
            personality: FilePersonalityConfig {
                preset: None,
                custom: Some(FileCustomPersonality {
                    name: String::new(),
                    description: "bespoke".into(),
                    system_prompt: "You are bespoke.".into(),
                    expertise: Some("caching".into()),
                    creativity: Some(1.4),
                    precision: None,
                    communication_style: Some("direct".into()),
                    traits: BTreeMap::from([("humor".into(), "dry".into())]),
                }),
            },
        };
        assert!(agent.validate().is_empty());
        let personality = agent.personality().unwrap();
        assert_eq!(personality.name, "Fallback Name");
        assert_eq!(personality.creativity, 1.0); // clamped
        assert_eq!(personality.style, CommunicationStyle::Direct);
        assert_eq!(personality.traits.get("humor").map(String::as_str), Some("dry"));
    }

    #[test]
    fn test_bad_style_flagged() {
        let agent = FileAgentConfig {
            id: "a1".into(),
            name: "A1".into(),
            provider: "openai".into(),
            model: None,
            personality: FilePersonalityConfig {
                preset: None,
                custom: Some(FileCustomPersonality {
                    communication_style: Some("telepathic".into()),
                    ..Default::default()
                }),
            },
        };
        let issues = agent.validate();
        assert!(issues.iter().any(|i| i.contains("unknown communication style")));
    }
}
