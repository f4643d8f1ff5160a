//! Agent personalities.
//!
//! A [`Personality`] is a declarative bundle: display name, description,
//! seed system prompt, free-form trait map, two numeric dials (creativity
//! and precision, both clamped to `[0, 1]`), an optional expertise tag,
//! and a [`CommunicationStyle`]. Personalities are data, not behavior; the
//! agent runtime derives its actual system prompt and temperature from
//! them.

mod builder;
mod presets;

pub use builder::PersonalityBuilder;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an agent phrases its contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    /// Structured, evidence-first
    #[default]
    Analytical,
    /// Exploratory, generative
    Creative,
    /// Skeptical, failure-focused
    Critical,
    /// Balanced, synthesis-seeking
    Diplomatic,
    /// Short and declarative
    Direct,
}

impl CommunicationStyle {
    /// Suffix appended to the derived system prompt for this style
    pub fn prompt_suffix(&self) -> &'static str {
        match self {
            CommunicationStyle::Analytical => {
                "Communicate analytically: structure your answer, cite the evidence behind each claim, and quantify where possible."
            }
            CommunicationStyle::Creative => {
                "Communicate creatively: explore unconventional angles and propose alternatives others might miss."
            }
            CommunicationStyle::Critical => {
                "Communicate critically: probe for weaknesses, name concrete failure modes, and challenge unsupported claims."
            }
            CommunicationStyle::Diplomatic => {
                "Communicate diplomatically: acknowledge the strongest points of other positions and work toward common ground."
            }
            CommunicationStyle::Direct => {
                "Communicate directly: lead with your conclusion and keep supporting detail brief."
            }
        }
    }
}

// Display matches the serde lowercase form so config files and logs agree.
impl std::fmt::Display for CommunicationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommunicationStyle::Analytical => "analytical",
            CommunicationStyle::Creative => "creative",
            CommunicationStyle::Critical => "critical",
            CommunicationStyle::Diplomatic => "diplomatic",
            CommunicationStyle::Direct => "direct",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for CommunicationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analytical" => Ok(CommunicationStyle::Analytical),
            "creative" => Ok(CommunicationStyle::Creative),
            "critical" => Ok(CommunicationStyle::Critical),
            "diplomatic" => Ok(CommunicationStyle::Diplomatic),
            "direct" => Ok(CommunicationStyle::Direct),
            _ => Err(format!("Unknown communication style: {}", s)),
        }
    }
}

/// A declarative agent personality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Display name
    pub name: String,
    /// Short description of the persona
    pub description: String,
    /// Seed for the agent's implicit system message
    pub system_prompt: String,
    /// Free-form trait map (e.g. "rigor" -> "high")
    #[serde(default)]
    pub traits: BTreeMap<String, String>,
    /// Creativity dial in [0, 1]; doubles as the default temperature
    pub creativity: f64,
    /// Precision dial in [0, 1]
    pub precision: f64,
    /// Optional domain of expertise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise: Option<String>,
    /// Communication style
    #[serde(default)]
    pub style: CommunicationStyle,
}

impl Personality {
    /// Start building a personality with clamped numeric dials
    pub fn builder(name: impl Into<String>) -> PersonalityBuilder {
        PersonalityBuilder::new(name)
    }

    /// Resolve a preset key into a personality.
    ///
    /// Recognized keys: `analyst`, `creative`, `critic`, `diplomat`, and
    /// `expert:<domain>`.
    pub fn preset(key: &str) -> Option<Personality> {
        presets::from_key(key)
    }

    /// The analyst preset
    pub fn analyst() -> Personality {
        presets::analyst()
    }

    /// The creative preset
    pub fn creative() -> Personality {
        presets::creative()
    }

    /// The critic preset
    pub fn critic() -> Personality {
        presets::critic()
    }

    /// The diplomat preset
    pub fn diplomat() -> Personality {
        presets::diplomat()
    }

    /// A domain-expert preset
    pub fn expert(domain: impl Into<String>) -> Personality {
        presets::expert(domain.into())
    }
}
