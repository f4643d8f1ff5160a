//! Builder for custom personalities.

use super::{CommunicationStyle, Personality};
use std::collections::BTreeMap;

/// Fluent builder for [`Personality`].
///
/// Numeric dials are clamped to `[0, 1]` at `build()`.
///
/// # Example
///
/// ```
/// use conclave_domain::personality::{CommunicationStyle, Personality};
///
/// let p = Personality::builder("Skeptic")
///     .description("Looks for holes in every argument")
///     .system_prompt("You are a relentless skeptic.")
///     .creativity(0.2)
///     .precision(1.7) // clamped to 1.0
///     .style(CommunicationStyle::Critical)
///     .build();
/// assert_eq!(p.precision, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct PersonalityBuilder {
    name: String,
    description: String,
    system_prompt: String,
    traits: BTreeMap<String, String>,
    creativity: f64,
    precision: f64,
    expertise: Option<String>,
    style: CommunicationStyle,
}

impl PersonalityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            system_prompt: String::new(),
            traits: BTreeMap::new(),
            creativity: 0.7,
            precision: 0.7,
            expertise: None,
            style: CommunicationStyle::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn trait_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.insert(key.into(), value.into());
        self
    }

    pub fn creativity(mut self, creativity: f64) -> Self {
        self.creativity = creativity;
        self
    }

    pub fn precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn expertise(mut self, domain: impl Into<String>) -> Self {
        self.expertise = Some(domain.into());
        self
    }

    pub fn style(mut self, style: CommunicationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn build(self) -> Personality {
        Personality {
            name: self.name,
            description: self.description,
            system_prompt: self.system_prompt,
            traits: self.traits,
            creativity: self.creativity.clamp(0.0, 1.0),
            precision: self.precision.clamp(0.0, 1.0),
            expertise: self.expertise,
            style: self.style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PersonalityBuilder::new("X").build();
        assert_eq!(p.creativity, 0.7);
        assert_eq!(p.precision, 0.7);
        assert_eq!(p.style, CommunicationStyle::Analytical);
        assert!(p.expertise.is_none());
    }

    #[test]
    fn test_clamping() {
        let p = PersonalityBuilder::new("X")
            .creativity(-0.5)
            .precision(2.0)
            .build();
        assert_eq!(p.creativity, 0.0);
        assert_eq!(p.precision, 1.0);
    }

    #[test]
    fn test_traits() {
        let p = PersonalityBuilder::new("X")
            .trait_value("rigor", "high")
            .trait_value("humor", "dry")
            .build();
        assert_eq!(p.traits.get("rigor").map(String::as_str), Some("high"));
        assert_eq!(p.traits.len(), 2);
    }
}
