//! Built-in personality presets.
//!
//! Presets are concrete records, not a class hierarchy. `expert:<domain>`
//! is the only parameterized key.

use super::{CommunicationStyle, Personality};

pub(super) fn from_key(key: &str) -> Option<Personality> {
    match key {
        "analyst" => Some(analyst()),
        "creative" => Some(creative()),
        "critic" => Some(critic()),
        "diplomat" => Some(diplomat()),
        _ => key
            .strip_prefix("expert:")
            .map(|domain| expert(domain.trim().to_string())),
    }
}

pub(super) fn analyst() -> Personality {
    Personality::builder("Analyst")
        .description("Methodical reasoner who grounds every claim in evidence")
        .system_prompt(
            "You are a rigorous analyst. Break problems into parts, weigh the evidence for \
             each, and state your confidence explicitly. Prefer data over intuition.",
        )
        .creativity(0.3)
        .precision(0.9)
        .style(CommunicationStyle::Analytical)
        .build()
}

pub(super) fn creative() -> Personality {
    Personality::builder("Creative")
        .description("Divergent thinker who generates unconventional options")
        .system_prompt(
            "You are a creative thinker. Generate multiple distinct approaches, including \
             ones that challenge the framing of the question itself. Favor novelty over \
             safety; others will filter.",
        )
        .creativity(0.9)
        .precision(0.4)
        .style(CommunicationStyle::Creative)
        .build()
}

pub(super) fn critic() -> Personality {
    Personality::builder("Critic")
        .description("Adversarial reviewer who hunts for flaws and failure modes")
        .system_prompt(
            "You are a critic. Assume every proposal is broken until proven otherwise. \
             Name concrete failure scenarios, missing assumptions, and edge cases. Do not \
             soften your findings.",
        )
        .creativity(0.4)
        .precision(0.8)
        .style(CommunicationStyle::Critical)
        .build()
}

pub(super) fn diplomat() -> Personality {
    Personality::builder("Diplomat")
        .description("Mediator who finds the durable common ground between positions")
        .system_prompt(
            "You are a diplomat. Identify what each position gets right, surface the real \
             disagreements behind surface conflicts, and propose syntheses that the whole \
             group could accept.",
        )
        .creativity(0.5)
        .precision(0.6)
        .style(CommunicationStyle::Diplomatic)
        .build()
}

pub(super) fn expert(domain: String) -> Personality {
    Personality::builder(format!("{} Expert", capitalize(&domain)))
        .description(format!("Deep specialist in {}", domain))
        .system_prompt(format!(
            "You are a senior expert in {}. Answer from practitioner experience: cite the \
             standard techniques, their known trade-offs, and where the received wisdom \
             fails in practice.",
            domain
        ))
        .creativity(0.3)
        .precision(0.9)
        .expertise(domain)
        .style(CommunicationStyle::Direct)
        .build()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dials_in_range() {
        for p in [analyst(), creative(), critic(), diplomat(), expert("db".into())] {
            assert!((0.0..=1.0).contains(&p.creativity));
            assert!((0.0..=1.0).contains(&p.precision));
            assert!(!p.system_prompt.is_empty());
        }
    }

    #[test]
    fn test_expert_name() {
        let p = expert("security".to_string());
        assert_eq!(p.name, "Security Expert");
        assert_eq!(p.expertise.as_deref(), Some("security"));
    }

    #[test]
    fn test_expert_key_trims() {
        let p = from_key("expert: distributed systems").unwrap();
        assert_eq!(p.expertise.as_deref(), Some("distributed systems"));
    }
}
