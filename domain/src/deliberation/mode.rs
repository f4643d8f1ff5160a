//! Turn-taking modes for a deliberation round.

use serde::{Deserialize, Serialize};

/// How agents take turns within a round.
///
/// Sequential modes (RoundRobin, Moderated) give each agent a
/// happens-before view of earlier speakers in the same round; concurrent
/// modes (Debate, FreeForm) show every agent only strictly earlier rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliberationMode {
    /// Agents speak sequentially in registration order
    #[default]
    RoundRobin,
    /// Agents argue concurrently, each addressing the previous round
    Debate,
    /// A moderator frames each round, then agents reply in sequence
    Moderated,
    /// Agents speak concurrently over the full prior transcript
    FreeForm,
}

impl std::fmt::Display for DeliberationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliberationMode::RoundRobin => "round-robin",
            DeliberationMode::Debate => "debate",
            DeliberationMode::Moderated => "moderated",
            DeliberationMode::FreeForm => "free-form",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for DeliberationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round-robin" | "roundrobin" => Ok(DeliberationMode::RoundRobin),
            "debate" => Ok(DeliberationMode::Debate),
            "moderated" => Ok(DeliberationMode::Moderated),
            "free-form" | "freeform" => Ok(DeliberationMode::FreeForm),
            _ => Err(format!("Unknown deliberation mode: {}", s)),
        }
    }
}

impl DeliberationMode {
    /// Whether agents within a round speak concurrently
    pub fn is_concurrent(&self) -> bool {
        matches!(self, DeliberationMode::Debate | DeliberationMode::FreeForm)
    }
}
