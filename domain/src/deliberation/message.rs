//! Transcript message for a deliberation.

use crate::core::tokens::estimate_tokens;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One agent contribution in a deliberation transcript.
///
/// Messages are appended to the transcript and never mutated. Round
/// numbers are 1-based; the state enforces non-decreasing timestamps
/// within a round on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationMessage {
    /// Id of the speaking agent
    pub agent_id: String,
    /// Display name of the speaking agent
    pub agent_name: String,
    /// Message content
    pub content: String,
    /// Round the message belongs to (1-based)
    pub round: u32,
    /// Timestamp in milliseconds since the epoch
    pub timestamp_ms: u64,
    /// Id of the agent this message responds to, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,
    /// Token count; estimated from content when the provider reported none
    pub token_count: u32,
}

impl DeliberationMessage {
    /// Create a message stamped with the current time and an estimated
    /// token count.
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        content: impl Into<String>,
        round: u32,
    ) -> Self {
        let content = content.into();
        let token_count = estimate_tokens(&content);
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            content,
            round: round.max(1),
            timestamp_ms: current_timestamp(),
            in_response_to: None,
            token_count,
        }
    }

    /// Mark which agent this message responds to
    pub fn in_response_to(mut self, agent_id: impl Into<String>) -> Self {
        self.in_response_to = Some(agent_id.into());
        self
    }

    /// Override the token count with a provider-reported value
    pub fn with_token_count(mut self, tokens: u32) -> Self {
        self.token_count = tokens;
        self
    }

    /// Effective token count, re-estimated when zero
    pub fn effective_tokens(&self) -> u32 {
        if self.token_count == 0 {
            estimate_tokens(&self.content)
        } else {
            self.token_count
        }
    }
}

/// Current timestamp in milliseconds
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_floor_is_one() {
        let msg = DeliberationMessage::new("a1", "A", "hi", 0);
        assert_eq!(msg.round, 1);
    }

    #[test]
    fn test_token_estimate_on_creation() {
        let msg = DeliberationMessage::new("a1", "A", "abcdefgh", 1);
        assert_eq!(msg.token_count, 2);
    }

    #[test]
    fn test_effective_tokens_reestimates_zero() {
        let msg = DeliberationMessage::new("a1", "A", "abcdefgh", 1).with_token_count(0);
        assert_eq!(msg.effective_tokens(), 2);

        let reported = DeliberationMessage::new("a1", "A", "abcdefgh", 1).with_token_count(17);
        assert_eq!(reported.effective_tokens(), 17);
    }

    #[test]
    fn test_in_response_to() {
        let msg = DeliberationMessage::new("a1", "A", "rebuttal", 2).in_response_to("a2");
        assert_eq!(msg.in_response_to.as_deref(), Some("a2"));
    }
}
