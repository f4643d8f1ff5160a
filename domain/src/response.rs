//! Agent response value objects.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One agent's answer to one invocation
///
/// Provider failures do not produce a missing response: the agent runtime
/// folds them into a response whose content begins with `Error: ` so that
/// voting always sees one entry per agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Stable id of the responding agent
    pub agent_id: String,
    /// Display name of the responding agent
    pub agent_name: String,
    /// Text of the response
    pub content: String,
    /// Best-effort parsed structured output, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
    /// Self-reported confidence in [0, 1], when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Wall-clock time the invocation took; always populated
    pub elapsed: Duration,
    /// Provider-reported token usage, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl AgentResponse {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        content: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            content: content.into(),
            structured: None,
            confidence: None,
            elapsed,
            usage: None,
        }
    }

    /// Attach parsed structured output
    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.structured = Some(value);
        self
    }

    /// Attach a confidence level, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Attach provider-reported token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Whether this response records a swallowed provider failure
    pub fn is_error(&self) -> bool {
        self.content.starts_with("Error: ")
    }
}

/// Outcome of an agent vote invocation, attached as structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteChoice {
    /// Id of the agent whose response was chosen
    pub chosen_agent_id: String,
    /// The voter's stated reasoning (the full reply text)
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        assert_eq!(TokenUsage::new(10, 5).total(), 15);
    }

    #[test]
    fn test_confidence_clamped() {
        let r = AgentResponse::new("a1", "A", "yes", Duration::from_millis(5))
            .with_confidence(1.5);
        assert_eq!(r.confidence, Some(1.0));
    }

    #[test]
    fn test_is_error() {
        let ok = AgentResponse::new("a1", "A", "fine", Duration::ZERO);
        let err = AgentResponse::new("a1", "A", "Error: timeout", Duration::ZERO);
        assert!(!ok.is_error());
        assert!(err.is_error());
    }
}
