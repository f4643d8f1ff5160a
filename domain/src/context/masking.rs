//! Observation-masking projection.

use super::{ContextManager, ContextMetadata, ContextWindow, latest_round};
use crate::arbiter::{Arbiter, ArbiterRequest};
use crate::core::error::DomainError;
use crate::core::tokens::estimate_tokens;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use crate::util::truncate_chars;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

/// Phrases that mark a message as decision-bearing; such messages are
/// never masked.
const DECISION_INDICATORS: &[&str] = &[
    "i conclude",
    "final answer",
    "my position is",
    "my final position",
    "i have decided",
    "my recommendation is",
];

/// Filler phrases stripped by the RemoveVerbose strategy.
const FILLER_PATTERNS: &[&str] = &[
    r"(?i)\bas i mentioned(?: (?:earlier|before))?\b[,:]?\s*",
    r"(?i)\bto elaborate\b[,:]?\s*",
    r"(?i)\bin other words\b[,:]?\s*",
    r"(?i)\blet me explain\b[,:]?\s*",
    r"(?i)\bfor example\b[,:]?\s*",
    r"(?i)\bto clarify\b[,:]?\s*",
    r"(?i)\bwhat i mean is\b[,:]?\s*",
    r"(?i)\bspecifically\b[,:]?\s*",
];

fn filler_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        FILLER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static regex"))
            .collect()
    })
}

/// How a masked message is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskingStrategy {
    /// Keep whole sentences up to the length cap, append ` [truncated]`
    #[default]
    Truncate,
    /// Strip filler phrases; append ` [condensed]` on heavy reduction
    RemoveVerbose,
    /// Arbiter-extracted bullet points
    ExtractKeyPoints,
    /// Replace with a one-line placeholder
    Placeholder,
    /// RemoveVerbose, then ExtractKeyPoints when still too long
    Hybrid,
}

/// Configuration for [`ObservationMaskingManager`]
#[derive(Debug, Clone)]
pub struct MaskingConfig {
    /// Rounds at the tail that are never masked
    pub preserve_recent_rounds: u32,
    /// Never mask the recipient's own messages
    pub preserve_own_messages: bool,
    /// Agents whose messages are never masked
    pub always_preserve_agents: Vec<String>,
    /// Token count above which a message is masked
    pub verbosity_threshold: u32,
    /// Regex patterns that force masking
    pub mask_patterns: Vec<String>,
    /// Mask messages even when no trigger matched
    pub mask_by_default: bool,
    /// Rewrite strategy for masked messages
    pub strategy: MaskingStrategy,
    /// Character cap used by Truncate and Hybrid
    pub max_masked_length: usize,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            preserve_recent_rounds: 2,
            preserve_own_messages: true,
            always_preserve_agents: Vec::new(),
            verbosity_threshold: 150,
            mask_patterns: Vec::new(),
            mask_by_default: false,
            strategy: MaskingStrategy::default(),
            max_masked_length: 200,
        }
    }
}

/// Projection that rewrites verbose or matching observations.
///
/// A message is never masked when it falls within the recent rounds, is
/// the recipient's own (when configured), belongs to an always-preserved
/// agent, or carries a decision indicator. Otherwise it is masked when its
/// token count exceeds the verbosity threshold, a mask pattern matches, or
/// the default policy is to mask.
pub struct ObservationMaskingManager {
    arbiter: Option<Arc<dyn Arbiter>>,
    config: MaskingConfig,
    patterns: Vec<Regex>,
}

impl ObservationMaskingManager {
    /// Build the manager, compiling the configured mask patterns.
    ///
    /// Invalid patterns surface as a configuration error.
    pub fn new(
        arbiter: Option<Arc<dyn Arbiter>>,
        config: MaskingConfig,
    ) -> Result<Self, DomainError> {
        let patterns = config
            .mask_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    DomainError::InvalidConfiguration(format!("bad mask pattern {:?}: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            arbiter,
            config,
            patterns,
        })
    }

    fn contains_decision(content: &str) -> bool {
        let lowered = content.to_lowercase();
        DECISION_INDICATORS
            .iter()
            .any(|indicator| lowered.contains(indicator))
    }

    fn should_mask(&self, message: &DeliberationMessage, recipient: &str, current: u32) -> bool {
        if message.round > current.saturating_sub(self.config.preserve_recent_rounds) {
            return false;
        }
        if self.config.preserve_own_messages && message.agent_id == recipient {
            return false;
        }
        if self
            .config
            .always_preserve_agents
            .iter()
            .any(|a| a == &message.agent_id)
        {
            return false;
        }
        if Self::contains_decision(&message.content) {
            return false;
        }

        message.effective_tokens() > self.config.verbosity_threshold
            || self.patterns.iter().any(|p| p.is_match(&message.content))
            || self.config.mask_by_default
    }

    fn truncate(&self, content: &str) -> String {
        let limit = self.config.max_masked_length.saturating_sub(20);
        let mut kept = String::new();
        for sentence in content.split_inclusive(['.', '!', '?']) {
            if kept.len() + sentence.len() > limit {
                break;
            }
            kept.push_str(sentence);
        }
        if kept.is_empty() {
            kept = truncate_chars(content, limit).to_string();
        }
        kept.push_str(" [truncated]");
        kept
    }

    fn remove_verbose(content: &str) -> String {
        let mut result = content.to_string();
        for regex in filler_regexes() {
            result = regex.replace_all(&result, "").into_owned();
        }
        let result = result.trim().to_string();
        if result.len() * 2 < content.len() {
            format!("{} [condensed]", result)
        } else {
            result
        }
    }

    async fn extract_key_points(
        &self,
        message: &DeliberationMessage,
    ) -> Result<String, DomainError> {
        let Some(arbiter) = self.arbiter.as_ref() else {
            // No arbiter to extract with; degrade to truncation
            return Ok(self.truncate(&message.content));
        };
        let reply = arbiter
            .respond(
                ArbiterRequest::new(format!(
                    "Extract at most 3 bullet points from this message:\n{}",
                    message.content
                ))
                .with_system_prompt(
                    "You extract the essential points from discussion messages. At most 3 \
                     bullets, one line each.",
                )
                .with_temperature(0.2)
                .with_max_tokens(150),
            )
            .await?;
        Ok(format!("[Key points from {}]\n{}", message.agent_name, reply))
    }

    fn placeholder(message: &DeliberationMessage) -> String {
        let words = message.content.split_whitespace().count();
        let decision = if Self::contains_decision(&message.content) {
            ", contains decision"
        } else {
            ""
        };
        format!(
            "[{} - Round {}: ~{} words{}]",
            message.agent_name, message.round, words, decision
        )
    }

    async fn mask(&self, message: &DeliberationMessage) -> Result<String, DomainError> {
        match self.config.strategy {
            MaskingStrategy::Truncate => Ok(self.truncate(&message.content)),
            MaskingStrategy::RemoveVerbose => Ok(Self::remove_verbose(&message.content)),
            MaskingStrategy::ExtractKeyPoints => self.extract_key_points(message).await,
            MaskingStrategy::Placeholder => Ok(Self::placeholder(message)),
            MaskingStrategy::Hybrid => {
                let condensed = Self::remove_verbose(&message.content);
                if estimate_tokens(&condensed) as usize > self.config.max_masked_length / 4 {
                    self.extract_key_points(message).await
                } else {
                    Ok(condensed)
                }
            }
        }
    }
}

#[async_trait]
impl ContextManager for ObservationMaskingManager {
    fn name(&self) -> &'static str {
        "observation-masking"
    }

    async fn project(
        &self,
        state: &DeliberationState,
        agent_id: &str,
    ) -> Result<ContextWindow, DomainError> {
        let transcript_len = state.transcript.len();
        let current = latest_round(state);

        let mut messages = Vec::with_capacity(transcript_len);
        let mut masked = 0usize;
        let mut preserved_rounds: BTreeSet<u32> = BTreeSet::new();

        for message in &state.transcript {
            if self.should_mask(message, agent_id, current) {
                let mut rewritten = message.clone();
                rewritten.content = self.mask(message).await?;
                rewritten.token_count = estimate_tokens(&rewritten.content);
                masked += 1;
                messages.push(rewritten);
            } else {
                preserved_rounds.insert(message.round);
                messages.push(message.clone());
            }
        }

        let metadata = ContextMetadata {
            dropped: 0,
            summarized: 0,
            masked,
            rounds_preserved: preserved_rounds.into_iter().collect(),
        };
        Ok(ContextWindow::new(
            messages,
            None,
            transcript_len,
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::testing::ScriptedArbiter;

    fn long_message(agent: &str, round: u32) -> DeliberationMessage {
        DeliberationMessage::new(
            agent,
            agent.to_uppercase(),
            "This position needs room. ".repeat(40),
            round,
        )
    }

    fn state_with(messages: Vec<DeliberationMessage>, rounds: u32) -> DeliberationState {
        let mut agent_ids: Vec<String> = Vec::new();
        for m in &messages {
            if !agent_ids.contains(&m.agent_id) {
                agent_ids.push(m.agent_id.clone());
            }
        }
        let mut state = DeliberationState::new("task", agent_ids);
        state.current_round = rounds;
        for m in messages {
            state.append(m);
        }
        state
    }

    fn manager(config: MaskingConfig) -> ObservationMaskingManager {
        ObservationMaskingManager::new(None, config).unwrap()
    }

    #[tokio::test]
    async fn test_recent_rounds_never_masked() {
        let state = state_with(vec![long_message("a2", 4), long_message("a2", 5)], 5);
        let window = manager(MaskingConfig::default())
            .project(&state, "a1")
            .await
            .unwrap();
        assert_eq!(window.metadata.masked, 0);
    }

    #[tokio::test]
    async fn test_verbose_old_message_masked() {
        let state = state_with(vec![long_message("a2", 1), long_message("a2", 5)], 5);
        let window = manager(MaskingConfig::default())
            .project(&state, "a1")
            .await
            .unwrap();
        assert_eq!(window.metadata.masked, 1);
        assert!(window.messages[0].content.ends_with(" [truncated]"));
        // Masked token count reflects the rewritten content
        assert!(window.messages[0].token_count < long_message("a2", 1).token_count);
    }

    #[tokio::test]
    async fn test_own_messages_preserved() {
        let state = state_with(vec![long_message("a1", 1), long_message("a2", 1)], 5);
        let window = manager(MaskingConfig::default())
            .project(&state, "a1")
            .await
            .unwrap();
        assert_eq!(window.metadata.masked, 1);
        assert!(!window.messages[0].content.contains("[truncated]"));
    }

    #[tokio::test]
    async fn test_always_preserve_agents() {
        let state = state_with(vec![long_message("a2", 1)], 5);
        let window = manager(MaskingConfig {
            always_preserve_agents: vec!["a2".into()],
            ..Default::default()
        })
        .project(&state, "a1")
        .await
        .unwrap();
        assert_eq!(window.metadata.masked, 0);
    }

    #[tokio::test]
    async fn test_decision_messages_preserved() {
        let content = format!("{} My position is that we ship now.", "filler words. ".repeat(60));
        let msg = DeliberationMessage::new("a2", "A2", content, 1);
        let state = state_with(vec![msg], 5);
        let window = manager(MaskingConfig::default())
            .project(&state, "a1")
            .await
            .unwrap();
        assert_eq!(window.metadata.masked, 0);
    }

    #[tokio::test]
    async fn test_pattern_forces_mask() {
        let msg = DeliberationMessage::new("a2", "A2", "short but noisy digression", 1);
        let state = state_with(vec![msg], 5);
        let window = manager(MaskingConfig {
            mask_patterns: vec!["digression".into()],
            strategy: MaskingStrategy::Placeholder,
            ..Default::default()
        })
        .project(&state, "a1")
        .await
        .unwrap();
        assert_eq!(window.metadata.masked, 1);
        assert_eq!(window.messages[0].content, "[A2 - Round 1: ~4 words]");
    }

    #[tokio::test]
    async fn test_bad_pattern_is_config_error() {
        let result = ObservationMaskingManager::new(
            None,
            MaskingConfig {
                mask_patterns: vec!["[unclosed".into()],
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_remove_verbose_strips_fillers() {
        let content = "As I mentioned earlier, the cache helps. For example, reads drop. \
                       Specifically, by half.";
        let result = ObservationMaskingManager::remove_verbose(content);
        assert!(!result.to_lowercase().contains("as i mentioned"));
        assert!(!result.to_lowercase().contains("for example"));
        assert!(!result.to_lowercase().contains("specifically"));
        assert!(result.contains("the cache helps."));
    }

    #[test]
    fn test_remove_verbose_marks_heavy_condensation() {
        let content = "To elaborate, in other words, let me explain, to clarify, what I mean is, \
                       for example, specifically, as I mentioned before, ok";
        let result = ObservationMaskingManager::remove_verbose(content);
        assert!(result.ends_with(" [condensed]"));
    }

    #[test]
    fn test_truncate_keeps_whole_sentences() {
        let m = manager(MaskingConfig {
            max_masked_length: 60,
            ..Default::default()
        });
        let result = m.truncate("One short sentence. Another one here. A third that will not fit in the cap.");
        assert!(result.ends_with(" [truncated]"));
        assert!(result.starts_with("One short sentence."));
        assert!(result.len() <= 60 + " [truncated]".len());
    }

    #[tokio::test]
    async fn test_key_points_uses_arbiter() {
        let m = ObservationMaskingManager::new(
            Some(Arc::new(ScriptedArbiter::new(["- point one\n- point two"]))),
            MaskingConfig {
                strategy: MaskingStrategy::ExtractKeyPoints,
                ..Default::default()
            },
        )
        .unwrap();
        let state = state_with(vec![long_message("a2", 1)], 5);
        let window = m.project(&state, "a1").await.unwrap();
        assert!(window.messages[0].content.starts_with("[Key points from A2]"));
        assert!(window.messages[0].content.contains("point one"));
    }

    #[tokio::test]
    async fn test_hybrid_falls_through_to_key_points() {
        let m = ObservationMaskingManager::new(
            Some(Arc::new(ScriptedArbiter::new(["- the gist"]))),
            MaskingConfig {
                strategy: MaskingStrategy::Hybrid,
                max_masked_length: 40, // quarter is 10 tokens
                ..Default::default()
            },
        )
        .unwrap();
        let state = state_with(vec![long_message("a2", 1)], 5);
        let window = m.project(&state, "a1").await.unwrap();
        assert!(window.messages[0].content.starts_with("[Key points from A2]"));
    }
}
