//! Recursive-summarization projection.

use super::{ContextManager, ContextMetadata, ContextWindow, latest_round};
use crate::arbiter::{Arbiter, ArbiterRequest};
use crate::core::error::DomainError;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Reserved participant id for synthetic compression messages
pub(crate) const CONTEXT_AGENT_ID: &str = "context";

/// Configuration for [`RecursiveSummarizationManager`]
#[derive(Debug, Clone)]
pub struct RecursiveSummarizationConfig {
    /// Rounds kept verbatim at the tail of the transcript
    pub preserve_recent_rounds: u32,
    /// Rounds covered by each incremental summary window
    pub summarization_chunk_size: u32,
    /// Token budget for the combined projection
    pub max_tokens: Option<u64>,
}

impl Default for RecursiveSummarizationConfig {
    fn default() -> Self {
        Self {
            preserve_recent_rounds: 2,
            summarization_chunk_size: 3,
            max_tokens: None,
        }
    }
}

/// Projection that summarizes old rounds and keeps recent ones verbatim.
///
/// Rounds older than `current - preserve_recent_rounds` are folded into a
/// summary built incrementally: the summary for end-round R reuses the
/// cached summary at `R - chunk_size` when present and asks the arbiter to
/// extend it with the intervening messages (temperature 0.3); otherwise a
/// from-scratch prompt is used. When the combined projection still exceeds
/// the budget, the first half of the message list is compressed into a
/// single `[Compressed context]` message, repeatedly, until the window
/// fits or two messages remain. Without an arbiter a synthetic one-line
/// summary stands in.
pub struct RecursiveSummarizationManager {
    arbiter: Option<Arc<dyn Arbiter>>,
    config: RecursiveSummarizationConfig,
    /// Incremental summaries keyed by their end round
    cache: Mutex<HashMap<u32, String>>,
}

const SUMMARY_SYSTEM_PROMPT: &str = "You compress multi-agent discussion transcripts. \
Keep each participant's position, the points of agreement and disagreement, and any \
decisions. Be brief.";

impl RecursiveSummarizationManager {
    pub fn new(arbiter: Option<Arc<dyn Arbiter>>, config: RecursiveSummarizationConfig) -> Self {
        Self {
            arbiter,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn render(messages: &[&DeliberationMessage]) -> String {
        messages
            .iter()
            .map(|m| format!("[{} / round {}] {}", m.agent_name, m.round, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Synthetic summary used when no arbiter is configured.
    fn synthetic_summary(messages: &[&DeliberationMessage]) -> String {
        let rounds: BTreeSet<u32> = messages.iter().map(|m| m.round).collect();
        let first = rounds.iter().next().copied().unwrap_or(1);
        let last = rounds.iter().next_back().copied().unwrap_or(first);
        let mut participants: Vec<&str> = Vec::new();
        for message in messages {
            if !participants.contains(&message.agent_name.as_str()) {
                participants.push(&message.agent_name);
            }
        }
        format!(
            "[Summary of {} messages across rounds {}-{}. Participants: {}]",
            messages.len(),
            first,
            last,
            participants.join(", ")
        )
    }

    /// Summary covering rounds `1..=end_round`, cached by end round.
    async fn summary_up_to(
        &self,
        state: &DeliberationState,
        end_round: u32,
    ) -> Result<String, DomainError> {
        if let Some(cached) = self.cache.lock().unwrap().get(&end_round) {
            return Ok(cached.clone());
        }

        let chunk = self.config.summarization_chunk_size.max(1);
        let previous = end_round.checked_sub(chunk).filter(|r| *r >= 1);
        let base = previous.and_then(|r| self.cache.lock().unwrap().get(&r).cloned());

        let window_start = match (&base, previous) {
            (Some(_), Some(r)) => r + 1,
            _ => 1,
        };
        let window: Vec<&DeliberationMessage> = state
            .transcript
            .iter()
            .filter(|m| m.round >= window_start && m.round <= end_round)
            .collect();

        let summary = match self.arbiter.as_ref() {
            Some(arbiter) => {
                let prompt = match base {
                    Some(base) => format!(
                        "Existing summary of rounds 1-{}:\n{}\n\nNew messages (rounds \
                         {}-{}):\n{}\n\nExtend the summary to cover all rounds so far.",
                        window_start - 1,
                        base,
                        window_start,
                        end_round,
                        Self::render(&window)
                    ),
                    None => format!(
                        "Summarize this discussion (rounds 1-{}):\n{}",
                        end_round,
                        Self::render(&window)
                    ),
                };
                arbiter
                    .respond(
                        ArbiterRequest::new(prompt)
                            .with_system_prompt(SUMMARY_SYSTEM_PROMPT)
                            .with_temperature(0.3),
                    )
                    .await?
            }
            None => {
                let all: Vec<&DeliberationMessage> = state
                    .transcript
                    .iter()
                    .filter(|m| m.round <= end_round)
                    .collect();
                Self::synthetic_summary(&all)
            }
        };

        self.cache
            .lock()
            .unwrap()
            .insert(end_round, summary.clone());
        Ok(summary)
    }

    /// Compress the first half of `messages` into one synthetic message.
    ///
    /// Ceiling division keeps every pass strictly shrinking, so the
    /// caller's loop terminates even when summaries stay verbose.
    async fn compress_first_half(
        &self,
        messages: &mut Vec<DeliberationMessage>,
    ) -> Result<(), DomainError> {
        let half = messages.len().div_ceil(2);
        let head: Vec<&DeliberationMessage> = messages[..half].iter().collect();
        let text = match self.arbiter.as_ref() {
            Some(arbiter) => {
                arbiter
                    .respond(
                        ArbiterRequest::new(format!(
                            "Summarize these messages very briefly:\n{}",
                            Self::render(&head)
                        ))
                        .with_system_prompt(SUMMARY_SYSTEM_PROMPT)
                        .with_temperature(0.3),
                    )
                    .await?
            }
            None => Self::synthetic_summary(&head),
        };

        let round = head.last().map(|m| m.round).unwrap_or(1);
        let marker = DeliberationMessage::new(
            CONTEXT_AGENT_ID,
            "Context",
            format!("[Compressed context] {}", text),
            round,
        );
        messages.splice(..half, std::iter::once(marker));
        Ok(())
    }
}

#[async_trait]
impl ContextManager for RecursiveSummarizationManager {
    fn name(&self) -> &'static str {
        "recursive-summarization"
    }

    async fn project(
        &self,
        state: &DeliberationState,
        _agent_id: &str,
    ) -> Result<ContextWindow, DomainError> {
        let transcript_len = state.transcript.len();
        if transcript_len == 0 {
            return Ok(ContextWindow::new(
                Vec::new(),
                None,
                0,
                ContextMetadata::default(),
            ));
        }

        let current = latest_round(state);
        let cutoff = current.saturating_sub(self.config.preserve_recent_rounds);

        let mut summary = None;
        let mut summarized = 0;
        if cutoff >= 1 {
            summary = Some(self.summary_up_to(state, cutoff).await?);
            summarized = state
                .transcript
                .iter()
                .filter(|m| m.round <= cutoff)
                .count();
        }

        let mut messages: Vec<DeliberationMessage> = state
            .transcript
            .iter()
            .filter(|m| m.round > cutoff)
            .cloned()
            .collect();

        // Recursive compression when the projection still exceeds budget
        let mut masked_rounds: BTreeSet<u32> = messages.iter().map(|m| m.round).collect();
        if let Some(budget) = self.config.max_tokens {
            loop {
                let window = ContextWindow::new(
                    messages.clone(),
                    summary.clone(),
                    transcript_len,
                    ContextMetadata::default(),
                );
                if window.estimated_tokens <= budget || messages.len() <= 2 {
                    break;
                }
                debug!(
                    tokens = window.estimated_tokens,
                    budget, "recursive compression pass"
                );
                self.compress_first_half(&mut messages).await?;
            }
            masked_rounds = messages.iter().map(|m| m.round).collect();
        }

        let metadata = ContextMetadata {
            dropped: 0,
            summarized,
            masked: 0,
            rounds_preserved: masked_rounds.into_iter().collect(),
        };
        Ok(ContextWindow::new(
            messages,
            summary,
            transcript_len,
            metadata,
        ))
    }
}
