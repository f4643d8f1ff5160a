//! Mutable state of one running deliberation.

use super::message::DeliberationMessage;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// State owned by exactly one deliberation execution.
///
/// The transcript is append-only and mutated only from the executor's
/// single control flow; concurrent round modes return their messages to
/// the executor, which appends them serially. `current_round` advances
/// only at round start and all round-r messages are appended before
/// round r+1 begins.
#[derive(Debug, Clone)]
pub struct DeliberationState {
    /// The original task
    pub task: String,
    /// Current round; 0 before the first round starts
    pub current_round: u32,
    /// Total tokens consumed so far (provider-reported or estimated)
    pub total_tokens_used: u64,
    /// When the deliberation started
    pub started_at: Instant,
    /// Ordered transcript
    pub transcript: Vec<DeliberationMessage>,
    /// Per-agent transcript indices, in speaking order
    pub positions: HashMap<String, Vec<usize>>,
    /// Convergence score from the most recent evaluation
    pub convergence_score: Option<f64>,
    /// Whether the convergence threshold has been reached
    pub converged: bool,
    /// Agent currently speaking, when any
    pub current_speaker: Option<String>,
    /// Ids of the participating agents, in registration order
    pub agent_ids: Vec<String>,
}

impl DeliberationState {
    pub fn new(task: impl Into<String>, agent_ids: Vec<String>) -> Self {
        Self {
            task: task.into(),
            current_round: 0,
            total_tokens_used: 0,
            started_at: Instant::now(),
            transcript: Vec::new(),
            positions: HashMap::new(),
            convergence_score: None,
            converged: false,
            current_speaker: None,
            agent_ids,
        }
    }

    /// Wall-clock time since the deliberation started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Begin the next round
    pub fn advance_round(&mut self) {
        self.current_round += 1;
    }

    /// Append a message, updating the position map and token accounting.
    ///
    /// A zero token count is replaced by the content estimate. Timestamps
    /// are clamped to be non-decreasing against the previous message of
    /// the same agent in the same round.
    pub fn append(&mut self, mut message: DeliberationMessage) {
        message.token_count = message.effective_tokens();
        if let Some(last_idx) = self
            .positions
            .get(&message.agent_id)
            .and_then(|indices| indices.last())
        {
            let last = &self.transcript[*last_idx];
            if last.round == message.round && last.timestamp_ms > message.timestamp_ms {
                message.timestamp_ms = last.timestamp_ms;
            }
        }

        self.total_tokens_used += u64::from(message.token_count);
        let idx = self.transcript.len();
        self.positions
            .entry(message.agent_id.clone())
            .or_default()
            .push(idx);
        self.transcript.push(message);
    }

    /// Charge prompt tokens that are not part of any transcript message
    pub fn add_prompt_tokens(&mut self, tokens: u32) {
        self.total_tokens_used += u64::from(tokens);
    }

    /// All messages of a round, in transcript order
    pub fn messages_in_round(&self, round: u32) -> Vec<&DeliberationMessage> {
        self.transcript
            .iter()
            .filter(|m| m.round == round)
            .collect()
    }

    /// An agent's message in a round, when it spoke
    pub fn message_of_in_round(&self, agent_id: &str, round: u32) -> Option<&DeliberationMessage> {
        self.positions.get(agent_id).and_then(|indices| {
            indices
                .iter()
                .map(|&idx| &self.transcript[idx])
                .find(|m| m.round == round)
        })
    }

    /// The most recent message of an agent
    pub fn latest_message_of(&self, agent_id: &str) -> Option<&DeliberationMessage> {
        self.positions
            .get(agent_id)
            .and_then(|indices| indices.last())
            .map(|&idx| &self.transcript[idx])
    }
}
