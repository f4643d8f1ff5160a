//! Hierarchical phase-summary projection.

use super::{ContextManager, ContextMetadata, ContextWindow, latest_round};
use crate::arbiter::{Arbiter, ArbiterRequest};
use crate::core::error::DomainError;
use crate::core::tokens::estimate_tokens;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use crate::util::truncate_str;
use async_trait::async_trait;
use std::sync::Arc;

/// Naming style for completed phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseNaming {
    /// `Phase 1`, `Phase 2`, ...
    #[default]
    Numbered,
    /// `Initial Positions`, `Early Deliberation`, ...
    Descriptive,
    /// `Rounds 1-3`, `Rounds 4-6`, ...
    RoundRange,
}

/// Configuration for [`HierarchicalManager`]
#[derive(Debug, Clone)]
pub struct HierarchicalConfig {
    /// Rounds per completed phase
    pub rounds_per_phase: u32,
    /// Share of the budget reserved for the most recent phase verbatim
    pub recent_phase_allocation: f64,
    /// Token budget for the projection
    pub max_tokens: Option<u64>,
    /// How completed phases are titled
    pub naming: PhaseNaming,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            rounds_per_phase: 3,
            recent_phase_allocation: 0.5,
            max_tokens: None,
            naming: PhaseNaming::Numbered,
        }
    }
}

struct Phase {
    title: String,
    first_round: u32,
    last_round: u32,
    messages: Vec<DeliberationMessage>,
}

/// Projection that summarizes the discussion phase by phase.
///
/// Messages are segmented into phases of `rounds_per_phase` rounds; the
/// trailing partial phase is titled `Current Discussion (Round a-b)`.
/// Each completed phase is summarized by the arbiter, and when more than
/// one phase exists their summaries are condensed into a global overview.
/// Packing under the token budget: the most recent phase is included
/// verbatim when it fits within `recent_phase_allocation x budget`, the
/// overview when it fits within 30% of the remainder, and older phase
/// summaries share the rest equally.
pub struct HierarchicalManager {
    arbiter: Arc<dyn Arbiter>,
    config: HierarchicalConfig,
}

const PHASE_SYSTEM_PROMPT: &str = "You summarize one phase of a multi-agent discussion. \
Capture each participant's position and how it moved during the phase. Be brief.";

const OVERVIEW_SYSTEM_PROMPT: &str = "You condense several phase summaries of a discussion \
into one short overview of its arc so far.";

impl HierarchicalManager {
    pub fn new(arbiter: Arc<dyn Arbiter>, config: HierarchicalConfig) -> Self {
        Self { arbiter, config }
    }

    fn phase_title(&self, index: usize, first: u32, last: u32) -> String {
        match self.config.naming {
            PhaseNaming::Numbered => format!("Phase {}", index + 1),
            PhaseNaming::Descriptive => match index {
                0 => "Initial Positions".to_string(),
                1 => "Early Deliberation".to_string(),
                2 => "Developing Consensus".to_string(),
                n => format!("Extended Discussion {}", n - 2),
            },
            PhaseNaming::RoundRange => format!("Rounds {}-{}", first, last),
        }
    }

    fn segment(&self, state: &DeliberationState) -> Vec<Phase> {
        let current = latest_round(state);
        let per_phase = self.config.rounds_per_phase.max(1);
        let mut phases = Vec::new();
        let mut first = 1u32;
        let mut index = 0usize;
        while first <= current {
            let last = (first + per_phase - 1).min(current);
            let messages: Vec<DeliberationMessage> = state
                .transcript
                .iter()
                .filter(|m| m.round >= first && m.round <= last)
                .cloned()
                .collect();
            let is_trailing = last == current;
            let title = if is_trailing {
                format!("Current Discussion (Round {}-{})", first, last)
            } else {
                self.phase_title(index, first, last)
            };
            phases.push(Phase {
                title,
                first_round: first,
                last_round: last,
                messages,
            });
            first = last + 1;
            index += 1;
        }
        phases
    }

    async fn summarize_phase(&self, phase: &Phase) -> Result<String, DomainError> {
        let rendered = phase
            .messages
            .iter()
            .map(|m| format!("[{} / round {}] {}", m.agent_name, m.round, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.arbiter
            .respond(
                ArbiterRequest::new(format!(
                    "Summarize this discussion phase (rounds {}-{}):\n{}",
                    phase.first_round, phase.last_round, rendered
                ))
                .with_system_prompt(PHASE_SYSTEM_PROMPT)
                .with_temperature(0.3),
            )
            .await
    }

    async fn overview(&self, summaries: &[(String, String)]) -> Result<String, DomainError> {
        let joined = summaries
            .iter()
            .map(|(title, text)| format!("{}: {}", title, text))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.arbiter
            .respond(
                ArbiterRequest::new(format!("Condense these phase summaries:\n{}", joined))
                    .with_system_prompt(OVERVIEW_SYSTEM_PROMPT)
                    .with_temperature(0.3),
            )
            .await
    }
}

#[async_trait]
impl ContextManager for HierarchicalManager {
    fn name(&self) -> &'static str {
        "hierarchical"
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

        let mut phases = self.segment(state);
        let recent = phases.pop().expect("non-empty transcript yields a phase");

        let mut older_summaries: Vec<(String, String)> = Vec::new();
        for phase in &phases {
            let summary = self.summarize_phase(phase).await?;
            older_summaries.push((phase.title.clone(), summary));
        }
        let overview = if phases.len() > 1 {
            Some(self.overview(&older_summaries).await?)
        } else {
            None
        };

        // Pack under the budget
        let budget = self.config.max_tokens.unwrap_or(u64::MAX);
        let recent_budget =
            (budget as f64 * self.config.recent_phase_allocation.clamp(0.0, 1.0)) as u64;
        let recent_tokens: u64 = recent
            .messages
            .iter()
            .map(|m| u64::from(m.effective_tokens()))
            .sum();

        let mut messages = Vec::new();
        let mut spent = 0u64;
        let mut summarized = transcript_len - recent.messages.len();
        if recent_tokens <= recent_budget || self.config.max_tokens.is_none() {
            spent += recent_tokens;
            messages = recent.messages;
        } else {
            summarized = transcript_len;
        }

        let mut sections: Vec<String> = Vec::new();
        let mut remaining = budget.saturating_sub(spent);
        if let Some(overview) = overview {
            let allowance = (remaining as f64 * 0.3) as u64;
            let cost = u64::from(estimate_tokens(&overview));
            if cost <= allowance || self.config.max_tokens.is_none() {
                remaining = remaining.saturating_sub(cost);
                sections.push(format!("Overview: {}", overview));
            }
        }
        if !older_summaries.is_empty() {
            let share = remaining / older_summaries.len() as u64;
            for (title, text) in &older_summaries {
                // Budget shares are token counts; chars run about 4x
                let clipped = truncate_str(text, (share as usize).saturating_mul(4).max(16));
                sections.push(format!("{}: {}", title, clipped));
            }
        }
        let summary = if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        };

        let metadata = ContextMetadata {
            dropped: 0,
            summarized,
            masked: 0,
            rounds_preserved: if messages.is_empty() {
                Vec::new()
            } else {
                (recent.first_round..=recent.last_round).collect()
            },
        };
        Ok(ContextWindow::new(
            messages,
            summary,
            transcript_len,
            metadata,
        ))
    }
}
