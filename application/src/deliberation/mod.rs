//! Multi-round deliberation: repeated conversational rounds under a
//! composite termination budget, with context projection per agent.

mod executor;
mod terminators;

pub use executor::DeliberationExecutor;
pub use terminators::{AgentTermination, TerminationJudgement, WorkflowTermination};

use conclave_domain::deliberation::{DeliberationMode, DeliberationState};
use conclave_domain::termination::TerminationReason;
use conclave_domain::voting::VotingResult;
use std::time::Duration;

/// Options controlling a deliberation.
///
/// The budget fields are display hints surfaced in progress events; the
/// enforced budgets live in the termination strategies.
#[derive(Debug, Clone, Default)]
pub struct DeliberationOptions {
    /// Turn-taking mode for each round
    pub mode: DeliberationMode,
    /// Round budget hint for progress events
    pub max_rounds_hint: Option<u32>,
    /// Token budget hint for progress events
    pub token_budget_hint: Option<u64>,
    /// Time budget hint for progress events
    pub time_budget_hint: Option<Duration>,
    /// Convergence threshold; also sets the state's converged flag
    pub convergence_threshold: Option<f64>,
}

/// Outcome of one deliberation execution
#[derive(Debug)]
pub struct DeliberationResult {
    pub success: bool,
    /// Synthesized final answer
    pub value: Option<String>,
    /// Final state, preserved even on failure
    pub state: DeliberationState,
    pub termination_reason: Option<TerminationReason>,
    pub total_rounds: u32,
    pub total_tokens: u64,
    pub total_time: Duration,
    pub final_convergence_score: Option<f64>,
    pub voting_result: Option<VotingResult>,
    pub error: Option<String>,
}
