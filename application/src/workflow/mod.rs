//! Single-shot workflow: fan one task out to every agent, reconcile by
//! voting, extract one result.

mod executor;

pub use executor::WorkflowExecutor;

use conclave_domain::response::AgentResponse;
use conclave_domain::voting::VotingResult;
use std::time::Duration;

/// Options controlling a single-shot workflow
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Fan agents out concurrently instead of in registration order
    pub enable_parallel_execution: bool,
    /// Deadline for the whole parallel fan-out
    pub timeout: Option<Duration>,
    /// Re-run with the consensus strategy when the score falls short
    pub require_consensus: bool,
    /// Score the voting result must reach when consensus is required
    pub minimum_consensus_score: f64,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            enable_parallel_execution: true,
            timeout: None,
            require_consensus: false,
            minimum_consensus_score: 0.6,
        }
    }
}

/// Outcome of one workflow execution.
///
/// Runtime failures land here as `success == false` with an error
/// message; only configuration mistakes surface as `Err` at build time.
#[derive(Debug)]
pub struct WorkflowResult<T> {
    pub success: bool,
    pub value: Option<T>,
    pub agent_responses: Vec<AgentResponse>,
    pub voting_result: Option<VotingResult>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl<T> WorkflowResult<T> {
    pub(crate) fn failure(
        error: impl Into<String>,
        agent_responses: Vec<AgentResponse>,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            value: None,
            agent_responses,
            voting_result: None,
            elapsed,
            error: Some(error.into()),
        }
    }
}
