//! Progress notification ports.
//!
//! Implementations live in the embedding application (console, web UI)
//! and receive one event per stage transition.

use std::time::Duration;

/// Stages of a single-shot workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Initializing,
    AgentProcessing,
    Voting,
    ConsensusBuilding,
    Finalizing,
    Completed,
    Failed,
}

/// One workflow progress event
#[derive(Debug, Clone)]
pub struct WorkflowProgressEvent {
    pub stage: WorkflowStage,
    pub message: String,
    pub completed_agents: usize,
    pub total_agents: usize,
    pub current_agent_id: Option<String>,
}

/// Callback for workflow progress updates
pub trait WorkflowProgress: Send + Sync {
    fn notify(&self, event: &WorkflowProgressEvent);
}

/// Stages of a deliberation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliberationStage {
    Initializing,
    RoundStarting,
    AgentSpeaking,
    RoundComplete,
    EvaluatingConvergence,
    CheckingTermination,
    Synthesizing,
    Complete,
    Failed,
}

/// One deliberation progress event
#[derive(Debug, Clone)]
pub struct DeliberationProgressEvent {
    pub stage: DeliberationStage,
    pub current_round: u32,
    pub max_rounds: Option<u32>,
    pub current_speaker: Option<String>,
    pub tokens_used: u64,
    pub token_budget: Option<u64>,
    pub elapsed: Duration,
    pub time_budget: Option<Duration>,
    pub convergence_score: Option<f64>,
    pub convergence_threshold: Option<f64>,
    pub message: String,
}

/// Callback for deliberation progress updates
pub trait DeliberationProgress: Send + Sync {
    fn notify(&self, event: &DeliberationProgressEvent);
}

/// No-op notifier for when progress reporting is not needed
pub struct NoProgress;

impl WorkflowProgress for NoProgress {
    fn notify(&self, _event: &WorkflowProgressEvent) {}
}

impl DeliberationProgress for NoProgress {
    fn notify(&self, _event: &DeliberationProgressEvent) {}
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording notifiers for executor tests.

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingProgress {
        pub workflow_stages: Mutex<Vec<WorkflowStage>>,
        pub deliberation_stages: Mutex<Vec<DeliberationStage>>,
    }

    impl WorkflowProgress for RecordingProgress {
        fn notify(&self, event: &WorkflowProgressEvent) {
            self.workflow_stages.lock().unwrap().push(event.stage);
        }
    }

    impl DeliberationProgress for RecordingProgress {
        fn notify(&self, event: &DeliberationProgressEvent) {
            self.deliberation_stages.lock().unwrap().push(event.stage);
        }
    }
}
