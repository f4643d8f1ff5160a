//! Workflow executor: fan-out, voting, consensus retry, extraction.

use super::{WorkflowOptions, WorkflowResult};
use crate::agent::{Agent, SchemaHint};
use crate::error::ConfigurationError;
use crate::ports::progress::{WorkflowProgress, WorkflowProgressEvent, WorkflowStage};
use conclave_domain::response::AgentResponse;
use conclave_domain::voting::{ConsensusVoting, VotingContext, VotingResult, VotingStrategy};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executes one task across every agent and reconciles the answers.
///
/// Shared and immutable: one executor can serve many concurrent
/// `execute` calls, each with its own cancellation token.
pub struct WorkflowExecutor {
    agents: Vec<Arc<Agent>>,
    voting: Arc<dyn VotingStrategy>,
    voting_context: VotingContext,
    options: WorkflowOptions,
    progress: Arc<dyn WorkflowProgress>,
}

impl WorkflowExecutor {
    pub(crate) fn new(
        agents: Vec<Arc<Agent>>,
        voting: Arc<dyn VotingStrategy>,
        voting_context: VotingContext,
        options: WorkflowOptions,
        progress: Arc<dyn WorkflowProgress>,
    ) -> Result<Self, ConfigurationError> {
        if agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }
        Ok(Self {
            agents,
            voting,
            voting_context,
            options,
            progress,
        })
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Execute the workflow; the winner's text is the value.
    pub async fn execute(&self, task: &str, cancel: &CancellationToken) -> WorkflowResult<String> {
        self.run(task, None, cancel, |voting| {
            Some(voting.winning_content.clone())
        })
        .await
    }

    /// Execute the workflow with structured output.
    ///
    /// Agents receive the schema hint; the winner's structured output is
    /// cast to `T`, yielding `None` when the cast fails.
    pub async fn execute_structured<T: DeserializeOwned>(
        &self,
        task: &str,
        schema: &SchemaHint,
        cancel: &CancellationToken,
    ) -> WorkflowResult<T> {
        self.run(task, Some(schema), cancel, |voting| {
            voting
                .winning_structured
                .clone()
                .and_then(|value| serde_json::from_value(value).ok())
        })
        .await
    }

    async fn run<T>(
        &self,
        task: &str,
        schema: Option<&SchemaHint>,
        cancel: &CancellationToken,
        extract: impl Fn(&VotingResult) -> Option<T>,
    ) -> WorkflowResult<T> {
        let started = Instant::now();
        let total = self.agents.len();
        self.emit(WorkflowStage::Initializing, "Starting workflow", 0, None);
        info!(agents = total, parallel = self.options.enable_parallel_execution, "workflow start");

        // Deadline is a child token so a user cancel and a timeout are
        // distinguishable after the fan-out drains
        let effective = cancel.child_token();
        if self.options.enable_parallel_execution
            && let Some(timeout) = self.options.timeout
        {
            let deadline = effective.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline.cancel();
            });
        }

        let responses = if self.options.enable_parallel_execution {
            self.gather_parallel(task, schema, &effective).await
        } else {
            self.gather_sequential(task, schema, &effective).await
        };

        if cancel.is_cancelled() {
            self.emit(WorkflowStage::Failed, "Cancelled", responses.len(), None);
            return WorkflowResult::failure("Workflow was cancelled", responses, started.elapsed());
        }
        if effective.is_cancelled() {
            let timeout = self.options.timeout.unwrap_or_default();
            self.emit(WorkflowStage::Failed, "Timed out", responses.len(), None);
            return WorkflowResult::failure(
                format!("Workflow timed out after {:?}", timeout),
                responses,
                started.elapsed(),
            );
        }
        if responses.is_empty() {
            self.emit(WorkflowStage::Failed, "No responses", 0, None);
            return WorkflowResult::failure(
                "No agent responses received",
                responses,
                started.elapsed(),
            );
        }

        self.emit(
            WorkflowStage::Voting,
            format!("Voting with {}", self.voting.name()),
            responses.len(),
            None,
        );
        let mut voting_result = match self
            .voting
            .vote(task, &responses, &self.voting_context)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.emit(WorkflowStage::Failed, "Voting failed", responses.len(), None);
                return WorkflowResult::failure(e.to_string(), responses, started.elapsed());
            }
        };

        if self.options.require_consensus
            && voting_result.consensus_score < self.options.minimum_consensus_score
        {
            self.emit(
                WorkflowStage::ConsensusBuilding,
                format!(
                    "Consensus {:.2} below {:.2}, synthesizing",
                    voting_result.consensus_score, self.options.minimum_consensus_score
                ),
                responses.len(),
                None,
            );
            voting_result = match ConsensusVoting
                .vote(task, &responses, &self.voting_context)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    self.emit(WorkflowStage::Failed, "Consensus failed", responses.len(), None);
                    return WorkflowResult::failure(e.to_string(), responses, started.elapsed());
                }
            };
        }

        self.emit(WorkflowStage::Finalizing, "Extracting result", responses.len(), None);
        let value = extract(&voting_result);
        self.emit(WorkflowStage::Completed, "Workflow complete", responses.len(), None);
        info!(
            winner = %voting_result.winning_agent_id,
            consensus = voting_result.consensus_score,
            "workflow complete"
        );

        WorkflowResult {
            success: true,
            value,
            agent_responses: responses,
            voting_result: Some(voting_result),
            elapsed: started.elapsed(),
            error: None,
        }
    }

    async fn gather_parallel(
        &self,
        task: &str,
        schema: Option<&SchemaHint>,
        cancel: &CancellationToken,
    ) -> Vec<AgentResponse> {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut join_set = JoinSet::new();

        for (idx, agent) in self.agents.iter().enumerate() {
            self.emit(
                WorkflowStage::AgentProcessing,
                format!("Invoking {}", agent.name()),
                completed.load(Ordering::SeqCst),
                Some(agent.id().to_string()),
            );
            let agent = Arc::clone(agent);
            let task = task.to_string();
            let schema = schema.cloned();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let response = match schema {
                    Some(schema) => {
                        agent
                            .process_structured(&task, &schema, None, &cancel)
                            .await
                    }
                    None => agent.process(&task, None, &cancel).await,
                };
                (idx, response)
            });
        }

        let mut slots: Vec<Option<AgentResponse>> = (0..self.agents.len()).map(|_| None).collect();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((idx, response)) => {
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.emit(
                        WorkflowStage::AgentProcessing,
                        format!("{} responded", response.agent_name),
                        done,
                        Some(response.agent_id.clone()),
                    );
                    slots[idx] = Some(response);
                }
                Err(e) => warn!("agent task join error: {}", e),
            }
        }

        // Registration order, independent of completion order
        slots.into_iter().flatten().collect()
    }

    async fn gather_sequential(
        &self,
        task: &str,
        schema: Option<&SchemaHint>,
        cancel: &CancellationToken,
    ) -> Vec<AgentResponse> {
        let mut responses = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            if cancel.is_cancelled() {
                break;
            }
            self.emit(
                WorkflowStage::AgentProcessing,
                format!("Invoking {}", agent.name()),
                responses.len(),
                Some(agent.id().to_string()),
            );
            let response = match schema {
                Some(schema) => agent.process_structured(task, schema, None, cancel).await,
                None => agent.process(task, None, cancel).await,
            };
            debug!(agent = %agent.id(), error = response.is_error(), "agent responded");
            responses.push(response);
            self.emit(
                WorkflowStage::AgentProcessing,
                "Agent responded",
                responses.len(),
                None,
            );
        }
        responses
    }

    fn emit(
        &self,
        stage: WorkflowStage,
        message: impl Into<String>,
        completed: usize,
        current_agent_id: Option<String>,
    ) {
        self.progress.notify(&WorkflowProgressEvent {
            stage,
            message: message.into(),
            completed_agents: completed,
            total_agents: self.agents.len(),
            current_agent_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{AgentBuilder, WorkflowBuilder};
    use crate::ports::llm::testing::{ConstantProvider, FailingProvider, SlowProvider};
    use crate::ports::progress::testing::RecordingProgress;
    use conclave_domain::personality::Personality;
    use conclave_domain::voting::MajorityVoting;
    use serde::Deserialize;
    use std::time::Duration;

    fn constant_agent(id: &str, reply: &str) -> Arc<Agent> {
        Arc::new(
            AgentBuilder::new(id, id.to_uppercase())
                .personality(Personality::analyst())
                .provider(Arc::new(ConstantProvider(reply.into())))
                .build()
                .unwrap(),
        )
    }

    fn executor(agents: Vec<Arc<Agent>>) -> WorkflowExecutor {
        WorkflowBuilder::new()
            .agents(agents)
            .voting(Arc::new(MajorityVoting))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_majority_of_three() {
        let executor = executor(vec![
            constant_agent("a1", "yes"),
            constant_agent("a2", "yes"),
            constant_agent("a3", "no"),
        ]);
        let result = executor.execute("ship it?", &CancellationToken::new()).await;

        assert!(result.success);
        assert_eq!(result.value.as_deref(), Some("yes"));
        assert_eq!(result.agent_responses.len(), 3);
        let voting = result.voting_result.unwrap();
        assert_eq!(voting.winning_agent_id, "a1");
        assert!((voting.consensus_score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sequential_matches_parallel() {
        let mut builder = WorkflowBuilder::new()
            .agents(vec![constant_agent("a1", "yes"), constant_agent("a2", "no")])
            .voting(Arc::new(MajorityVoting));
        builder = builder.sequential();
        let executor = builder.build().unwrap();

        let result = executor.execute("ship it?", &CancellationToken::new()).await;
        assert!(result.success);
        // Registration order preserved
        assert_eq!(result.agent_responses[0].agent_id, "a1");
        assert_eq!(result.agent_responses[1].agent_id, "a2");
    }

    #[tokio::test]
    async fn test_failed_agent_still_counts_as_response() {
        let failing = Arc::new(
            AgentBuilder::new("a2", "A2")
                .personality(Personality::critic())
                .provider(Arc::new(FailingProvider))
                .build()
                .unwrap(),
        );
        let executor = executor(vec![constant_agent("a1", "yes"), failing]);
        let result = executor.execute("ship it?", &CancellationToken::new()).await;

        assert!(result.success);
        assert_eq!(result.agent_responses.len(), 2);
        assert!(result.agent_responses.iter().any(|r| r.is_error()));
        // The healthy agent's answer wins
        assert_eq!(result.value.as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_from_cancel() {
        let slow = Arc::new(
            AgentBuilder::new("a1", "A1")
                .personality(Personality::analyst())
                .provider(Arc::new(SlowProvider {
                    delay: Duration::from_secs(5),
                    reply: "late".into(),
                }))
                .build()
                .unwrap(),
        );
        let executor = WorkflowBuilder::new()
            .agents(vec![slow])
            .timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let result = executor.execute("task", &CancellationToken::new()).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_user_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let executor = executor(vec![constant_agent("a1", "yes")]);
        let result = executor.execute("task", &cancel).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Workflow was cancelled"));
    }

    #[tokio::test]
    async fn test_consensus_retry_path() {
        use crate::ports::progress::WorkflowStage;

        // Three disjoint answers: majority consensus 1/3 < 0.6
        let progress = Arc::new(RecordingProgress::default());
        let executor = WorkflowBuilder::new()
            .agents(vec![
                constant_agent("a1", "alpha"),
                constant_agent("a2", "beta"),
                constant_agent("a3", "gamma"),
            ])
            .require_consensus(0.6)
            .progress(progress.clone())
            .build()
            .unwrap();

        let result = executor.execute("task", &CancellationToken::new()).await;
        assert!(result.success);
        let stages = progress.workflow_stages.lock().unwrap();
        assert!(stages.contains(&WorkflowStage::ConsensusBuilding));
        // Without an arbiter the consensus fallback picks the first response
        let voting = result.voting_result.unwrap();
        assert_eq!(voting.strategy, "consensus");
        assert_eq!(voting.winning_agent_id, "a1");
    }

    #[tokio::test]
    async fn test_structured_extraction() {
        #[derive(Deserialize)]
        struct Verdict {
            verdict: String,
        }

        let agent = constant_agent("a1", r#"{"verdict": "ship"}"#);
        let executor = executor(vec![agent]);
        let schema = SchemaHint::new().field("verdict", "string");
        let result: WorkflowResult<Verdict> = executor
            .execute_structured("judge", &schema, &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.value.unwrap().verdict, "ship");
    }

    #[tokio::test]
    async fn test_structured_cast_failure_yields_none() {
        #[derive(Deserialize)]
        struct Verdict {
            #[allow(dead_code)]
            verdict: u32, // mismatched type
        }

        let agent = constant_agent("a1", r#"{"verdict": "ship"}"#);
        let executor = executor(vec![agent]);
        let schema = SchemaHint::new().field("verdict", "string");
        let result: WorkflowResult<Verdict> = executor
            .execute_structured("judge", &schema, &CancellationToken::new())
            .await;

        assert!(result.success);
        assert!(result.value.is_none());
    }

    #[tokio::test]
    async fn test_progress_stage_sequence() {
        let progress = Arc::new(RecordingProgress::default());
        let executor = WorkflowBuilder::new()
            .agents(vec![constant_agent("a1", "yes")])
            .progress(progress.clone())
            .build()
            .unwrap();
        executor.execute("task", &CancellationToken::new()).await;

        let stages = progress.workflow_stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&WorkflowStage::Initializing));
        assert_eq!(stages.last(), Some(&WorkflowStage::Completed));
        assert!(stages.contains(&WorkflowStage::Voting));
        assert!(stages.contains(&WorkflowStage::Finalizing));
    }

    #[test]
    fn test_no_agents_is_config_error() {
        let result = WorkflowBuilder::new().build();
        assert!(matches!(result, Err(ConfigurationError::NoAgents)));
    }
}
