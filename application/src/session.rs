//! Session facade.
//!
//! A session is a per-execution configuration aggregate: named providers,
//! agents, and an optional arbiter. There is no global state; dropping
//! the session releases everything.

use crate::agent::Agent;
use crate::builders::WorkflowBuilder;
use crate::error::ConfigurationError;
use crate::ports::llm::LlmProvider;
use crate::workflow::WorkflowResult;
use conclave_domain::arbiter::Arbiter;
use conclave_domain::voting::{self, VotingContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Configuration aggregate owning providers and agents
#[derive(Default)]
pub struct Session {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    agents: Vec<Arc<Agent>>,
    arbiter: Option<Arc<dyn Arbiter>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named provider
    pub fn add_provider(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Look up a registered provider
    pub fn provider(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Register a participating agent
    pub fn add_agent(&mut self, agent: Arc<Agent>) {
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Install the arbiter used by arbiter-backed voting strategies
    pub fn set_arbiter(&mut self, arbiter: Arc<dyn Arbiter>) {
        self.arbiter = Some(arbiter);
    }

    /// Build and run a single-shot workflow over the session's agents.
    ///
    /// `strategy_tag` selects the voting strategy (`majority`,
    /// `weighted`, `ranked-choice`, `consensus`, `aggregation`,
    /// `expert-panel`). Raises a configuration error synchronously when
    /// the session has no agents or the tag is unknown.
    pub async fn quick_execute(
        &self,
        task: &str,
        strategy_tag: &str,
    ) -> Result<WorkflowResult<String>, ConfigurationError> {
        if self.agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }
        let strategy = voting::strategy_for(strategy_tag)
            .ok_or_else(|| ConfigurationError::UnknownStrategy(strategy_tag.to_string()))?;

        let mut context = VotingContext::new();
        if let Some(arbiter) = &self.arbiter {
            context = context.with_arbiter(Arc::clone(arbiter));
        }

        let executor = WorkflowBuilder::new()
            .agents(self.agents.clone())
            .voting(strategy)
            .voting_context(context)
            .build()?;
        Ok(executor.execute(task, &CancellationToken::new()).await)
    }
}
