//! Fluent builders for agents, workflows, and deliberations.

use crate::agent::Agent;
use crate::deliberation::{DeliberationExecutor, DeliberationOptions};
use crate::error::ConfigurationError;
use crate::ports::llm::{CompletionOptions, LlmProvider};
use crate::ports::progress::{DeliberationProgress, NoProgress, WorkflowProgress};
use crate::ports::tool::ToolDefinition;
use crate::workflow::{WorkflowExecutor, WorkflowOptions};
use conclave_domain::context::ContextManager;
use conclave_domain::convergence::{ConvergenceCalculator, TokenSimilarityConvergence};
use conclave_domain::deliberation::DeliberationMode;
use conclave_domain::personality::Personality;
use conclave_domain::termination::{
    CompositeTermination, ConvergenceTermination, MaxRounds, MaxTime, MaxTokens,
    TerminationStrategy,
};
use conclave_domain::voting::{MajorityVoting, VotingContext, VotingStrategy};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default round cap applied when a deliberation configures no
/// termination at all, so it cannot run unbounded.
const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Builder for [`Agent`]
pub struct AgentBuilder {
    id: String,
    name: String,
    personality: Personality,
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Vec<ToolDefinition>,
    options: CompletionOptions,
}

impl AgentBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            personality: Personality::analyst(),
            provider: None,
            tools: Vec::new(),
            options: CompletionOptions::default(),
        }
    }

    pub fn personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Agent, ConfigurationError> {
        let provider = self
            .provider
            .ok_or_else(|| ConfigurationError::MissingProvider(self.id.clone()))?;

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name().to_string()) {
                return Err(ConfigurationError::DuplicateTool {
                    agent: self.id,
                    name: tool.name().to_string(),
                });
            }
        }

        Ok(Agent::new(
            self.id,
            self.name,
            self.personality,
            provider,
            self.tools,
            self.options,
        ))
    }
}

/// Builder for [`WorkflowExecutor`]
pub struct WorkflowBuilder {
    agents: Vec<Arc<Agent>>,
    voting: Arc<dyn VotingStrategy>,
    voting_context: VotingContext,
    options: WorkflowOptions,
    progress: Arc<dyn WorkflowProgress>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            voting: Arc::new(MajorityVoting),
            voting_context: VotingContext::new(),
            options: WorkflowOptions::default(),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn agent(mut self, agent: Arc<Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: Vec<Arc<Agent>>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn voting(mut self, voting: Arc<dyn VotingStrategy>) -> Self {
        self.voting = voting;
        self
    }

    pub fn voting_context(mut self, context: VotingContext) -> Self {
        self.voting_context = context;
        self
    }

    /// Invoke agents in registration order instead of concurrently
    pub fn sequential(mut self) -> Self {
        self.options.enable_parallel_execution = false;
        self
    }

    /// Deadline for the parallel fan-out
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Require the given consensus score, retrying with the consensus
    /// strategy when the first vote falls short
    pub fn require_consensus(mut self, minimum_score: f64) -> Self {
        self.options.require_consensus = true;
        self.options.minimum_consensus_score = minimum_score.clamp(0.0, 1.0);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn WorkflowProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(self) -> Result<WorkflowExecutor, ConfigurationError> {
        WorkflowExecutor::new(
            self.agents,
            self.voting,
            self.voting_context,
            self.options,
            self.progress,
        )
    }

    /// Hand the same agents and voting over to a deliberation builder.
    pub fn with_deliberation<F>(self, configure: F) -> Result<DeliberationExecutor, ConfigurationError>
    where
        F: FnOnce(DeliberationBuilder) -> DeliberationBuilder,
    {
        let builder = DeliberationBuilder::new()
            .agents(self.agents)
            .voting(self.voting)
            .voting_context(self.voting_context);
        configure(builder).build()
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`DeliberationExecutor`]
pub struct DeliberationBuilder {
    agents: Vec<Arc<Agent>>,
    moderator: Option<Arc<Agent>>,
    voting: Arc<dyn VotingStrategy>,
    voting_context: VotingContext,
    termination: Option<Arc<dyn TerminationStrategy>>,
    composite: CompositeTermination,
    convergence: Arc<dyn ConvergenceCalculator>,
    context_manager: Option<Arc<dyn ContextManager>>,
    options: DeliberationOptions,
    progress: Arc<dyn DeliberationProgress>,
}

impl DeliberationBuilder {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            moderator: None,
            voting: Arc::new(MajorityVoting),
            voting_context: VotingContext::new(),
            termination: None,
            composite: CompositeTermination::any(),
            convergence: Arc::new(TokenSimilarityConvergence),
            context_manager: None,
            options: DeliberationOptions::default(),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn agent(mut self, agent: Arc<Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: Vec<Arc<Agent>>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn moderator(mut self, moderator: Arc<Agent>) -> Self {
        self.moderator = Some(moderator);
        self
    }

    pub fn mode(mut self, mode: DeliberationMode) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn voting(mut self, voting: Arc<dyn VotingStrategy>) -> Self {
        self.voting = voting;
        self
    }

    pub fn voting_context(mut self, context: VotingContext) -> Self {
        self.voting_context = context;
        self
    }

    /// Stop after `rounds` completed rounds
    pub fn max_rounds(mut self, rounds: u32) -> Self {
        self.composite = self.composite.with(MaxRounds(rounds));
        self.options.max_rounds_hint = Some(rounds);
        self
    }

    /// Stop once the token budget is spent
    pub fn max_tokens(mut self, tokens: u64) -> Self {
        self.composite = self.composite.with(MaxTokens(tokens));
        self.options.token_budget_hint = Some(tokens);
        self
    }

    /// Stop once the time budget elapses; a round in progress completes
    pub fn max_time(mut self, budget: Duration) -> Self {
        self.composite = self.composite.with(MaxTime(budget));
        self.options.time_budget_hint = Some(budget);
        self
    }

    /// Stop when convergence reaches the threshold (two-round minimum)
    pub fn convergence_threshold(mut self, threshold: f64) -> Self {
        self.composite = self.composite.with(ConvergenceTermination::new(threshold));
        self.options.convergence_threshold = Some(threshold.clamp(0.0, 1.0));
        self
    }

    /// Append any extra termination strategy to the composite
    pub fn terminate_when(mut self, strategy: Arc<dyn TerminationStrategy>) -> Self {
        self.composite = self.composite.with_shared(strategy);
        self
    }

    /// Replace the composite with an explicit termination strategy
    pub fn termination(mut self, termination: Arc<dyn TerminationStrategy>) -> Self {
        self.termination = Some(termination);
        self
    }

    pub fn convergence(mut self, convergence: Arc<dyn ConvergenceCalculator>) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn context_manager(mut self, manager: Arc<dyn ContextManager>) -> Self {
        self.context_manager = Some(manager);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn DeliberationProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(mut self) -> Result<DeliberationExecutor, ConfigurationError> {
        let termination: Arc<dyn TerminationStrategy> = match self.termination {
            Some(explicit) => explicit,
            None => {
                if self.composite.is_empty() {
                    self.composite = self.composite.with(MaxRounds(DEFAULT_MAX_ROUNDS));
                    self.options.max_rounds_hint = Some(DEFAULT_MAX_ROUNDS);
                }
                Arc::new(self.composite)
            }
        };

        DeliberationExecutor::new(
            self.agents,
            self.moderator,
            self.voting,
            self.voting_context,
            termination,
            self.convergence,
            self.context_manager,
            self.options,
            self.progress,
        )
    }
}

impl Default for DeliberationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
