//! Domain layer for conclave
//!
//! This crate contains the core business logic of the deliberation engine:
//! messages, personalities, voting strategies, termination strategies,
//! convergence calculators, and context-window managers. It has no
//! dependencies on provider or presentation concerns.

pub mod arbiter;
pub mod context;
pub mod convergence;
pub mod core;
pub mod deliberation;
pub mod message;
pub mod personality;
pub mod response;
pub mod termination;
pub mod tool;
pub mod util;
pub mod voting;

// Re-export commonly used types
pub use arbiter::{Arbiter, ArbiterRequest};
pub use context::{
    ContextManager, ContextMetadata, ContextWindow, HierarchicalConfig, HierarchicalManager,
    HybridConfig, HybridManager, MaskingConfig, MaskingStrategy, ObservationMaskingManager,
    PhaseNaming, RecursiveSummarizationConfig, RecursiveSummarizationManager, SlidingWindowConfig,
    SlidingWindowManager,
};
pub use convergence::{ConvergenceCalculator, LlmConvergence, TokenSimilarityConvergence};
pub use self::core::{error::DomainError, tokens::estimate_tokens};
pub use deliberation::{DeliberationMessage, DeliberationMode, DeliberationState};
pub use message::{Message, Role, ToolCall};
pub use personality::{CommunicationStyle, Personality, PersonalityBuilder};
pub use response::{AgentResponse, TokenUsage, VoteChoice};
pub use termination::{
    CompositeMode, CompositeTermination, ConvergenceTermination, CustomTermination, MaxRounds,
    MaxTime, MaxTokens, TerminationDecision, TerminationReason, TerminationStrategy,
};
pub use tool::ToolSpec;
pub use voting::{
    AggregationVoting, ConsensusVoting, ExpertPanelVoting, MajorityVoting, RankedChoiceVoting,
    VotingContext, VotingResult, VotingStrategy, WeightedVoting,
};
