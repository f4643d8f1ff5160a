//! Voting and reconciliation strategies.
//!
//! Each strategy is pure over `(task, responses, context)` and produces
//! exactly one [`VotingResult`]: a winning text, a consensus score in
//! `[0, 1]`, and a vote tally. An empty response list always yields an
//! empty result with consensus 0.
//!
//! | Strategy | Arbiter | Fallback without arbiter |
//! |----------|---------|--------------------------|
//! | [`MajorityVoting`] | no | n/a |
//! | [`WeightedVoting`] | no | n/a |
//! | [`RankedChoiceVoting`] | yes | first response, consensus 1/N |
//! | [`ConsensusVoting`] | yes | first response, consensus 1/N |
//! | [`AggregationVoting`] | optional | `[name]: response` concatenation |
//! | [`ExpertPanelVoting`] | yes | weighted at default confidence 0.5 |

mod aggregation;
mod consensus;
mod expert_panel;
mod majority;
pub mod parsing;
mod ranked_choice;
mod weighted;

pub use aggregation::AggregationVoting;
pub use consensus::ConsensusVoting;
pub use expert_panel::ExpertPanelVoting;
pub use majority::MajorityVoting;
pub use ranked_choice::RankedChoiceVoting;
pub use weighted::WeightedVoting;

use crate::arbiter::Arbiter;
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Synthetic winner id used by [`ConsensusVoting`]
pub const CONSENSUS_AGENT_ID: &str = "consensus";
/// Synthetic winner id used by [`AggregationVoting`]
pub const AGGREGATION_AGENT_ID: &str = "aggregation";

/// Read-only parameters for one voting call
#[derive(Clone)]
pub struct VotingContext {
    /// Per-agent weights; missing entries default to 1.0
    pub weights: HashMap<String, f64>,
    /// Required consensus score for strategies and retry logic
    pub consensus_threshold: f64,
    /// Whether voters may abstain
    pub allow_abstention: bool,
    /// Round cap for strategies that iterate
    pub max_rounds: usize,
    /// Arbiter capability for strategies that judge or synthesize
    pub arbiter: Option<Arc<dyn Arbiter>>,
}

impl VotingContext {
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
            consensus_threshold: 0.6,
            allow_abstention: false,
            max_rounds: 3,
            arbiter: None,
        }
    }

    pub fn with_weight(mut self, agent_id: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(agent_id.into(), weight);
        self
    }

    pub fn with_consensus_threshold(mut self, threshold: f64) -> Self {
        self.consensus_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_arbiter(mut self, arbiter: Arc<dyn Arbiter>) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    /// Weight for an agent, defaulting to 1.0
    pub fn weight_of(&self, agent_id: &str) -> f64 {
        self.weights.get(agent_id).copied().unwrap_or(1.0)
    }
}

impl Default for VotingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VotingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingContext")
            .field("weights", &self.weights)
            .field("consensus_threshold", &self.consensus_threshold)
            .field("allow_abstention", &self.allow_abstention)
            .field("max_rounds", &self.max_rounds)
            .field("arbiter", &self.arbiter.is_some())
            .finish()
    }
}

/// Outcome of one voting call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingResult {
    /// The winning text
    pub winning_content: String,
    /// Structured output of the winning response, when it had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_structured: Option<serde_json::Value>,
    /// Id of the winning agent, or a synthetic id
    /// (`"consensus"` / `"aggregation"`)
    pub winning_agent_id: String,
    /// Tag of the strategy that produced this result
    pub strategy: String,
    /// Vote tally; keys are stable across calls of the same strategy
    pub tally: BTreeMap<String, f64>,
    /// Consensus score in [0, 1]
    pub consensus_score: f64,
}

impl VotingResult {
    /// Result for an empty response list: no winner, consensus 0
    pub fn empty(strategy: impl Into<String>) -> Self {
        Self {
            winning_content: String::new(),
            winning_structured: None,
            winning_agent_id: String::new(),
            strategy: strategy.into(),
            tally: BTreeMap::new(),
            consensus_score: 0.0,
        }
    }

    /// Result built from a single winning response
    pub fn from_winner(
        strategy: impl Into<String>,
        winner: &AgentResponse,
        consensus_score: f64,
    ) -> Self {
        Self {
            winning_content: winner.content.clone(),
            winning_structured: winner.structured.clone(),
            winning_agent_id: winner.agent_id.clone(),
            strategy: strategy.into(),
            tally: BTreeMap::new(),
            consensus_score: consensus_score.clamp(0.0, 1.0),
        }
    }

    pub fn with_tally(mut self, tally: BTreeMap<String, f64>) -> Self {
        self.tally = tally;
        self
    }
}

/// A reconciliation policy over agent responses
#[async_trait]
pub trait VotingStrategy: Send + Sync {
    /// Stable strategy tag, used in [`VotingResult::strategy`]
    fn name(&self) -> &'static str;

    /// Reconcile the responses into one winner.
    ///
    /// Arbiter transport failures propagate; parse failures never do (each
    /// strategy degrades defensively instead).
    async fn vote(
        &self,
        task: &str,
        responses: &[AgentResponse],
        context: &VotingContext,
    ) -> Result<VotingResult, DomainError>;
}

/// Look up a strategy by its tag.
///
/// Recognized tags: `majority`, `weighted`, `ranked-choice`, `consensus`,
/// `aggregation`, `expert-panel`.
pub fn strategy_for(tag: &str) -> Option<Arc<dyn VotingStrategy>> {
    match tag {
        "majority" => Some(Arc::new(MajorityVoting)),
        "weighted" => Some(Arc::new(WeightedVoting)),
        "ranked-choice" => Some(Arc::new(RankedChoiceVoting)),
        "consensus" => Some(Arc::new(ConsensusVoting)),
        "aggregation" => Some(Arc::new(AggregationVoting)),
        "expert-panel" => Some(Arc::new(ExpertPanelVoting)),
        _ => None,
    }
}

/// Format responses as a numbered list (1-based) for arbiter prompts.
pub(crate) fn numbered_responses(responses: &[AgentResponse]) -> String {
    let mut out = String::new();
    for (i, r) in responses.iter().enumerate() {
        out.push_str(&format!("{}. [{}]\n{}\n\n", i + 1, r.agent_name, r.content));
    }
    out
}

/// Test helper shared by the strategy test modules.
#[cfg(test)]
pub(crate) fn test_response(id: &str, content: &str) -> AgentResponse {
    AgentResponse::new(
        id,
        id.to_uppercase(),
        content,
        std::time::Duration::from_millis(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_response as response;

    #[test]
    fn test_weight_defaults_to_one() {
        let ctx = VotingContext::new().with_weight("expert", 3.0);
        assert_eq!(ctx.weight_of("expert"), 3.0);
        assert_eq!(ctx.weight_of("novice"), 1.0);
    }

    #[test]
    fn test_threshold_default_and_clamp() {
        assert_eq!(VotingContext::new().consensus_threshold, 0.6);
        let ctx = VotingContext::new().with_consensus_threshold(1.4);
        assert_eq!(ctx.consensus_threshold, 1.0);
    }

    #[test]
    fn test_empty_result() {
        let r = VotingResult::empty("majority");
        assert_eq!(r.consensus_score, 0.0);
        assert!(r.winning_content.is_empty());
        assert!(r.tally.is_empty());
    }

    #[test]
    fn test_strategy_for_tags() {
        for tag in [
            "majority",
            "weighted",
            "ranked-choice",
            "consensus",
            "aggregation",
            "expert-panel",
        ] {
            let strategy = strategy_for(tag).unwrap();
            assert_eq!(strategy.name(), tag);
        }
        assert!(strategy_for("plurality").is_none());
    }

    #[test]
    fn test_numbered_responses_start_at_one() {
        let list = numbered_responses(&[response("a1", "yes"), response("a2", "no")]);
        assert!(list.starts_with("1. [A1]"));
        assert!(list.contains("2. [A2]"));
    }
}
