//! Ranked-choice voting: arbiter ranking resolved by instant runoff.

use super::{VotingContext, VotingResult, VotingStrategy, numbered_responses, parsing};
use crate::arbiter::ArbiterRequest;
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Ranked-choice reconciliation.
///
/// Requires an arbiter; without one it falls back to the first response
/// with consensus `1/N`. The arbiter is asked for a comma-separated
/// permutation of `1..N` (best first), parsed defensively, then resolved
/// by instant runoff: each elimination round, every ballot's vote goes to
/// its highest-ranked surviving option; an option with a strict majority
/// of votes cast wins, otherwise the option with fewest votes is
/// eliminated and the count repeats.
pub struct RankedChoiceVoting;

const RANKING_SYSTEM_PROMPT: &str = "You are an impartial judge ranking candidate answers. \
Reply with only a comma-separated ranking of the answer numbers, best first.";

fn ranking_prompt(task: &str, responses: &[AgentResponse]) -> String {
    format!(
        "Task:\n{}\n\nCandidate answers:\n{}Rank the answers from best to worst. \
         Reply with a comma-separated list of their numbers, e.g. \"2,1,3\".",
        task,
        numbered_responses(responses)
    )
}

/// Instant-runoff elimination over 0-based ballots.
///
/// Each ballot lists option indices in preference order. Returns the
/// winning option plus the final-round vote counts. At most `n - 1`
/// elimination passes run for `n` options.
pub(crate) fn run_instant_runoff(ballots: &[Vec<usize>], n: usize) -> (usize, BTreeMap<usize, usize>) {
    let mut eliminated = vec![false; n];

    loop {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        let mut cast = 0usize;
        for ballot in ballots {
            if let Some(&choice) = ballot.iter().find(|&&opt| !eliminated[opt]) {
                *counts.entry(choice).or_insert(0) += 1;
                cast += 1;
            }
        }

        let survivors: Vec<usize> = (0..n).filter(|&i| !eliminated[i]).collect();
        if survivors.len() == 1 {
            return (survivors[0], counts);
        }

        // Majority of votes cast wins outright
        let best = counts.iter().map(|(&opt, &votes)| (opt, votes)).max_by_key(|&(_, votes)| votes);
        if let Some((winner, votes)) = best
            && votes * 2 > cast
        {
            return (winner, counts);
        }

        // Eliminate the surviving option with the fewest votes
        let loser = survivors
            .iter()
            .copied()
            .min_by_key(|opt| counts.get(opt).copied().unwrap_or(0))
            .expect("at least two survivors");
        eliminated[loser] = true;
        debug!(option = loser, "ranked choice eliminated option");
    }
}

#[async_trait]
impl VotingStrategy for RankedChoiceVoting {
    fn name(&self) -> &'static str {
        "ranked-choice"
    }

    async fn vote(
        &self,
        task: &str,
        responses: &[AgentResponse],
        context: &VotingContext,
    ) -> Result<VotingResult, DomainError> {
        if responses.is_empty() {
            return Ok(VotingResult::empty(self.name()));
        }

        let Some(arbiter) = context.arbiter.as_ref() else {
            debug!("ranked choice without arbiter, falling back to first response");
            return Ok(VotingResult::from_winner(
                self.name(),
                &responses[0],
                1.0 / responses.len() as f64,
            ));
        };

        let reply = arbiter
            .respond(
                ArbiterRequest::new(ranking_prompt(task, responses))
                    .with_system_prompt(RANKING_SYSTEM_PROMPT),
            )
            .await?;

        let ballot = parsing::parse_ranking(&reply, responses.len());
        let (winner_idx, counts) = run_instant_runoff(&[ballot], responses.len());

        let tally: BTreeMap<String, f64> = counts
            .iter()
            .map(|(&idx, &votes)| (responses[idx].agent_id.clone(), votes as f64))
            .collect();
        let total: f64 = tally.values().sum();
        let winner_votes = tally
            .get(&responses[winner_idx].agent_id)
            .copied()
            .unwrap_or(0.0);
        let consensus = if total > 0.0 { winner_votes / total } else { 0.0 };

        Ok(
            VotingResult::from_winner(self.name(), &responses[winner_idx], consensus)
                .with_tally(tally),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_response as response;
    use super::*;
    use crate::arbiter::testing::ScriptedArbiter;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_arbiter_ranking_wins() {
        // Scenario E3: arbiter returns "2,1,3" so B wins
        let responses = vec![
            response("a1", "A"),
            response("a2", "B"),
            response("a3", "C"),
        ];
        let context =
            VotingContext::new().with_arbiter(Arc::new(ScriptedArbiter::new(["2,1,3"])));

        let result = RankedChoiceVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(result.winning_content, "B");
        assert_eq!(result.strategy, "ranked-choice");
        assert!(!result.tally.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_without_arbiter() {
        let responses = vec![response("a1", "A"), response("a2", "B")];
        let result = RankedChoiceVoting
            .vote("t", &responses, &VotingContext::new())
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a1");
        assert!((result.consensus_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_garbage_ranking_degrades_to_natural_order() {
        let responses = vec![response("a1", "A"), response("a2", "B")];
        let context =
            VotingContext::new().with_arbiter(Arc::new(ScriptedArbiter::new(["no idea"])));
        let result = RankedChoiceVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a1");
    }

    #[tokio::test]
    async fn test_arbiter_failure_propagates() {
        let responses = vec![response("a1", "A")];
        let context =
            VotingContext::new().with_arbiter(Arc::new(crate::arbiter::testing::FailingArbiter));
        let err = RankedChoiceVoting.vote("t", &responses, &context).await;
        assert!(matches!(err, Err(DomainError::Arbiter(_))));
    }

    // ==================== instant runoff Tests ====================

    #[test]
    fn test_runoff_majority_short_circuits() {
        let ballots = vec![vec![0, 1], vec![0, 1], vec![1, 0]];
        let (winner, _) = run_instant_runoff(&ballots, 2);
        assert_eq!(winner, 0);
    }

    #[test]
    fn test_runoff_elimination_transfers_votes() {
        // Option 2's supporters transfer to option 0 once 2 is eliminated
        let ballots = vec![
            vec![0, 1, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![1, 2, 0],
            vec![2, 0, 1],
        ];
        let (winner, _) = run_instant_runoff(&ballots, 3);
        assert_eq!(winner, 0);
    }

    #[test]
    fn test_runoff_terminates_within_n_minus_one_passes() {
        // Every ballot distinct: worst case still terminates
        let n = 6;
        let ballots: Vec<Vec<usize>> = (0..n).map(|i| {
            let mut b: Vec<usize> = (0..n).collect();
            b.rotate_left(i);
            b
        }).collect();
        let (winner, counts) = run_instant_runoff(&ballots, n);
        assert!(winner < n);
        assert!(!counts.is_empty());
    }
}
