//! Prompt templates for the deliberation flow.

use conclave_domain::deliberation::DeliberationMessage;
use conclave_domain::response::AgentResponse;

/// Templates for generating prompts at each stage
pub struct DeliberationPrompts;

impl DeliberationPrompts {
    /// Opening prompt for every agent in round 1
    pub fn initial_perspective(task: &str) -> String {
        format!(
            "The group is deliberating on the following task:\n\n{}\n\nProvide your initial \
             perspective. State your position and the reasoning behind it.",
            task
        )
    }

    /// Round-robin prompt for rounds after the first
    pub fn consider_others(task: &str, round: u32, others: &[(String, String)]) -> String {
        let mut prompt = format!(
            "Task under deliberation:\n{}\n\nRound {}. Consider the other perspectives from \
             the previous round:\n",
            task, round
        );
        for (name, content) in others {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", name, content));
        }
        prompt.push_str(
            "\nRestate or revise your position in light of these perspectives. Note where \
             you now agree and where you still differ.",
        );
        prompt
    }

    /// Debate prompt: opposing arguments to address head-on
    pub fn debate(task: &str, round: u32, others: &[(String, String)]) -> String {
        if others.is_empty() {
            return Self::initial_perspective(task);
        }
        let mut prompt = format!(
            "Task under debate:\n{}\n\nRound {}. These are the arguments you must address:\n",
            task, round
        );
        for (name, content) in others {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", name, content));
        }
        prompt.push_str(
            "\nEngage directly: rebut the points you disagree with, concede the ones you \
             cannot, and strengthen your own argument.",
        );
        prompt
    }

    /// Moderator framing for round 1
    pub fn moderator_opening(task: &str, participants: &[(String, String)]) -> String {
        let roster = participants
            .iter()
            .map(|(name, description)| format!("- {}: {}", name, description))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are moderating a deliberation on:\n{}\n\nParticipants:\n{}\n\nOpen the \
             discussion: frame the question, name the key tensions you expect, and invite \
             initial positions.",
            task, roster
        )
    }

    /// Moderator framing for later rounds
    pub fn moderator_continuation(
        task: &str,
        round: u32,
        last_round: &[(String, String)],
    ) -> String {
        let mut prompt = format!(
            "You are moderating a deliberation on:\n{}\n\nRound {} is starting. The previous \
             round produced:\n",
            task, round
        );
        for (name, content) in last_round {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", name, content));
        }
        prompt.push_str(
            "\nSummarize where the group stands, then direct the participants toward the \
             unresolved points.",
        );
        prompt
    }

    /// Participant reply in a moderated round
    pub fn moderated_reply(task: &str, moderator_name: &str, framing: &str) -> String {
        format!(
            "Task under deliberation:\n{}\n\nThe moderator ({}) says:\n{}\n\nRespond to the \
             moderator's direction with your position on the open points.",
            task, moderator_name, framing
        )
    }

    /// Free-form prompt over the full prior transcript
    pub fn free_form(task: &str, round: u32, transcript: &[DeliberationMessage]) -> String {
        let mut prompt = format!(
            "Task under deliberation:\n{}\n\nRound {}. Full discussion so far:\n",
            task, round
        );
        for message in transcript {
            prompt.push_str(&format!(
                "\n[{} / round {}] {}\n",
                message.agent_name, message.round, message.content
            ));
        }
        prompt.push_str("\nContribute whatever moves the discussion forward most.");
        prompt
    }

    /// System message describing the speaker and the roster
    pub fn participants_system(agent_name: &str, participants: &[(String, String)]) -> String {
        let roster = participants
            .iter()
            .map(|(name, description)| format!("- {}: {}", name, description))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are {} in a multi-agent deliberation.\nParticipants:\n{}",
            agent_name, roster
        )
    }

    /// Voting prompt over numbered candidate responses
    pub fn vote(task: &str, candidates: &[&AgentResponse]) -> String {
        let mut prompt = format!(
            "Task:\n{}\n\nCandidate responses:\n",
            task
        );
        for (i, candidate) in candidates.iter().enumerate() {
            prompt.push_str(&format!(
                "\n{}. [{}]\n{}\n",
                i + 1,
                candidate.agent_name,
                candidate.content
            ));
        }
        prompt.push_str(
            "\nWhich response best answers the task? Reply with its number and a short \
             justification.",
        );
        prompt
    }

    /// Judge prompt used by the agent/workflow termination strategies
    pub fn termination_judgement(task: &str, recent: &[DeliberationMessage]) -> String {
        let mut prompt = format!(
            "A group is deliberating on:\n{}\n\nRecent discussion:\n",
            task
        );
        for message in recent {
            prompt.push_str(&format!(
                "\n[{} / round {}] {}\n",
                message.agent_name, message.round, message.content
            ));
        }
        prompt.push_str(
            "\nJudge whether the deliberation should stop now. Consider whether the key \
             points are resolved and what remains outstanding.",
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_contains_task() {
        let prompt = DeliberationPrompts::initial_perspective("pick a database");
        assert!(prompt.contains("pick a database"));
    }

    #[test]
    fn test_consider_others_lists_peers() {
        let others = vec![
            ("Analyst".to_string(), "use postgres".to_string()),
            ("Critic".to_string(), "postgres is overkill".to_string()),
        ];
        let prompt = DeliberationPrompts::consider_others("task", 2, &others);
        assert!(prompt.contains("--- Analyst ---"));
        assert!(prompt.contains("postgres is overkill"));
        assert!(prompt.contains("Round 2"));
    }

    #[test]
    fn test_debate_without_priors_is_initial() {
        let prompt = DeliberationPrompts::debate("task", 1, &[]);
        assert!(prompt.contains("initial perspective"));
    }

    #[test]
    fn test_vote_numbers_from_one() {
        use conclave_domain::response::AgentResponse;
        use std::time::Duration;

        let a = AgentResponse::new("a1", "A1", "yes", Duration::ZERO);
        let b = AgentResponse::new("a2", "A2", "no", Duration::ZERO);
        let prompt = DeliberationPrompts::vote("task", &[&a, &b]);
        assert!(prompt.contains("1. [A1]"));
        assert!(prompt.contains("2. [A2]"));
    }
}
