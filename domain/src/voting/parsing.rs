//! Defensive parsers for arbiter replies.
//!
//! Arbiter-backed strategies never trust model output. These functions
//! extract what they can and degrade to documented defaults instead of
//! failing. They are pure domain logic: no I/O, just text.
//!
//! | Function | Use case | Default |
//! |----------|----------|---------|
//! | [`parse_unit_score`] | single 0.0-1.0 judgement | 0.5 |
//! | [`parse_unit_scores`] | panel scoring (all numbers in range) | empty |
//! | [`parse_ranking`] | ranked-choice permutation of 1..N | natural order fill |

use regex::Regex;
use std::sync::OnceLock;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"))
}

/// Parse the first number in the reply, clamped to `[0, 1]`.
///
/// Returns 0.5 when no number can be parsed.
///
/// # Examples
///
/// ```
/// use conclave_domain::voting::parsing::parse_unit_score;
///
/// assert_eq!(parse_unit_score("0.85"), 0.85);
/// assert_eq!(parse_unit_score("Score: 0.7 overall"), 0.7);
/// assert_eq!(parse_unit_score("about 3 out of 10"), 1.0); // clamped
/// assert_eq!(parse_unit_score("no verdict"), 0.5);
/// ```
pub fn parse_unit_score(reply: &str) -> f64 {
    number_pattern()
        .find(reply)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(0.5)
}

/// Parse every number in `[0, 1]` appearing in the reply, in order.
///
/// Out-of-range numbers are dropped rather than clamped: a reply like
/// "criterion 3: 0.8" must not contribute the criterion index as a score.
pub fn parse_unit_scores(reply: &str) -> Vec<f64> {
    number_pattern()
        .find_iter(reply)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| (0.0..=1.0).contains(n))
        .collect()
}

/// Parse a comma-separated ranking of the 1-based indices `1..=n`.
///
/// Defensive: duplicates are dropped, out-of-range entries are dropped,
/// and any indices missing after parsing are appended in natural order.
/// The result is always a permutation of `0..n` (0-based).
///
/// # Examples
///
/// ```
/// use conclave_domain::voting::parsing::parse_ranking;
///
/// assert_eq!(parse_ranking("2, 1, 3", 3), vec![1, 0, 2]);
/// assert_eq!(parse_ranking("2, 2, 9", 3), vec![1, 0, 2]); // dedupe + fill
/// assert_eq!(parse_ranking("no ranking at all", 3), vec![0, 1, 2]);
/// ```
pub fn parse_ranking(reply: &str, n: usize) -> Vec<usize> {
    let mut ranking = Vec::with_capacity(n);
    for m in number_pattern().find_iter(reply) {
        if let Ok(idx) = m.as_str().parse::<usize>()
            && (1..=n).contains(&idx)
            && !ranking.contains(&(idx - 1))
        {
            ranking.push(idx - 1);
        }
    }
    for idx in 0..n {
        if !ranking.contains(&idx) {
            ranking.push(idx);
        }
    }
    ranking
}

/// Parse the highest integer in `1..=n` appearing in the reply.
///
/// Used by the vote extraction: the ballot is the largest in-range number
/// the voter mentioned. Returns `None` when no in-range number appears.
pub fn parse_choice(reply: &str, n: usize) -> Option<usize> {
    number_pattern()
        .find_iter(reply)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter(|idx| (1..=n).contains(idx))
        .max()
}

/// Extract the substring between the first `{` and the last `}`.
///
/// Used by structured-output extraction; returns `None` when the braces
/// are absent or inverted.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}
