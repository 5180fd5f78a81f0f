//! Aggregation of revealed votes into statistics and a suggested estimate.

use serde::Serialize;
use uuid::Uuid;

use super::aggregates::Story;
use super::vote::Vote;

/// Reference values the average is snapped to when neither consensus nor
/// a unique mode exists.
pub const REFERENCE_SCALE: [f64; 12] = [
    0.0, 0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0, 89.0,
];

/// A vote together with the voter details shown in the breakdown.
#[derive(Debug, Clone)]
pub struct Ballot {
    /// The vote.
    pub vote: Vote,
    /// Display name of the voter.
    pub voter_name: String,
    /// Avatar emoji of the voter.
    pub avatar_emoji: Option<String>,
}

/// One line of the per-voter breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoterBreakdown {
    /// The voter.
    pub participant_id: Uuid,
    /// Display name.
    pub name: String,
    /// Card value.
    pub vote: String,
    /// Avatar emoji.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_emoji: Option<String>,
}

/// A raw vote in the statistics output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealedVote {
    /// The voter.
    pub participant_id: Uuid,
    /// Card value.
    pub value: String,
}

/// Summary of the numeric votes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Average rounded to one decimal.
    pub average: f64,
    /// Smallest numeric vote.
    pub min: f64,
    /// Largest numeric vote.
    pub max: f64,
    /// All numeric votes are equal.
    pub consensus: bool,
    /// Unique most frequent card, as voted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Counts of the non-numeric special cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialCardTally {
    /// `?` votes.
    pub unknown: usize,
    /// Coffee-break votes.
    pub coffee: usize,
}

/// Aggregated statistics for a story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteStatistics {
    /// Number of votes.
    pub total_votes: usize,
    /// Raw vote list.
    pub votes: Vec<RevealedVote>,
    /// Per-voter breakdown.
    pub voters: Vec<VoterBreakdown>,
    /// Present when at least one vote is numeric.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    /// Present when at least one special card was played.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_cards: Option<SpecialCardTally>,
    /// Suggested final estimate.
    pub suggested_estimate: Option<String>,
}

impl VoteStatistics {
    /// The result for hidden or vote-less stories.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_votes: 0,
            votes: Vec::new(),
            voters: Vec::new(),
            numeric: None,
            special_cards: None,
            suggested_estimate: None,
        }
    }

    /// Whether nothing was aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_votes == 0
    }
}

/// Aggregates the ballots of a story.
///
/// Returns [`VoteStatistics::empty`] while the story's votes are hidden.
#[must_use]
pub fn compute_statistics(story: &Story, ballots: &[Ballot]) -> VoteStatistics {
    if !story.votes_visible() || ballots.is_empty() {
        return VoteStatistics::empty();
    }
    let votes: Vec<&Vote> = ballots.iter().map(|b| &b.vote).collect();
    let numeric = summarize_numeric(&votes);
    let suggested_estimate = numeric.as_ref().and_then(suggest_from_summary);

    VoteStatistics {
        total_votes: ballots.len(),
        votes: ballots
            .iter()
            .map(|b| RevealedVote {
                participant_id: b.vote.participant_id,
                value: b.vote.value.clone(),
            })
            .collect(),
        voters: ballots
            .iter()
            .map(|b| VoterBreakdown {
                participant_id: b.vote.participant_id,
                name: b.voter_name.clone(),
                vote: b.vote.value.clone(),
                avatar_emoji: b.avatar_emoji.clone(),
            })
            .collect(),
        numeric,
        special_cards: tally_special(&votes),
        suggested_estimate,
    }
}

/// Suggests a final estimate from a set of votes regardless of
/// visibility. `None` when no vote is numeric.
#[must_use]
pub fn suggest_estimate(votes: &[Vote]) -> Option<String> {
    let refs: Vec<&Vote> = votes.iter().collect();
    summarize_numeric(&refs)
        .as_ref()
        .and_then(suggest_from_summary)
}

/// The reference value closest to `average`. On a tie the smaller value
/// wins.
#[must_use]
pub fn nearest_reference(average: f64) -> f64 {
    let mut closest = REFERENCE_SCALE[0];
    let mut best = (average - closest).abs();
    for &candidate in &REFERENCE_SCALE[1..] {
        let diff = (average - candidate).abs();
        if diff < best {
            best = diff;
            closest = candidate;
        }
    }
    closest
}

fn suggest_from_summary(summary: &NumericSummary) -> Option<String> {
    if summary.consensus {
        // consensus implies min == max
        return summary.mode.clone().or_else(|| Some(format!("{}", summary.min)));
    }
    if let Some(mode) = &summary.mode {
        return Some(mode.clone());
    }
    Some(format!("{}", nearest_reference(summary.average)))
}

#[allow(clippy::cast_precision_loss)]
fn summarize_numeric(votes: &[&Vote]) -> Option<NumericSummary> {
    let numeric: Vec<(&Vote, f64)> = votes
        .iter()
        .filter_map(|v| v.numeric_value().map(|n| (*v, n)))
        .collect();
    if numeric.is_empty() {
        return None;
    }

    let sum: f64 = numeric.iter().map(|(_, n)| n).sum();
    let average = (sum / numeric.len() as f64 * 10.0).round() / 10.0;
    let min = numeric.iter().map(|(_, n)| *n).fold(f64::INFINITY, f64::min);
    let max = numeric
        .iter()
        .map(|(_, n)| *n)
        .fold(f64::NEG_INFINITY, f64::max);
    let consensus = numeric.iter().all(|(_, n)| *n == numeric[0].1);

    Some(NumericSummary {
        average,
        min,
        max,
        consensus,
        mode: unique_mode(&numeric),
    })
}

/// The most frequent numeric value if no other value is equally frequent,
/// reported as the first card string that carried it.
fn unique_mode(numeric: &[(&Vote, f64)]) -> Option<String> {
    let mut counts: Vec<(f64, usize, &str)> = Vec::new();
    for (vote, n) in numeric {
        match counts.iter_mut().find(|(value, _, _)| value == n) {
            Some(entry) => entry.1 += 1,
            None => counts.push((*n, 1, vote.value.as_str())),
        }
    }
    let top = counts.iter().map(|(_, c, _)| *c).max()?;
    let mut leaders = counts.iter().filter(|(_, c, _)| *c == top);
    let (_, _, card) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some((*card).to_owned())
}

fn tally_special(votes: &[&Vote]) -> Option<SpecialCardTally> {
    let tally = SpecialCardTally {
        unknown: votes.iter().filter(|v| v.is_unknown()).count(),
        coffee: votes.iter().filter(|v| v.is_coffee_break()).count(),
    };
    votes.iter().any(|v| v.is_special()).then_some(tally)
}
