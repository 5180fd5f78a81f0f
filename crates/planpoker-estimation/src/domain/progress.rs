//! Voting progress of a story.

use chrono::{DateTime, Utc};
use planpoker_room::domain::aggregates::Participant;
use serde::Serialize;

use super::aggregates::Story;

/// How far the room is through voting on a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotingProgress {
    /// Votes cast.
    pub vote_count: usize,
    /// Online admins and participants.
    pub voter_count: usize,
    /// `round(100 * votes / voters)`, 0 without voters.
    pub progress_percent: u32,
    /// Voters still expected to vote.
    pub missing_count: usize,
    /// Every voter has voted.
    pub all_voted: bool,
    /// Seconds since voting started, up to the reveal.
    pub voting_duration_secs: Option<i64>,
}

impl VotingProgress {
    /// Computes progress from the number of votes and the room roster.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn compute(
        story: &Story,
        vote_count: usize,
        roster: &[Participant],
        now: DateTime<Utc>,
    ) -> Self {
        let voter_count = roster.iter().filter(|p| p.is_active_voter()).count();
        let progress_percent = if voter_count == 0 {
            0
        } else {
            (100.0 * vote_count as f64 / voter_count as f64).round() as u32
        };
        Self {
            vote_count,
            voter_count,
            progress_percent,
            missing_count: voter_count.saturating_sub(vote_count),
            all_voted: voter_count > 0 && vote_count == voter_count,
            voting_duration_secs: story.voting_duration_secs(now),
        }
    }
}
