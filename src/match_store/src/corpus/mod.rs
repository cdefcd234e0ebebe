//! Read-only access to the match corpus.
//!
//! The engine never talks to a database directly. It describes what it wants with a
//! [`MatchScan`] and hands it to a [`Corpus`]. Two implementations ship:
//! - [`sqlite::SqliteCorpus`]: Diesel over a short-lived SQLite connection per call,
//!   run on Tokio's blocking pool;
//! - [`memory::MemoryCorpus`]: an in-process vector, for fixtures and tests.
//!
//! Both return matches ordered by kickoff with ties broken by id, so callers see
//! the same sequence for the same data.

pub mod memory;
pub mod sqlite;

use std::num::NonZeroU32;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Match;

pub use memory::MemoryCorpus;
pub use sqlite::SqliteCorpus;

/// Errors surfaced by corpus implementations.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The store could not be opened.
    #[error("failed to open match store: {0}")]
    Connect(#[source] anyhow::Error),
    /// A query failed.
    #[error("match store query failed: {0}")]
    Query(#[from] diesel::result::Error),
    /// The blocking worker panicked or was cancelled.
    #[error("corpus worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// A group of columns a scan can require to be non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    /// Home and away goals.
    Goals,
    /// Full-time result code.
    Result,
    /// Half-time result code.
    HalfTimeResult,
    /// Home and away shots.
    Shots,
    /// Home and away shots on target.
    ShotsOnTarget,
    /// Yellow and red cards of both sides.
    Cards,
    /// Referee name.
    Referee,
}

impl StatField {
    /// Whether `m` carries every column of this group.
    pub fn is_present(self, m: &Match) -> bool {
        let s = &m.stats;
        match self {
            StatField::Goals => m.home_goals.is_some() && m.away_goals.is_some(),
            StatField::Result => m.result.is_some(),
            StatField::HalfTimeResult => m.half_time_result.is_some(),
            StatField::Shots => s.home_shots.is_some() && s.away_shots.is_some(),
            StatField::ShotsOnTarget => {
                s.home_shots_on_target.is_some() && s.away_shots_on_target.is_some()
            }
            StatField::Cards => s.total_cards().is_some(),
            StatField::Referee => m.referee.is_some(),
        }
    }
}

/// Kickoff ordering of a scan. Ties are broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Most recent first.
    #[default]
    KickoffDesc,
    /// Oldest first.
    KickoffAsc,
}

/// Filter, order and limit for one corpus read.
///
/// ```
/// use std::num::NonZeroU32;
/// use match_store::corpus::{MatchScan, StatField};
///
/// let scan = MatchScan::new()
///     .team("Arsenal")
///     .require(StatField::Result)
///     .limit(NonZeroU32::new(10).unwrap());
/// assert_eq!(scan.team.as_deref(), Some("Arsenal"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScan {
    /// Only matches of this season.
    pub season_id: Option<i32>,
    /// Only matches where this team played home or away.
    pub team: Option<String>,
    /// Only matches handled by this referee.
    pub referee: Option<String>,
    /// Column groups that must be non-null.
    pub required: Vec<StatField>,
    /// Kickoff order.
    pub order: ScanOrder,
    /// Maximum number of matches returned.
    pub limit: Option<NonZeroU32>,
}

impl MatchScan {
    /// An unfiltered, most-recent-first scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one season.
    pub fn season(mut self, season_id: i32) -> Self {
        self.season_id = Some(season_id);
        self
    }

    /// Restrict to one team, home or away.
    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Restrict to one referee.
    pub fn referee(mut self, referee: impl Into<String>) -> Self {
        self.referee = Some(referee.into());
        self
    }

    /// Require a column group to be present.
    pub fn require(mut self, field: StatField) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    /// Set the kickoff order.
    pub fn order(mut self, order: ScanOrder) -> Self {
        self.order = order;
        self
    }

    /// Cap the number of matches returned.
    pub fn limit(mut self, limit: NonZeroU32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `m` passes every filter of this scan (ordering and limit aside).
    pub fn accepts(&self, m: &Match) -> bool {
        if self.season_id.is_some_and(|id| id != m.season_id) {
            return false;
        }
        if let Some(team) = &self.team {
            if &m.home_team != team && &m.away_team != team {
                return false;
            }
        }
        if let Some(referee) = &self.referee {
            if m.referee.as_ref() != Some(referee) {
                return false;
            }
        }
        self.required.iter().all(|f| f.is_present(m))
    }
}

/// Read-only view of the match corpus.
#[async_trait]
pub trait Corpus: Send + Sync {
    /// Matches passing `scan`, ordered and limited as it asks.
    async fn scan(&self, scan: &MatchScan) -> Result<Vec<Match>, CorpusError>;

    /// Distinct team names (home or away), sorted by name, at most `limit`.
    async fn teams(&self, limit: Option<NonZeroU32>) -> Result<Vec<String>, CorpusError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStats, ResultCode};
    use chrono::{TimeZone, Utc};

    fn sample() -> Match {
        Match {
            id: 3,
            season_id: 2,
            kickoff: Utc.with_ymd_and_hms(2024, 9, 1, 15, 30, 0).unwrap(),
            home_team: "Chelsea".into(),
            away_team: "Arsenal".into(),
            home_goals: Some(1),
            away_goals: Some(1),
            result: Some(ResultCode::Draw),
            half_time_result: None,
            stats: MatchStats {
                home_shots: Some(12),
                away_shots: Some(9),
                ..MatchStats::default()
            },
            referee: Some("A Taylor".into()),
        }
    }

    #[test]
    fn empty_scan_accepts_everything() {
        assert!(MatchScan::new().accepts(&sample()));
    }

    #[test]
    fn team_filter_matches_either_side() {
        assert!(MatchScan::new().team("Arsenal").accepts(&sample()));
        assert!(MatchScan::new().team("Chelsea").accepts(&sample()));
        assert!(!MatchScan::new().team("Everton").accepts(&sample()));
    }

    #[test]
    fn required_fields_reject_partial_rows() {
        let m = sample();
        assert!(MatchScan::new().require(StatField::Shots).accepts(&m));
        assert!(!MatchScan::new().require(StatField::HalfTimeResult).accepts(&m));
        assert!(!MatchScan::new().require(StatField::Cards).accepts(&m));
    }

    #[test]
    fn require_does_not_duplicate() {
        let scan = MatchScan::new()
            .require(StatField::Goals)
            .require(StatField::Goals);
        assert_eq!(scan.required, vec![StatField::Goals]);
    }

    #[test]
    fn season_and_referee_filters() {
        let m = sample();
        assert!(MatchScan::new().season(2).referee("A Taylor").accepts(&m));
        assert!(!MatchScan::new().season(1).accepts(&m));
        assert!(!MatchScan::new().referee("M Oliver").accepts(&m));
    }
}
