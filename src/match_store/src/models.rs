//! Match and season models.
//!
//! Two layers live here:
//! - domain types ([`Match`], [`NewMatch`], [`Season`], [`ResultCode`], [`MatchStats`])
//!   used by the corpus and the engine;
//! - Diesel row types ([`MatchRow`], [`NewMatchRow`], [`SeasonRow`]) mirroring
//!   [`crate::schema`]. Timestamps are RFC3339 UTC strings in the database and
//!   result codes are the single letters `H`, `A`, `D`.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{matches, seasons};
use crate::tz;

/// Full-time or half-time outcome of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// Home side won (`H`).
    #[serde(rename = "H")]
    Home,
    /// Away side won (`A`).
    #[serde(rename = "A")]
    Away,
    /// Draw (`D`).
    #[serde(rename = "D")]
    Draw,
}

impl ResultCode {
    /// Single-letter storage code.
    pub fn as_code(self) -> &'static str {
        match self {
            ResultCode::Home => "H",
            ResultCode::Away => "A",
            ResultCode::Draw => "D",
        }
    }

    /// Parses a storage code; anything but `H`, `A`, `D` is rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(ResultCode::Home),
            "A" => Some(ResultCode::Away),
            "D" => Some(ResultCode::Draw),
            _ => None,
        }
    }

    /// The code implied by a final score.
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => ResultCode::Home,
            std::cmp::Ordering::Less => ResultCode::Away,
            std::cmp::Ordering::Equal => ResultCode::Draw,
        }
    }
}

/// Per-side match statistics. Every field is optional: feeds routinely omit some.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStats {
    /// Home shots.
    pub home_shots: Option<u32>,
    /// Away shots.
    pub away_shots: Option<u32>,
    /// Home shots on target.
    pub home_shots_on_target: Option<u32>,
    /// Away shots on target.
    pub away_shots_on_target: Option<u32>,
    /// Home corners.
    pub home_corners: Option<u32>,
    /// Away corners.
    pub away_corners: Option<u32>,
    /// Home fouls committed.
    pub home_fouls: Option<u32>,
    /// Away fouls committed.
    pub away_fouls: Option<u32>,
    /// Home yellow cards.
    pub home_yellow_cards: Option<u32>,
    /// Away yellow cards.
    pub away_yellow_cards: Option<u32>,
    /// Home red cards.
    pub home_red_cards: Option<u32>,
    /// Away red cards.
    pub away_red_cards: Option<u32>,
}

impl MatchStats {
    /// Combined shots of both sides, if both are known and the sum fits.
    pub fn total_shots(&self) -> Option<u32> {
        self.home_shots?.checked_add(self.away_shots?)
    }

    /// Yellow plus red cards of both sides, if all four counts are known.
    /// A sum that overflows is treated like a missing count.
    pub fn total_cards(&self) -> Option<u32> {
        [
            self.home_yellow_cards?,
            self.away_yellow_cards?,
            self.home_red_cards?,
            self.away_red_cards?,
        ]
        .into_iter()
        .try_fold(0u32, u32::checked_add)
    }
}

/// Reasons a match record is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchValidationError {
    /// A team cannot play itself.
    #[error("home and away team are both {0:?}")]
    SameTeam(String),
    /// Team names must be non-blank.
    #[error("team name is empty")]
    EmptyTeam,
    /// Only one side of the score is present.
    #[error("score is incomplete")]
    PartialScore,
    /// A result code is set without a score.
    #[error("result {0:?} set without a score")]
    ResultWithoutScore(ResultCode),
    /// The result code disagrees with the score.
    #[error("result {result:?} contradicts score {home_goals}-{away_goals}")]
    ResultMismatch {
        /// Stored result.
        result: ResultCode,
        /// Home goals.
        home_goals: u32,
        /// Away goals.
        away_goals: u32,
    },
}

fn check_outcome(
    home_team: &str,
    away_team: &str,
    home_goals: Option<u32>,
    away_goals: Option<u32>,
    result: Option<ResultCode>,
) -> Result<(), MatchValidationError> {
    if home_team.trim().is_empty() || away_team.trim().is_empty() {
        return Err(MatchValidationError::EmptyTeam);
    }
    if home_team == away_team {
        return Err(MatchValidationError::SameTeam(home_team.to_string()));
    }
    match (home_goals, away_goals, result) {
        (Some(_), None, _) | (None, Some(_), _) => Err(MatchValidationError::PartialScore),
        (None, None, Some(r)) => Err(MatchValidationError::ResultWithoutScore(r)),
        (Some(h), Some(a), Some(r)) if ResultCode::from_score(h, a) != r => {
            Err(MatchValidationError::ResultMismatch {
                result: r,
                home_goals: h,
                away_goals: a,
            })
        }
        _ => Ok(()),
    }
}

/// A stored match as seen by the corpus and the detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Database identifier.
    pub id: i32,
    /// Owning season.
    pub season_id: i32,
    /// Kickoff instant.
    pub kickoff: DateTime<Utc>,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Full-time home goals; `None` until played.
    pub home_goals: Option<u32>,
    /// Full-time away goals; `None` until played.
    pub away_goals: Option<u32>,
    /// Full-time result code.
    pub result: Option<ResultCode>,
    /// Half-time result code.
    pub half_time_result: Option<ResultCode>,
    /// Per-side statistics.
    #[serde(flatten)]
    pub stats: MatchStats,
    /// Match referee.
    pub referee: Option<String>,
}

impl Match {
    /// Checks the result code against the score.
    pub fn validate(&self) -> Result<(), MatchValidationError> {
        check_outcome(
            &self.home_team,
            &self.away_team,
            self.home_goals,
            self.away_goals,
            self.result,
        )
    }

    /// Both sides' goals, if the match has been played.
    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.home_goals?, self.away_goals?))
    }

    /// Combined goals, if known.
    pub fn total_goals(&self) -> Option<u32> {
        self.score().map(|(h, a)| h + a)
    }

    /// `"Home 2-1 Away"`, or `"Home vs Away"` before the final whistle.
    pub fn fixture_label(&self) -> String {
        match self.score() {
            Some((h, a)) => format!("{} {}-{} {}", self.home_team, h, a, self.away_team),
            None => format!("{} vs {}", self.home_team, self.away_team),
        }
    }
}

/// A match that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    /// Owning season.
    pub season_id: i32,
    /// Kickoff instant.
    pub kickoff: DateTime<Utc>,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Full-time home goals.
    pub home_goals: Option<u32>,
    /// Full-time away goals.
    pub away_goals: Option<u32>,
    /// Full-time result code.
    pub result: Option<ResultCode>,
    /// Half-time result code.
    pub half_time_result: Option<ResultCode>,
    /// Per-side statistics.
    #[serde(flatten)]
    pub stats: MatchStats,
    /// Match referee.
    pub referee: Option<String>,
}

impl NewMatch {
    /// Same checks as [`Match::validate`].
    pub fn validate(&self) -> Result<(), MatchValidationError> {
        check_outcome(
            &self.home_team,
            &self.away_team,
            self.home_goals,
            self.away_goals,
            self.result,
        )
    }

    /// Attaches a database id.
    pub fn with_id(self, id: i32) -> Match {
        Match {
            id,
            season_id: self.season_id,
            kickoff: self.kickoff,
            home_team: self.home_team,
            away_team: self.away_team,
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            result: self.result,
            half_time_result: self.half_time_result,
            stats: self.stats,
            referee: self.referee,
        }
    }
}

/// A season, e.g. `2024-2025`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// Database identifier.
    pub id: i32,
    /// Unique display name.
    pub name: String,
    /// First day of the season.
    pub start_date: NaiveDate,
    /// Last day of the season.
    pub end_date: NaiveDate,
    /// Whether this is the current season. At most one season is current.
    pub is_current: bool,
}

/// A row in [`crate::schema::matches`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = matches, check_for_backend(diesel::sqlite::Sqlite))]
pub struct MatchRow {
    /// Primary key.
    pub id: i32,
    /// FK to `seasons.id`.
    pub season_id: i32,
    /// RFC3339 UTC kickoff, millisecond precision.
    pub kickoff: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Home goals.
    pub home_goals: Option<i32>,
    /// Away goals.
    pub away_goals: Option<i32>,
    /// `H` | `A` | `D`.
    pub result: Option<String>,
    /// `H` | `A` | `D`.
    pub half_time_result: Option<String>,
    /// Home shots.
    pub home_shots: Option<i32>,
    /// Away shots.
    pub away_shots: Option<i32>,
    /// Home shots on target.
    pub home_shots_on_target: Option<i32>,
    /// Away shots on target.
    pub away_shots_on_target: Option<i32>,
    /// Home corners.
    pub home_corners: Option<i32>,
    /// Away corners.
    pub away_corners: Option<i32>,
    /// Home fouls.
    pub home_fouls: Option<i32>,
    /// Away fouls.
    pub away_fouls: Option<i32>,
    /// Home yellow cards.
    pub home_yellow_cards: Option<i32>,
    /// Away yellow cards.
    pub away_yellow_cards: Option<i32>,
    /// Home red cards.
    pub home_red_cards: Option<i32>,
    /// Away red cards.
    pub away_red_cards: Option<i32>,
    /// Referee name.
    pub referee: Option<String>,
}

/// Why a stored row could not be turned into a [`Match`].
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Kickoff is not RFC3339.
    #[error("bad kickoff timestamp {0:?}")]
    Kickoff(String),
    /// Result code outside `H`/`A`/`D`.
    #[error("bad result code {0:?}")]
    ResultCode(String),
    /// Season dates are not `YYYY-MM-DD`.
    #[error("bad season date {0:?}")]
    Date(String),
}

// negative counts are treated as unknown
fn count(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

fn db_count(value: Option<u32>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn code(value: Option<String>) -> Result<Option<ResultCode>, RowError> {
    match value {
        None => Ok(None),
        Some(s) => ResultCode::from_code(&s)
            .map(Some)
            .ok_or(RowError::ResultCode(s)),
    }
}

impl TryFrom<MatchRow> for Match {
    type Error = RowError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let kickoff = tz::parse_ts_to_utc(&row.kickoff).map_err(|_| RowError::Kickoff(row.kickoff))?;
        Ok(Match {
            id: row.id,
            season_id: row.season_id,
            kickoff,
            home_team: row.home_team,
            away_team: row.away_team,
            home_goals: count(row.home_goals),
            away_goals: count(row.away_goals),
            result: code(row.result)?,
            half_time_result: code(row.half_time_result)?,
            stats: MatchStats {
                home_shots: count(row.home_shots),
                away_shots: count(row.away_shots),
                home_shots_on_target: count(row.home_shots_on_target),
                away_shots_on_target: count(row.away_shots_on_target),
                home_corners: count(row.home_corners),
                away_corners: count(row.away_corners),
                home_fouls: count(row.home_fouls),
                away_fouls: count(row.away_fouls),
                home_yellow_cards: count(row.home_yellow_cards),
                away_yellow_cards: count(row.away_yellow_cards),
                home_red_cards: count(row.home_red_cards),
                away_red_cards: count(row.away_red_cards),
            },
            referee: row.referee,
        })
    }
}

/// Insertable form of [`MatchRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatchRow<'a> {
    /// FK to `seasons.id`.
    pub season_id: i32,
    /// RFC3339 UTC kickoff.
    pub kickoff: String,
    /// Home team name.
    pub home_team: &'a str,
    /// Away team name.
    pub away_team: &'a str,
    /// Home goals.
    pub home_goals: Option<i32>,
    /// Away goals.
    pub away_goals: Option<i32>,
    /// Result code.
    pub result: Option<&'static str>,
    /// Half-time result code.
    pub half_time_result: Option<&'static str>,
    /// Home shots.
    pub home_shots: Option<i32>,
    /// Away shots.
    pub away_shots: Option<i32>,
    /// Home shots on target.
    pub home_shots_on_target: Option<i32>,
    /// Away shots on target.
    pub away_shots_on_target: Option<i32>,
    /// Home corners.
    pub home_corners: Option<i32>,
    /// Away corners.
    pub away_corners: Option<i32>,
    /// Home fouls.
    pub home_fouls: Option<i32>,
    /// Away fouls.
    pub away_fouls: Option<i32>,
    /// Home yellow cards.
    pub home_yellow_cards: Option<i32>,
    /// Away yellow cards.
    pub away_yellow_cards: Option<i32>,
    /// Home red cards.
    pub home_red_cards: Option<i32>,
    /// Away red cards.
    pub away_red_cards: Option<i32>,
    /// Referee name.
    pub referee: Option<&'a str>,
}

impl<'a> From<&'a NewMatch> for NewMatchRow<'a> {
    fn from(m: &'a NewMatch) -> Self {
        let s = &m.stats;
        NewMatchRow {
            season_id: m.season_id,
            kickoff: tz::to_rfc3339_millis(m.kickoff),
            home_team: &m.home_team,
            away_team: &m.away_team,
            home_goals: db_count(m.home_goals),
            away_goals: db_count(m.away_goals),
            result: m.result.map(ResultCode::as_code),
            half_time_result: m.half_time_result.map(ResultCode::as_code),
            home_shots: db_count(s.home_shots),
            away_shots: db_count(s.away_shots),
            home_shots_on_target: db_count(s.home_shots_on_target),
            away_shots_on_target: db_count(s.away_shots_on_target),
            home_corners: db_count(s.home_corners),
            away_corners: db_count(s.away_corners),
            home_fouls: db_count(s.home_fouls),
            away_fouls: db_count(s.away_fouls),
            home_yellow_cards: db_count(s.home_yellow_cards),
            away_yellow_cards: db_count(s.away_yellow_cards),
            home_red_cards: db_count(s.home_red_cards),
            away_red_cards: db_count(s.away_red_cards),
            referee: m.referee.as_deref(),
        }
    }
}

/// A row in [`crate::schema::seasons`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = seasons, check_for_backend(diesel::sqlite::Sqlite))]
pub struct SeasonRow {
    /// Primary key.
    pub id: i32,
    /// Unique season name.
    pub name: String,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`.
    pub end_date: String,
    /// Current-season flag.
    pub is_current: bool,
}

impl TryFrom<SeasonRow> for Season {
    type Error = RowError;

    fn try_from(row: SeasonRow) -> Result<Self, Self::Error> {
        let parse = |s: String| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| RowError::Date(s))
        };
        Ok(Season {
            id: row.id,
            name: row.name,
            start_date: parse(row.start_date)?,
            end_date: parse(row.end_date)?,
            is_current: row.is_current,
        })
    }
}

/// Insertable form of [`SeasonRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = seasons)]
pub struct NewSeasonRow<'a> {
    /// Unique season name.
    pub name: &'a str,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`.
    pub end_date: String,
    /// Always inserted as `false`; see [`crate::seasons::set_current_season`].
    pub is_current: bool,
}
