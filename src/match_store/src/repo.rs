//! Write path for matches.
//!
//! Matches are inserted once, get their result exactly once via [`complete_match`],
//! and are never touched afterwards. Both operations validate before writing and
//! run inside an immediate transaction.

use diesel::SqliteConnection;
use diesel::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::models::{MatchStats, MatchValidationError, NewMatch, NewMatchRow, ResultCode};
use crate::schema::matches::dsl as m;

/// Errors raised by the match repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The record failed [`NewMatch::validate`].
    #[error("invalid match {label}: {source}")]
    Invalid {
        /// `"Home vs Away"` of the offending record.
        label: String,
        /// What was wrong.
        source: MatchValidationError,
    },
    /// No match with this id.
    #[error("match {0} not found")]
    NotFound(i32),
    /// The match already has a result; results are written once.
    #[error("match {0} already has a result")]
    AlreadyCompleted(i32),
    /// Database failure.
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

/// The final whistle: everything [`complete_match`] records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalScore {
    /// Home goals.
    pub home_goals: u32,
    /// Away goals.
    pub away_goals: u32,
    /// Half-time result, if known.
    pub half_time_result: Option<ResultCode>,
    /// Match statistics; absent fields stay null.
    pub stats: MatchStats,
    /// Referee, if not recorded at insert time.
    pub referee: Option<String>,
}

/// Inserts `matches` in one transaction and returns their ids in input order.
///
/// Every record is validated first; one bad record rejects the whole batch.
pub fn insert_matches(
    conn: &mut SqliteConnection,
    matches: &[NewMatch],
) -> Result<Vec<i32>, RepoError> {
    for record in matches {
        record.validate().map_err(|source| RepoError::Invalid {
            label: format!("{} vs {}", record.home_team, record.away_team),
            source,
        })?;
    }

    let ids = conn.immediate_transaction::<_, RepoError, _>(|conn| {
        let mut ids = Vec::with_capacity(matches.len());
        for record in matches {
            let row = NewMatchRow::from(record);
            let id: i32 = diesel::insert_into(m::matches)
                .values(&row)
                .returning(m::id)
                .get_result(conn)?;
            ids.push(id);
        }
        Ok(ids)
    })?;

    info!(inserted = ids.len(), "matches inserted");
    Ok(ids)
}

/// Records the result of match `match_id`.
///
/// Only succeeds while the stored result is null. The result code is derived from
/// the score, so the stored row always satisfies [`crate::models::Match::validate`].
pub fn complete_match(
    conn: &mut SqliteConnection,
    match_id: i32,
    score: &FinalScore,
) -> Result<(), RepoError> {
    let result = ResultCode::from_score(score.home_goals, score.away_goals);
    let count = |v: Option<u32>| v.and_then(|n| i32::try_from(n).ok());
    let s = &score.stats;

    conn.immediate_transaction::<_, RepoError, _>(|conn| {
        let existing: Option<Option<String>> = m::matches
            .find(match_id)
            .select(m::result)
            .first(conn)
            .optional()?;
        match existing {
            None => return Err(RepoError::NotFound(match_id)),
            Some(Some(_)) => return Err(RepoError::AlreadyCompleted(match_id)),
            Some(None) => {}
        }

        let target = m::matches.find(match_id).filter(m::result.is_null());
        diesel::update(target)
            .set((
                m::home_goals.eq(count(Some(score.home_goals))),
                m::away_goals.eq(count(Some(score.away_goals))),
                m::result.eq(Some(result.as_code())),
                m::half_time_result.eq(score.half_time_result.map(ResultCode::as_code)),
                m::home_shots.eq(count(s.home_shots)),
                m::away_shots.eq(count(s.away_shots)),
                m::home_shots_on_target.eq(count(s.home_shots_on_target)),
                m::away_shots_on_target.eq(count(s.away_shots_on_target)),
                m::home_corners.eq(count(s.home_corners)),
                m::away_corners.eq(count(s.away_corners)),
                m::home_fouls.eq(count(s.home_fouls)),
                m::away_fouls.eq(count(s.away_fouls)),
                m::home_yellow_cards.eq(count(s.home_yellow_cards)),
                m::away_yellow_cards.eq(count(s.away_yellow_cards)),
                m::home_red_cards.eq(count(s.home_red_cards)),
                m::away_red_cards.eq(count(s.away_red_cards)),
            ))
            .execute(conn)?;

        if let Some(referee) = &score.referee {
            diesel::update(m::matches.find(match_id).filter(m::referee.is_null()))
                .set(m::referee.eq(referee))
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!(match_id, result = result.as_code(), "match completed");
    Ok(())
}
