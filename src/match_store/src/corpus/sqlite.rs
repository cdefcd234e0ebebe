//! SQLite-backed corpus.
//!
//! Every call opens its own tuned connection on the blocking pool and drops it when
//! done, so concurrent detectors never share a connection. WAL mode keeps these
//! readers off the importer's back.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use async_trait::async_trait;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use super::{Corpus, CorpusError, MatchScan, ScanOrder, StatField};
use crate::db::connection::connect_sqlite;
use crate::models::{Match, MatchRow};
use crate::schema::matches::dsl as m;

/// Corpus reading the `matches` table of a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteCorpus {
    database_url: String,
}

impl SqliteCorpus {
    /// Corpus over the database at `database_url` (a file path or `file:` URL).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The database this corpus reads.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Runs `scan` on an open connection. Rows that fail to convert are skipped.
pub fn load_matches(
    conn: &mut SqliteConnection,
    scan: &MatchScan,
) -> Result<Vec<Match>, diesel::result::Error> {
    let mut query = m::matches.select(MatchRow::as_select()).into_boxed();

    if let Some(season_id) = scan.season_id {
        query = query.filter(m::season_id.eq(season_id));
    }
    if let Some(team) = &scan.team {
        query = query.filter(m::home_team.eq(team.clone()).or(m::away_team.eq(team.clone())));
    }
    if let Some(referee) = &scan.referee {
        query = query.filter(m::referee.eq(referee.clone()));
    }
    for field in &scan.required {
        query = match field {
            StatField::Goals => {
                query.filter(m::home_goals.is_not_null().and(m::away_goals.is_not_null()))
            }
            StatField::Result => query.filter(m::result.is_not_null()),
            StatField::HalfTimeResult => query.filter(m::half_time_result.is_not_null()),
            StatField::Shots => {
                query.filter(m::home_shots.is_not_null().and(m::away_shots.is_not_null()))
            }
            StatField::ShotsOnTarget => query.filter(
                m::home_shots_on_target
                    .is_not_null()
                    .and(m::away_shots_on_target.is_not_null()),
            ),
            StatField::Cards => query.filter(
                m::home_yellow_cards
                    .is_not_null()
                    .and(m::away_yellow_cards.is_not_null())
                    .and(m::home_red_cards.is_not_null())
                    .and(m::away_red_cards.is_not_null()),
            ),
            StatField::Referee => query.filter(m::referee.is_not_null()),
        };
    }

    query = match scan.order {
        ScanOrder::KickoffDesc => query.order((m::kickoff.desc(), m::id.desc())),
        ScanOrder::KickoffAsc => query.order((m::kickoff.asc(), m::id.asc())),
    };
    if let Some(limit) = scan.limit {
        query = query.limit(i64::from(limit.get()));
    }

    let rows: Vec<MatchRow> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Match::try_from(row) {
                Ok(found) => Some(found),
                Err(e) => {
                    debug!(match_id = id, error = %e, "skipping malformed match row");
                    None
                }
            }
        })
        .collect())
}

/// Distinct team names on an open connection, sorted, at most `limit`.
pub fn load_teams(
    conn: &mut SqliteConnection,
    limit: Option<NonZeroU32>,
) -> Result<Vec<String>, diesel::result::Error> {
    let home: Vec<String> = m::matches.select(m::home_team).distinct().load(conn)?;
    let away: Vec<String> = m::matches.select(m::away_team).distinct().load(conn)?;

    let names: BTreeSet<String> = home.into_iter().chain(away).collect();
    let cap = limit.map_or(usize::MAX, |l| l.get() as usize);
    Ok(names.into_iter().take(cap).collect())
}

#[async_trait]
impl Corpus for SqliteCorpus {
    async fn scan(&self, scan: &MatchScan) -> Result<Vec<Match>, CorpusError> {
        let url = self.database_url.clone();
        let scan = scan.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Match>, CorpusError> {
            let mut conn = connect_sqlite(&url).map_err(CorpusError::Connect)?;
            Ok(load_matches(&mut conn, &scan)?)
        })
        .await?
    }

    async fn teams(&self, limit: Option<NonZeroU32>) -> Result<Vec<String>, CorpusError> {
        let url = self.database_url.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, CorpusError> {
            let mut conn = connect_sqlite(&url).map_err(CorpusError::Connect)?;
            Ok(load_teams(&mut conn, limit)?)
        })
        .await?
    }
}
