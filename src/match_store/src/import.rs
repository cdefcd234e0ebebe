//! JSON fixture import.
//!
//! A fixture file lists seasons and matches:
//!
//! ```json
//! {
//!   "seasons": [
//!     { "name": "2024-2025", "start_date": "2024-08-16", "end_date": "2025-05-25", "current": true }
//!   ],
//!   "matches": [
//!     { "season": "2024-2025", "kickoff": "2024-08-17 15:00",
//!       "home_team": "Ipswich", "away_team": "Liverpool",
//!       "home_goals": 0, "away_goals": 2, "half_time_result": "D",
//!       "home_shots_on_target": 2, "away_shots_on_target": 5, "referee": "T Robinson" }
//!   ]
//! }
//! ```
//!
//! Kickoffs are RFC3339 or naive local times in the zone passed to
//! [`load_matches_json`]. A missing `result` is derived from the score. Seasons
//! that already exist are reused by name.

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use diesel::SqliteConnection;
use serde::Deserialize;
use tracing::info;

use crate::models::{MatchStats, NewMatch, ResultCode};
use crate::{repo, seasons, tz};

/// One season entry of a fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonRecord {
    /// Unique season name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Flag this season as current after import.
    #[serde(default)]
    pub current: bool,
}

/// One match entry of a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRecord {
    /// Season name; must be listed in the file or already stored.
    pub season: String,
    /// RFC3339 or naive local kickoff.
    pub kickoff: String,
    /// Home team.
    pub home_team: String,
    /// Away team.
    pub away_team: String,
    /// Home goals.
    #[serde(default)]
    pub home_goals: Option<u32>,
    /// Away goals.
    #[serde(default)]
    pub away_goals: Option<u32>,
    /// Full-time result; derived from the score when absent.
    #[serde(default)]
    pub result: Option<ResultCode>,
    /// Half-time result.
    #[serde(default)]
    pub half_time_result: Option<ResultCode>,
    /// Statistics, flattened into the record.
    #[serde(flatten)]
    pub stats: MatchStats,
    /// Referee.
    #[serde(default)]
    pub referee: Option<String>,
}

/// A parsed fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    /// Seasons to create.
    #[serde(default)]
    pub seasons: Vec<SeasonRecord>,
    /// Matches to insert.
    pub matches: Vec<MatchRecord>,
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Seasons newly created.
    pub seasons_created: usize,
    /// Matches inserted.
    pub matches_inserted: usize,
    /// Season flagged current by the file, if any.
    pub current_season: Option<String>,
}

/// Parses fixture JSON.
pub fn parse_fixture(json: &str) -> anyhow::Result<Fixture> {
    serde_json::from_str(json).context("parse fixture json")
}

/// Reads a fixture file and writes it into the store.
pub fn load_matches_json(
    conn: &mut SqliteConnection,
    path: &Path,
    kickoff_tz: Tz,
) -> anyhow::Result<ImportReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read fixture {}", path.display()))?;
    let fixture = parse_fixture(&text).with_context(|| format!("in {}", path.display()))?;
    import_fixture(conn, &fixture, kickoff_tz)
}

/// Writes an already parsed fixture into the store.
pub fn import_fixture(
    conn: &mut SqliteConnection,
    fixture: &Fixture,
    kickoff_tz: Tz,
) -> anyhow::Result<ImportReport> {
    let mut report = ImportReport::default();

    for record in &fixture.seasons {
        if seasons::find_season(conn, &record.name)?.is_none() {
            seasons::insert_season(conn, &record.name, record.start_date, record.end_date)?;
            report.seasons_created += 1;
        }
    }

    let mut new_matches = Vec::with_capacity(fixture.matches.len());
    for (idx, record) in fixture.matches.iter().enumerate() {
        let season = seasons::find_season(conn, &record.season)?
            .with_context(|| format!("match #{idx}: unknown season {}", record.season))?;
        let kickoff = tz::parse_kickoff(&record.kickoff, kickoff_tz)
            .with_context(|| format!("match #{idx}"))?;
        let result = record.result.or_else(|| {
            Some(ResultCode::from_score(record.home_goals?, record.away_goals?))
        });
        new_matches.push(NewMatch {
            season_id: season.id,
            kickoff,
            home_team: record.home_team.trim().to_string(),
            away_team: record.away_team.trim().to_string(),
            home_goals: record.home_goals,
            away_goals: record.away_goals,
            result,
            half_time_result: record.half_time_result,
            stats: record.stats.clone(),
            referee: record.referee.as_deref().map(str::trim).map(str::to_string),
        });
    }
    report.matches_inserted = repo::insert_matches(conn, &new_matches)?.len();

    if let Some(current) = fixture.seasons.iter().rev().find(|s| s.current) {
        seasons::set_current_season(conn, &current.name)?;
        report.current_season = Some(current.name.clone());
    }

    info!(
        seasons = report.seasons_created,
        matches = report.matches_inserted,
        "fixture imported"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flattened_stats_and_optional_fields() {
        let fixture = parse_fixture(
            r#"{
                "matches": [
                    { "season": "2024-2025", "kickoff": "2024-08-17 15:00",
                      "home_team": "Ipswich", "away_team": "Liverpool",
                      "home_goals": 0, "away_goals": 2,
                      "home_shots_on_target": 2, "away_yellow_cards": 1 }
                ]
            }"#,
        )
        .unwrap();
        assert!(fixture.seasons.is_empty());
        let m = &fixture.matches[0];
        assert_eq!(m.stats.home_shots_on_target, Some(2));
        assert_eq!(m.stats.away_yellow_cards, Some(1));
        assert_eq!(m.stats.home_shots, None);
        assert_eq!(m.result, None);
        assert_eq!(m.referee, None);
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        assert!(parse_fixture(r#"{ "matches": [], "teams": [] }"#).is_err());
    }

    #[test]
    fn rejects_bad_result_code() {
        let err = parse_fixture(
            r#"{ "matches": [ { "season": "s", "kickoff": "2024-08-17 15:00",
                 "home_team": "A", "away_team": "B", "result": "W" } ] }"#,
        );
        assert!(err.is_err());
    }
}
