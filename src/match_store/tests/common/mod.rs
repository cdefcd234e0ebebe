#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use match_store::db::{connection, migrate};
use match_store::models::{MatchStats, NewMatch, ResultCode};
use match_store::seasons;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/matches.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("matches.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn seed_season(conn: &mut SqliteConnection, name: &str) -> i32 {
    seasons::insert_season(
        conn,
        name,
        NaiveDate::from_ymd_opt(2024, 8, 16).unwrap(),
        NaiveDate::from_ymd_opt(2025, 5, 25).unwrap(),
    )
    .expect("insert season")
}

pub fn kickoff(month: u32, day: u32) -> DateTime<Utc> {
    let year = if month >= 8 { 2024 } else { 2025 };
    Utc.with_ymd_and_hms(year, month, day, 14, 0, 0).unwrap()
}

pub fn played(
    season_id: i32,
    kickoff: DateTime<Utc>,
    home: &str,
    away: &str,
    home_goals: u32,
    away_goals: u32,
) -> NewMatch {
    NewMatch {
        season_id,
        kickoff,
        home_team: home.into(),
        away_team: away.into(),
        home_goals: Some(home_goals),
        away_goals: Some(away_goals),
        result: Some(ResultCode::from_score(home_goals, away_goals)),
        half_time_result: None,
        stats: MatchStats::default(),
        referee: None,
    }
}

pub fn scheduled(season_id: i32, kickoff: DateTime<Utc>, home: &str, away: &str) -> NewMatch {
    NewMatch {
        home_goals: None,
        away_goals: None,
        result: None,
        ..played(season_id, kickoff, home, away, 0, 0)
    }
}
