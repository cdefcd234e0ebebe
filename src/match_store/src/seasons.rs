//! Season bookkeeping.
//!
//! The "current season" flag is process-wide context for query generation, so it
//! must be unambiguous: a partial unique index allows one flagged row, and
//! [`set_current_season`] moves the flag inside a single `BEGIN IMMEDIATE`.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use crate::models::{NewSeasonRow, Season, SeasonRow};
use crate::schema::seasons::dsl as s;

const DATE_FMT: &str = "%Y-%m-%d";

/// Inserts a non-current season and returns its id.
pub fn insert_season(
    conn: &mut SqliteConnection,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> anyhow::Result<i32> {
    let name = name.trim();
    if name.is_empty() {
        bail!("season name is empty");
    }
    if start_date > end_date {
        bail!("season {name} ends ({end_date}) before it starts ({start_date})");
    }

    let row = NewSeasonRow {
        name,
        start_date: start_date.format(DATE_FMT).to_string(),
        end_date: end_date.format(DATE_FMT).to_string(),
        is_current: false,
    };
    let id = diesel::insert_into(s::seasons)
        .values(&row)
        .returning(s::id)
        .get_result(conn)
        .with_context(|| format!("insert season {name}"))?;
    Ok(id)
}

/// Looks a season up by name.
pub fn find_season(conn: &mut SqliteConnection, name: &str) -> anyhow::Result<Option<Season>> {
    let row = s::seasons
        .filter(s::name.eq(name.trim()))
        .select(SeasonRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Season::try_from).transpose()?)
}

/// The season flagged current, if any.
pub fn current_season(conn: &mut SqliteConnection) -> anyhow::Result<Option<Season>> {
    let row = s::seasons
        .filter(s::is_current.eq(true))
        .select(SeasonRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Season::try_from).transpose()?)
}

/// Makes `name` the only current season and returns it.
pub fn set_current_season(conn: &mut SqliteConnection, name: &str) -> anyhow::Result<Season> {
    let season = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let Some(mut season) = find_season(conn, name)? else {
            bail!("unknown season {name}");
        };
        // clear first: the partial unique index rejects two flagged rows
        diesel::update(s::seasons.filter(s::is_current.eq(true)))
            .set(s::is_current.eq(false))
            .execute(conn)?;
        diesel::update(s::seasons.find(season.id))
            .set(s::is_current.eq(true))
            .execute(conn)?;
        season.is_current = true;
        Ok(season)
    })?;

    info!(season = %season.name, "current season set");
    Ok(season)
}
