//! Kickoff time parsing.
//!
//! Fixture feeds publish kickoffs either as RFC3339 instants or as naive local
//! wall-clock times (English league data is in `Europe/London`). Everything stored
//! is RFC3339 UTC with millisecond precision, so string order equals time order.
//!
//! - [`parse_ts_to_utc`]: RFC3339 with offset -> UTC.
//! - [`from_local_naive_with_policy`]: naive local time + IANA zone -> UTC, with a
//!   [`DstPolicy`] for clock-change edges.
//! - [`parse_kickoff`]: accepts either form, the edge used by fixture import.

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Naive formats accepted for local kickoff times.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// RFC3339 with offset -> UTC.
///
/// "2024-08-17T15:00:00+01:00" -> "2024-08-17T14:00:00Z"
pub fn parse_ts_to_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad rfc3339: {s}"))?;
    Ok(dt.with_timezone(&Utc))
}

/// How to resolve local times that fall on a clock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// For ambiguous times pick the earlier instant (the summer-time occurrence).
    PreferEarliest,
    /// For nonexistent times step forward a minute at a time, for at most two hours.
    ShiftForward,
}

/// Convert a naive local timestamp to UTC in the given zone.
///
/// Single mappings are returned as is. Ambiguous times resolve only under
/// [`DstPolicy::PreferEarliest`]; nonexistent times only under
/// [`DstPolicy::ShiftForward`]. Every other combination is an error.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> anyhow::Result<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(earliest, _) if policy == DstPolicy::PreferEarliest => {
            Ok(earliest.with_timezone(&Utc))
        }
        Ambiguous(..) => Err(anyhow::anyhow!("ambiguous local time {naive} in {tz}")),
        None if policy == DstPolicy::ShiftForward => {
            let mut t = naive;
            for _ in 0..120 {
                t += chrono::Duration::minutes(1);
                if let Single(dt) = tz.from_local_datetime(&t) {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            Err(anyhow::anyhow!("nonexistent local time {naive} in {tz}"))
        }
        None => Err(anyhow::anyhow!("nonexistent local time {naive} in {tz}")),
    }
}

/// Parse a kickoff given either as RFC3339 or as a naive local time in `tz`.
///
/// Local times on a clock change are resolved leniently: ambiguous times take the
/// earlier instant and skipped times move to the first valid minute. Kickoffs are
/// never scheduled in those windows, so this only matters for bad feed data.
pub fn parse_kickoff(s: &str, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .with_context(|| format!("unrecognised kickoff: {s}"))?;

    match from_local_naive_with_policy(naive, tz, DstPolicy::PreferEarliest) {
        Ok(dt) => Ok(dt),
        Err(_) => from_local_naive_with_policy(naive, tz, DstPolicy::ShiftForward),
    }
}

/// Format a UTC datetime as an RFC3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
