//! Current winning and losing runs per team.

use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, MatchScan, ResultCode, ScanOrder, StatField};
use tracing::{debug, warn};

use crate::error::DetectorError;
use crate::patterns::detectors::{slug, sql_quote};
use crate::patterns::{Detector, Pattern, PatternKind, PatternSource, Significance, kind_slug};

/// Fewer completed matches than this and a team is not judged.
pub const MIN_MATCHES: usize = 5;
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

/// `team`'s outcome in `m`, if it played and the result is in.
pub fn outcome_for(team: &str, m: &Match) -> Option<Outcome> {
    let result = m.result?;
    let home = if m.home_team == team {
        true
    } else if m.away_team == team {
        false
    } else {
        return None;
    };
    Some(match (result, home) {
        (ResultCode::Draw, _) => Outcome::Draw,
        (ResultCode::Home, true) | (ResultCode::Away, false) => Outcome::Win,
        _ => Outcome::Loss,
    })
}

/// Length of the run at the head of `outcomes` (most recent first). A draw
/// neither starts nor extends a run.
pub fn current_run(outcomes: &[Outcome]) -> Option<(Outcome, usize)> {
    let first = *outcomes.first()?;
    if first == Outcome::Draw {
        return None;
    }
    Some((first, outcomes.iter().take_while(|o| **o == first).count()))
}

pub fn significance_for(run: usize) -> Significance {
    match run {
        5.. => Significance::VeryHigh,
        4 => Significance::High,
        _ => Significance::Medium,
    }
}

/// `recent` holds the team's latest completed matches, most recent first.
pub fn evaluate(team: &str, recent: &[Match]) -> Option<Pattern> {
    let played: Vec<(i32, Outcome)> = recent
        .iter()
        .filter_map(|m| outcome_for(team, m).map(|o| (m.id, o)))
        .collect();
    if played.len() < MIN_MATCHES {
        return None;
    }

    let outcomes: Vec<Outcome> = played.iter().map(|(_, o)| *o).collect();
    let (outcome, run) = current_run(&outcomes)?;
    if run < MIN_RUN {
        return None;
    }

    let (kind, word) = match outcome {
        Outcome::Win => (PatternKind::WinStreak, "won"),
        _ => (PatternKind::LossStreak, "lost"),
    };
    let match_ids: Vec<i32> = played[..run].iter().map(|(id, _)| *id).collect();
    let quoted = sql_quote(team);

    Some(
        Pattern {
            id: format!("{}-{}-{}", kind_slug(kind), slug(team), match_ids[0]),
            kind,
            title: format!("{team} have {word} {run} in a row"),
            description: format!("{team} {word} each of their last {run} completed matches."),
            significance: significance_for(run),
            source: PatternSource::Team {
                name: team.to_string(),
                match_ids,
            },
            metrics: Default::default(),
            query: Some(format!(
                "SELECT * FROM matches WHERE (home_team = {quoted} OR away_team = {quoted}) \
                 AND result IS NOT NULL ORDER BY kickoff DESC LIMIT {run};"
            )),
        }
        .metric("run_length", run as f64),
    )
}

pub struct StreakDetector {
    team_cap: NonZeroU32,
    window: NonZeroU32,
}

impl StreakDetector {
    pub fn new(team_cap: NonZeroU32, window: NonZeroU32) -> Self {
        Self { team_cap, window }
    }
}

#[async_trait]
impl Detector for StreakDetector {
    fn name(&self) -> &'static str {
        "streak"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let teams = corpus.teams(Some(self.team_cap)).await?;
        let mut found = Vec::new();
        for team in &teams {
            let scan = MatchScan::new()
                .team(team.as_str())
                .require(StatField::Result)
                .order(ScanOrder::KickoffDesc)
                .limit(self.window);
            let recent = match corpus.scan(&scan).await {
                Ok(recent) => recent,
                Err(e) => {
                    warn!(team = %team, error = %e, "team scan failed, skipping team");
                    continue;
                }
            };
            match evaluate(team, &recent) {
                Some(pattern) => found.push(pattern),
                None => debug!(team = %team, matches = recent.len(), "no streak"),
            }
        }
        Ok(found)
    }
}
