//! Sides that hit the target a lot and scored little.

use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, StatField};

use crate::error::DetectorError;
use crate::patterns::detectors::recent;
use crate::patterns::{Detector, Pattern, PatternKind, Significance};

pub const MIN_SHOTS_ON_TARGET: u32 = 10;
pub const MAX_GOALS: u32 = 1;
/// Shots on target from which a finding is high rather than medium.
pub const HIGH_SHOTS_ON_TARGET: u32 = 15;

/// Goals per shot on target, as a percentage. 0.0 without shots.
pub fn conversion_rate(goals: u32, shots_on_target: Option<u32>) -> f64 {
    match shots_on_target {
        Some(shots) if shots > 0 => f64::from(goals) / f64::from(shots) * 100.0,
        _ => 0.0,
    }
}

/// One finding per qualifying side, home first.
pub fn evaluate(m: &Match) -> Vec<Pattern> {
    let sides = [
        ("home", &m.home_team, m.home_goals, m.stats.home_shots_on_target),
        ("away", &m.away_team, m.away_goals, m.stats.away_shots_on_target),
    ];
    sides
        .into_iter()
        .filter_map(|(side, team, goals, shots)| {
            let (goals, on_target) = (goals?, shots?);
            if on_target < MIN_SHOTS_ON_TARGET || goals > MAX_GOALS {
                return None;
            }
            let rate = conversion_rate(goals, shots);
            let significance = if on_target >= HIGH_SHOTS_ON_TARGET {
                Significance::High
            } else {
                Significance::Medium
            };
            let mut pattern = Pattern::for_match(
                m,
                PatternKind::Inefficient,
                significance,
                format!("{team} wasteful in {}", m.fixture_label()),
                format!(
                    "{team} put {on_target} shots on target and scored {goals} ({rate:.1}% conversion)."
                ),
            )
            .metric("shots_on_target", f64::from(on_target))
            .metric("goals", f64::from(goals))
            .metric("conversion_pct", rate);
            pattern.id = format!("{}-{side}", pattern.id);
            Some(pattern)
        })
        .collect()
}

pub struct InefficiencyDetector {
    scan_limit: NonZeroU32,
}

impl InefficiencyDetector {
    pub fn new(scan_limit: NonZeroU32) -> Self {
        Self { scan_limit }
    }
}

#[async_trait]
impl Detector for InefficiencyDetector {
    fn name(&self) -> &'static str {
        "inefficiency"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit)
            .require(StatField::Goals)
            .require(StatField::ShotsOnTarget);
        let matches = corpus.scan(&scan).await?;
        Ok(matches.iter().flat_map(evaluate).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::detectors::fixtures::played;

    #[test]
    fn conversion_without_shots_is_zero() {
        assert_eq!(conversion_rate(0, Some(10)), 0.0);
        assert_eq!(conversion_rate(1, Some(0)), 0.0);
        assert_eq!(conversion_rate(1, None), 0.0);
        assert_eq!(conversion_rate(1, Some(10)), 10.0);
    }

    #[test]
    fn ten_on_target_and_no_goals() {
        let mut m = played(5, "Chelsea", "Wolves", 0, 1);
        m.stats.home_shots_on_target = Some(10);
        m.stats.away_shots_on_target = Some(2);

        let found = evaluate(&m);
        assert_eq!(found.len(), 1);
        let p = &found[0];
        assert_eq!(p.id, "inefficient-5-home");
        assert_eq!(p.significance, Significance::Medium);
        assert_eq!(p.metrics["conversion_pct"], 0.0);
        assert!(p.description.contains("(0.0% conversion)"));
    }

    #[test]
    fn both_sides_and_high_band() {
        let mut m = played(6, "A", "B", 1, 1);
        m.stats.home_shots_on_target = Some(15);
        m.stats.away_shots_on_target = Some(11);
        let found = evaluate(&m);
        let ids: Vec<_> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["inefficient-6-home", "inefficient-6-away"]);
        assert_eq!(found[0].significance, Significance::High);
        assert_eq!(found[1].significance, Significance::Medium);
    }

    #[test]
    fn two_goals_or_missing_shots_skip() {
        let mut m = played(7, "A", "B", 2, 0);
        m.stats.home_shots_on_target = Some(12);
        assert!(evaluate(&m).is_empty());
    }
}
