use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, StatField};

use crate::error::DetectorError;
use crate::patterns::detectors::recent;
use crate::patterns::{Detector, Pattern, PatternKind, Significance};

/// Combined shots for a 0-0 to be remarkable.
pub const MIN_COMBINED_SHOTS: u32 = 20;

/// Goalless draws despite plenty of shots.
pub fn evaluate(m: &Match) -> Option<Pattern> {
    if m.score()? != (0, 0) {
        return None;
    }
    let shots = m.stats.total_shots()?;
    if shots < MIN_COMBINED_SHOTS {
        return None;
    }
    Some(
        Pattern::for_match(
            m,
            PatternKind::Goalless,
            Significance::Medium,
            format!("{shots} shots, no goals: {} vs {}", m.home_team, m.away_team),
            format!(
                "{} and {} drew 0-0 despite {shots} shots between them.",
                m.home_team, m.away_team
            ),
        )
        .metric("total_shots", f64::from(shots)),
    )
}

pub struct GoallessDetector {
    scan_limit: NonZeroU32,
}

impl GoallessDetector {
    pub fn new(scan_limit: NonZeroU32) -> Self {
        Self { scan_limit }
    }
}

#[async_trait]
impl Detector for GoallessDetector {
    fn name(&self) -> &'static str {
        "goalless"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit)
            .require(StatField::Goals)
            .require(StatField::Shots);
        let matches = corpus.scan(&scan).await?;
        Ok(matches.iter().filter_map(evaluate).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::detectors::fixtures::played;

    #[test]
    fn busy_goalless_draw() {
        let mut m = played(3, "Brentford", "Fulham", 0, 0);
        m.stats.home_shots = Some(12);
        m.stats.away_shots = Some(8);
        let p = evaluate(&m).unwrap();
        assert_eq!(p.id, "goalless-3");
        assert_eq!(p.metrics["total_shots"], 20.0);

        m.stats.away_shots = Some(7);
        assert!(evaluate(&m).is_none());
    }

    #[test]
    fn scoring_draws_and_missing_shots_skip() {
        let mut m = played(4, "A", "B", 1, 1);
        m.stats.home_shots = Some(20);
        m.stats.away_shots = Some(20);
        assert!(evaluate(&m).is_none());
        assert!(evaluate(&played(5, "A", "B", 0, 0)).is_none());
    }
}
