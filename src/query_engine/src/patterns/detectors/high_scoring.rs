use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, StatField};

use crate::error::DetectorError;
use crate::patterns::detectors::recent;
use crate::patterns::{Detector, Pattern, PatternKind, Significance};

/// Matches with at least `threshold` combined goals.
pub fn evaluate(m: &Match, threshold: u32) -> Option<Pattern> {
    let (home, away) = m.score()?;
    let total = home + away;
    if total < threshold {
        return None;
    }
    let significance = if total >= threshold + 3 {
        Significance::VeryHigh
    } else if total >= threshold + 2 {
        Significance::High
    } else {
        Significance::Medium
    };
    Some(
        Pattern::for_match(
            m,
            PatternKind::HighScoring,
            significance,
            format!("{total} goals: {}", m.fixture_label()),
            format!(
                "{} and {} shared {total} goals.",
                m.home_team, m.away_team
            ),
        )
        .metric("total_goals", f64::from(total)),
    )
}

pub struct HighScoringDetector {
    threshold: u32,
    scan_limit: NonZeroU32,
}

impl HighScoringDetector {
    pub fn new(threshold: u32, scan_limit: NonZeroU32) -> Self {
        Self {
            threshold,
            scan_limit,
        }
    }
}

#[async_trait]
impl Detector for HighScoringDetector {
    fn name(&self) -> &'static str {
        "high-scoring"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit).require(StatField::Goals);
        let matches = corpus.scan(&scan).await?;
        Ok(matches
            .iter()
            .filter_map(|m| evaluate(m, self.threshold))
            .collect())
    }
}
