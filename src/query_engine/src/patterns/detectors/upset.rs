use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, StatField};

use crate::error::DetectorError;
use crate::patterns::detectors::recent;
use crate::patterns::{Detector, Pattern, PatternKind, Significance};

/// Margin from which an away win counts as very-high.
pub const ROUT_MARGIN: u32 = 4;

/// Away wins by at least `margin` goals.
pub fn evaluate(m: &Match, margin: u32) -> Option<Pattern> {
    let (home, away) = m.score()?;
    if away <= home || away - home < margin {
        return None;
    }
    let diff = away - home;
    let significance = if diff >= ROUT_MARGIN {
        Significance::VeryHigh
    } else {
        Significance::High
    };
    Some(
        Pattern::for_match(
            m,
            PatternKind::Upset,
            significance,
            format!("{} won by {diff} at {}", m.away_team, m.home_team),
            format!(
                "{} beat {} {away}-{home} away from home.",
                m.away_team, m.home_team
            ),
        )
        .metric("margin", f64::from(diff))
        .metric("home_goals", f64::from(home))
        .metric("away_goals", f64::from(away)),
    )
}

pub struct UpsetDetector {
    margin: u32,
    scan_limit: NonZeroU32,
}

impl UpsetDetector {
    pub fn new(margin: u32, scan_limit: NonZeroU32) -> Self {
        Self { margin, scan_limit }
    }
}

#[async_trait]
impl Detector for UpsetDetector {
    fn name(&self) -> &'static str {
        "upset"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit).require(StatField::Goals);
        let matches = corpus.scan(&scan).await?;
        Ok(matches.iter().filter_map(|m| evaluate(m, self.margin)).collect())
    }
}
