use std::num::NonZeroU32;

use async_trait::async_trait;
use match_store::{Corpus, Match, ResultCode, StatField};

use crate::error::DetectorError;
use crate::patterns::detectors::recent;
use crate::patterns::{Detector, Pattern, PatternKind, Significance};

/// Losing at half time, winning at full time.
pub fn is_comeback(half_time: ResultCode, full_time: ResultCode) -> bool {
    matches!(
        (half_time, full_time),
        (ResultCode::Away, ResultCode::Home) | (ResultCode::Home, ResultCode::Away)
    )
}

pub fn evaluate(m: &Match) -> Option<Pattern> {
    let (half_time, full_time) = (m.half_time_result?, m.result?);
    if !is_comeback(half_time, full_time) {
        return None;
    }
    let (winner, loser) = match full_time {
        ResultCode::Home => (&m.home_team, &m.away_team),
        _ => (&m.away_team, &m.home_team),
    };
    Some(Pattern::for_match(
        m,
        PatternKind::Comeback,
        Significance::High,
        format!("{winner} came from behind against {loser}"),
        format!(
            "{winner} trailed at half time and won: {}.",
            m.fixture_label()
        ),
    ))
}

pub struct ComebackDetector {
    scan_limit: NonZeroU32,
}

impl ComebackDetector {
    pub fn new(scan_limit: NonZeroU32) -> Self {
        Self { scan_limit }
    }
}

#[async_trait]
impl Detector for ComebackDetector {
    fn name(&self) -> &'static str {
        "comeback"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit)
            .require(StatField::HalfTimeResult)
            .require(StatField::Result);
        let matches = corpus.scan(&scan).await?;
        Ok(matches.iter().filter_map(evaluate).collect())
    }
}
