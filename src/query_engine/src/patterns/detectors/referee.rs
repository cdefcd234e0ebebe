//! Referees who book a lot of players.

use std::num::NonZeroU32;

use async_trait::async_trait;
use indexmap::IndexMap;
use match_store::{Corpus, Match, StatField};
use tracing::debug;

use crate::error::DetectorError;
use crate::patterns::detectors::{recent, slug, sql_quote};
use crate::patterns::{Detector, Pattern, PatternKind, PatternSource, Significance};

pub const MIN_MATCHES: u32 = 5;
/// Cards per match above which a referee is flagged.
pub const CARD_AVERAGE_THRESHOLD: f64 = 5.0;
pub const HIGH_CARD_AVERAGE: f64 = 6.0;
pub const MAX_FINDINGS: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    matches: u32,
    cards: u64,
}

/// Groups by referee in order of first appearance and flags high averages.
pub fn evaluate(matches: &[Match]) -> Vec<Pattern> {
    let mut tallies: IndexMap<&str, Tally> = IndexMap::new();
    for m in matches {
        let (Some(referee), Some(cards)) = (m.referee.as_deref(), m.stats.total_cards()) else {
            debug!(match_id = m.id, "skipping match without referee or usable card counts");
            continue;
        };
        let tally = tallies.entry(referee).or_default();
        tally.matches += 1;
        tally.cards += u64::from(cards);
    }

    tallies
        .into_iter()
        .filter_map(|(name, tally)| {
            if tally.matches < MIN_MATCHES {
                return None;
            }
            let average = tally.cards as f64 / f64::from(tally.matches);
            if average <= CARD_AVERAGE_THRESHOLD {
                return None;
            }
            let significance = if average > HIGH_CARD_AVERAGE {
                Significance::High
            } else {
                Significance::Medium
            };
            let mut metrics = IndexMap::new();
            metrics.insert("matches".to_string(), f64::from(tally.matches));
            metrics.insert("total_cards".to_string(), tally.cards as f64);
            metrics.insert("cards_per_match".to_string(), average);
            Some(Pattern {
                id: format!("card-fest-{}", slug(name)),
                kind: PatternKind::CardFest,
                title: format!("{name} averages {average:.1} cards a game"),
                description: format!(
                    "{name} showed {} cards over {} matches.",
                    tally.cards, tally.matches
                ),
                significance,
                source: PatternSource::Referee {
                    name: name.to_string(),
                    matches: tally.matches,
                },
                metrics,
                query: Some(format!(
                    "SELECT * FROM matches WHERE referee = {} ORDER BY kickoff DESC;",
                    sql_quote(name)
                )),
            })
        })
        .take(MAX_FINDINGS)
        .collect()
}

pub struct RefereeDetector {
    scan_limit: NonZeroU32,
}

impl RefereeDetector {
    pub fn new(scan_limit: NonZeroU32) -> Self {
        Self { scan_limit }
    }
}

#[async_trait]
impl Detector for RefereeDetector {
    fn name(&self) -> &'static str {
        "referee"
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        let scan = recent(self.scan_limit)
            .require(StatField::Referee)
            .require(StatField::Cards);
        let matches = corpus.scan(&scan).await?;
        Ok(evaluate(&matches))
    }
}
