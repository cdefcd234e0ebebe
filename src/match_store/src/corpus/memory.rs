//! In-process corpus over a fixed set of matches.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use async_trait::async_trait;

use super::{Corpus, CorpusError, MatchScan, ScanOrder};
use crate::models::Match;

/// A corpus backed by a `Vec<Match>`. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    matches: Vec<Match>,
}

impl MemoryCorpus {
    /// Wraps the given matches.
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    /// Number of matches held.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// True when no matches are held.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[async_trait]
impl Corpus for MemoryCorpus {
    async fn scan(&self, scan: &MatchScan) -> Result<Vec<Match>, CorpusError> {
        let mut out: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| scan.accepts(m))
            .cloned()
            .collect();

        out.sort_by(|a, b| (a.kickoff, a.id).cmp(&(b.kickoff, b.id)));
        if scan.order == ScanOrder::KickoffDesc {
            out.reverse();
        }
        if let Some(limit) = scan.limit {
            out.truncate(limit.get() as usize);
        }
        Ok(out)
    }

    async fn teams(&self, limit: Option<NonZeroU32>) -> Result<Vec<String>, CorpusError> {
        let names: BTreeSet<&str> = self
            .matches
            .iter()
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
            .collect();
        let cap = limit.map_or(usize::MAX, |l| l.get() as usize);
        Ok(names.into_iter().take(cap).map(str::to_owned).collect())
    }
}
