//! Statistical anomaly detection over the match corpus.
//!
//! Each [`Detector`] issues its own corpus scans and turns rows into
//! [`Pattern`]s with fixed rules. [`engine::PatternEngine`] runs them all
//! concurrently and merges the findings, most significant first.

pub mod detectors;
pub mod engine;

use async_trait::async_trait;
use indexmap::IndexMap;
use match_store::{Corpus, Match};
use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

pub use engine::PatternEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    Upset,
    HighScoring,
    Goalless,
    Comeback,
    Inefficient,
    CardFest,
    WinStreak,
    LossStreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Significance {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Significance {
    /// Sort key: very-high 4 down to low 1.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }
}

/// What a finding was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PatternSource {
    Match {
        match_id: i32,
        fixture: String,
    },
    Referee {
        name: String,
        matches: u32,
    },
    Team {
        name: String,
        /// Matches forming the finding, most recent first.
        match_ids: Vec<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    /// Derived from source data only, so reruns over the same data agree.
    pub id: String,
    pub kind: PatternKind,
    pub title: String,
    pub description: String,
    pub significance: Significance,
    pub source: PatternSource,
    pub metrics: IndexMap<String, f64>,
    /// SQL that shows the underlying rows.
    pub query: Option<String>,
}

impl Pattern {
    /// A finding about one match, with an inspection query for that row.
    pub fn for_match(
        m: &Match,
        kind: PatternKind,
        significance: Significance,
        title: String,
        description: String,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind_slug(kind), m.id),
            kind,
            title,
            description,
            significance,
            source: PatternSource::Match {
                match_id: m.id,
                fixture: m.fixture_label(),
            },
            metrics: IndexMap::new(),
            query: Some(format!("SELECT * FROM matches WHERE id = {};", m.id)),
        }
    }

    pub fn metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }
}

/// The serialized kind name, e.g. `high-scoring`.
pub fn kind_slug(kind: PatternKind) -> &'static str {
    match kind {
        PatternKind::Upset => "upset",
        PatternKind::HighScoring => "high-scoring",
        PatternKind::Goalless => "goalless",
        PatternKind::Comeback => "comeback",
        PatternKind::Inefficient => "inefficient",
        PatternKind::CardFest => "card-fest",
        PatternKind::WinStreak => "win-streak",
        PatternKind::LossStreak => "loss-streak",
    }
}

#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_slug_matches_serde() {
        for kind in [
            PatternKind::Upset,
            PatternKind::HighScoring,
            PatternKind::Goalless,
            PatternKind::Comeback,
            PatternKind::Inefficient,
            PatternKind::CardFest,
            PatternKind::WinStreak,
            PatternKind::LossStreak,
        ] {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::from(kind_slug(kind))
            );
        }
    }

    #[test]
    fn significance_ranks() {
        let ranks: Vec<_> = [
            Significance::Low,
            Significance::Medium,
            Significance::High,
            Significance::VeryHigh,
        ]
        .into_iter()
        .map(Significance::rank)
        .collect();
        assert_eq!(ranks, [1, 2, 3, 4]);
        insta::assert_json_snapshot!(Significance::VeryHigh, @r#""very-high""#);
    }

    #[test]
    fn referee_source_is_tagged() {
        let source = PatternSource::Referee {
            name: "M Oliver".into(),
            matches: 6,
        };
        insta::assert_json_snapshot!(source, @r#"
        {
          "type": "referee",
          "name": "M Oliver",
          "matches": 6
        }
        "#);
    }
}
