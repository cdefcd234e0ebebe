#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as Days, TimeZone, Utc};
use llm_providers::providers::{ApiSnafu, InternalSnafu};
use llm_providers::{CompletionProvider, CompletionRequest, EmbeddingProvider, ProviderError};
use match_store::{Corpus, CorpusError, Match, MatchStats, ResultCode};
use query_engine::DetectorError;
use query_engine::patterns::{Detector, Pattern};

/// A played match kicking off `id` days after 2024-08-01.
pub fn played(id: i32, home: &str, away: &str, hg: u32, ag: u32) -> Match {
    Match {
        id,
        season_id: 1,
        kickoff: Utc.with_ymd_and_hms(2024, 8, 1, 15, 0, 0).unwrap() + Days::days(i64::from(id)),
        home_team: home.into(),
        away_team: away.into(),
        home_goals: Some(hg),
        away_goals: Some(ag),
        result: Some(ResultCode::from_score(hg, ag)),
        half_time_result: None,
        stats: MatchStats::default(),
        referee: None,
    }
}

pub fn scheduled(id: i32, home: &str, away: &str) -> Match {
    Match {
        home_goals: None,
        away_goals: None,
        result: None,
        ..played(id, home, away, 0, 0)
    }
}

/// Fills every statistic so the match passes any detector's completeness check.
pub fn with_stats(mut m: Match, shots: u32, on_target: u32, cards: u32) -> Match {
    m.stats = MatchStats {
        home_shots: Some(shots),
        away_shots: Some(shots),
        home_shots_on_target: Some(on_target),
        away_shots_on_target: Some(on_target),
        home_corners: Some(4),
        away_corners: Some(4),
        home_fouls: Some(10),
        away_fouls: Some(10),
        home_yellow_cards: Some(cards),
        away_yellow_cards: Some(0),
        home_red_cards: Some(0),
        away_red_cards: Some(0),
    };
    m
}

/// Replays scripted completions in order; an exhausted script fails with 500.
pub struct ScriptedCompletion {
    answers: Mutex<VecDeque<Result<String, u16>>>,
    pub calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(answers: Vec<Result<&str, u16>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.answers.lock().unwrap().pop_front();
        let status = match next {
            Some(Ok(text)) => return Ok(text),
            Some(Err(status)) => status,
            None => 500,
        };
        ApiSnafu {
            status,
            message: "scripted failure",
        }
        .fail()
    }
}

/// Embeds text as keyword presence flags.
pub struct KeywordEmbedder {
    pub words: &'static [&'static str],
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                self.words
                    .iter()
                    .map(|w| if t.contains(w) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

pub struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        InternalSnafu {
            message: "embedding backend down",
        }
        .fail()
    }
}

/// A provider that accepts every request and never answers.
pub struct Stalled;

#[async_trait]
impl CompletionProvider for Stalled {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

#[async_trait]
impl EmbeddingProvider for Stalled {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Detectors that misbehave in the ways the engine must survive.
pub enum Misbehaving {
    Fails,
    Hangs,
    Panics,
}

#[async_trait]
impl Detector for Misbehaving {
    fn name(&self) -> &'static str {
        match self {
            Misbehaving::Fails => "fails",
            Misbehaving::Hangs => "hangs",
            Misbehaving::Panics => "panics",
        }
    }

    async fn detect(&self, corpus: &dyn Corpus) -> Result<Vec<Pattern>, DetectorError> {
        match self {
            Misbehaving::Fails => {
                corpus.teams(None).await?;
                Err(DetectorError::Corpus(CorpusError::Connect(anyhow::anyhow!(
                    "store offline"
                ))))
            }
            Misbehaving::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Misbehaving::Panics => panic!("detector bug"),
        }
    }
}
