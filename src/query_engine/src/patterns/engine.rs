use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use match_store::Corpus;
use tracing::{debug, info, warn};

use crate::config::PatternsCfg;
use crate::patterns::{Detector, Pattern, detectors};

/// Runs every detector concurrently and merges their findings.
pub struct PatternEngine {
    corpus: Arc<dyn Corpus>,
    detectors: Vec<Arc<dyn Detector>>,
    timeout: Duration,
}

impl PatternEngine {
    pub fn new(
        corpus: Arc<dyn Corpus>,
        detectors: Vec<Arc<dyn Detector>>,
        timeout: Duration,
    ) -> Self {
        Self {
            corpus,
            detectors,
            timeout,
        }
    }

    /// The standard detector set for `cfg`.
    pub fn from_config(corpus: Arc<dyn Corpus>, cfg: &PatternsCfg, scan_limit: NonZeroU32) -> Self {
        Self::new(
            corpus,
            detectors::standard_set(cfg, scan_limit),
            cfg.detector_timeout(),
        )
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Never fails: a detector that errors, times out or panics contributes
    /// nothing and the rest still report.
    pub async fn discover_patterns(&self) -> Vec<Pattern> {
        let started = Instant::now();

        let handles: Vec<_> = self
            .detectors
            .iter()
            .map(|detector| {
                let detector = Arc::clone(detector);
                let corpus = Arc::clone(&self.corpus);
                let budget = self.timeout;
                let name = detector.name();
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(budget, detector.detect(corpus.as_ref())).await
                });
                (name, handle)
            })
            .collect();

        let mut found = Vec::new();
        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(Ok(patterns))) => {
                    debug!(detector = name, patterns = patterns.len(), "detector finished");
                    found.extend(patterns);
                }
                Ok(Ok(Err(e))) => warn!(detector = name, error = %e, "detector failed, skipping"),
                Ok(Err(_)) => warn!(
                    detector = name,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "detector timed out, skipping"
                ),
                Err(e) => warn!(detector = name, error = %e, "detector task aborted, skipping"),
            }
        }

        let ranked = rank(found);
        info!(
            patterns = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pattern discovery finished"
        );
        ranked
    }
}

/// Drops findings without an id, then orders by significance, most significant
/// first. Equal significance keeps detector order.
pub fn rank(mut patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns.retain(|p| !p.id.trim().is_empty());
    patterns.sort_by(|a, b| b.significance.rank().cmp(&a.significance.rank()));
    patterns
}
