//! The built-in detectors. Each file pairs a [`Detector`] that scans the corpus
//! with a pure `evaluate` function holding the rule itself.

pub mod comeback;
pub mod goalless;
pub mod high_scoring;
pub mod inefficiency;
pub mod referee;
pub mod streak;
pub mod upset;

use std::num::NonZeroU32;
use std::sync::Arc;

use match_store::{MatchScan, ScanOrder};

use crate::config::PatternsCfg;
use crate::patterns::Detector;

pub use comeback::ComebackDetector;
pub use goalless::GoallessDetector;
pub use high_scoring::HighScoringDetector;
pub use inefficiency::InefficiencyDetector;
pub use referee::RefereeDetector;
pub use streak::StreakDetector;
pub use upset::UpsetDetector;

/// Detectors enabled by `cfg`, in merge order.
pub fn standard_set(cfg: &PatternsCfg, scan_limit: NonZeroU32) -> Vec<Arc<dyn Detector>> {
    let mut detectors: Vec<Arc<dyn Detector>> = vec![
        Arc::new(UpsetDetector::new(cfg.upset_margin, scan_limit)),
        Arc::new(HighScoringDetector::new(cfg.high_scoring_threshold, scan_limit)),
        Arc::new(InefficiencyDetector::new(scan_limit)),
        Arc::new(ComebackDetector::new(scan_limit)),
        Arc::new(RefereeDetector::new(scan_limit)),
        Arc::new(StreakDetector::new(cfg.streak_team_cap, cfg.streak_window)),
    ];
    if cfg.detect_goalless {
        detectors.push(Arc::new(GoallessDetector::new(scan_limit)));
    }
    detectors
}

/// Most recent `limit` matches.
pub(crate) fn recent(limit: NonZeroU32) -> MatchScan {
    MatchScan::new().order(ScanOrder::KickoffDesc).limit(limit)
}

/// `"M Oliver"` -> `"m-oliver"`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Single-quoted SQL string literal.
pub(crate) fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
