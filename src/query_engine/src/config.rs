//! Engine configuration.
//!
//! [`EngineConfig`] is read from TOML; every section and field has a default so
//! an empty file (or no file) is a valid configuration. Credentials never live
//! in the file: [`RuntimeConfig::resolve`] reads them from the environment and
//! is the one place process-wide context is assembled.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use llm_providers::openai::{API_KEY_VAR, OpenAiConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_optional_env_var;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub corpus: CorpusCfg,
    pub season: SeasonCfg,
    pub retrieval: RetrievalCfg,
    pub synthesis: SynthesisCfg,
    pub providers: ProvidersCfg,
    pub patterns: PatternsCfg,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorpusCfg {
    /// SQLite file path or `file:` URL.
    pub database_url: String,
    /// Most recent matches a single detector scan may read.
    pub scan_limit: NonZeroU32,
}

impl Default for CorpusCfg {
    fn default() -> Self {
        Self {
            database_url: "matches.db".to_string(),
            scan_limit: NonZeroU32::new(1000).unwrap_or(NonZeroU32::MIN),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeasonCfg {
    /// Season name used as prompt context; when unset the store's current
    /// season is used.
    pub current: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrievalCfg {
    pub top_k: NonZeroUsize,
    /// Replaces the built-in schema catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for RetrievalCfg {
    fn default() -> Self {
        Self {
            top_k: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
            catalog_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SynthesisCfg {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Budget for each provider call.
    pub timeout_secs: u64,
    /// Row limit written into template queries.
    pub row_limit: NonZeroU32,
}

impl Default for SynthesisCfg {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 512,
            timeout_secs: 20,
            row_limit: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl SynthesisCfg {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProvidersCfg {
    /// Set to false to force the offline paths even when a key is present.
    pub enabled: bool,
    pub base_url: String,
    pub completion_model: String,
    pub embedding_model: String,
    pub requests_per_minute: NonZeroU32,
    pub timeout_secs: u64,
}

impl Default for ProvidersCfg {
    fn default() -> Self {
        let openai = OpenAiConfig::default();
        Self {
            enabled: true,
            base_url: openai.base_url,
            completion_model: openai.completion_model,
            embedding_model: openai.embedding_model,
            requests_per_minute: openai.requests_per_minute,
            timeout_secs: openai.timeout.as_secs(),
        }
    }
}

impl ProvidersCfg {
    pub fn openai(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.base_url.clone(),
            completion_model: self.completion_model.clone(),
            embedding_model: self.embedding_model.clone(),
            requests_per_minute: self.requests_per_minute,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PatternsCfg {
    /// Minimum away-minus-home goal margin for an upset.
    pub upset_margin: u32,
    /// Minimum combined goals for a high-scoring match.
    pub high_scoring_threshold: u32,
    pub streak_team_cap: NonZeroU32,
    /// Completed matches per team inspected for streaks.
    pub streak_window: NonZeroU32,
    pub detector_timeout_secs: u64,
    pub detect_goalless: bool,
}

impl Default for PatternsCfg {
    fn default() -> Self {
        Self {
            upset_margin: 2,
            high_scoring_threshold: 5,
            streak_team_cap: NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
            streak_window: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
            detector_timeout_secs: 10,
            detect_goalless: false,
        }
    }
}

impl PatternsCfg {
    pub fn detector_timeout(&self) -> Duration {
        Duration::from_secs(self.detector_timeout_secs)
    }
}

impl EngineConfig {
    /// Rejects values that parse but make no sense.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=2.0).contains(&self.synthesis.temperature) {
            bail!(
                "synthesis.temperature must be within 0.0..=2.0, got {}",
                self.synthesis.temperature
            );
        }
        if self.synthesis.max_tokens == 0 {
            bail!("synthesis.max_tokens must be positive");
        }
        if self.synthesis.timeout_secs == 0 {
            bail!("synthesis.timeout_secs must be positive");
        }
        if self.providers.timeout_secs == 0 {
            bail!("providers.timeout_secs must be positive");
        }
        if self.patterns.upset_margin == 0 {
            bail!("patterns.upset_margin must be positive");
        }
        if self.patterns.high_scoring_threshold == 0 {
            bail!("patterns.high_scoring_threshold must be positive");
        }
        if self.patterns.detector_timeout_secs == 0 {
            bail!("patterns.detector_timeout_secs must be positive");
        }
        if self.corpus.database_url.trim().is_empty() {
            bail!("corpus.database_url is empty");
        }
        Ok(())
    }
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<EngineConfig> {
    let cfg: EngineConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

/// Read, parse and validate a configuration file.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<EngineConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

/// Configuration plus the process-wide context derived at startup.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    /// Season name handed to query generation.
    pub current_season: Option<String>,
    /// Provider key; `None` selects the offline paths.
    pub api_key: Option<SecretString>,
}

impl RuntimeConfig {
    /// Reads the provider key from `OPENAI_API_KEY` when providers are enabled.
    ///
    /// `stored_season` is the store's current season, used when the file does
    /// not pin one.
    pub fn resolve(engine: EngineConfig, stored_season: Option<String>) -> Self {
        let api_key = if engine.providers.enabled {
            get_optional_env_var(API_KEY_VAR).map(|k| SecretString::new(k.into()))
        } else {
            None
        };
        Self::with_key(engine, stored_season, api_key)
    }

    /// Like [`RuntimeConfig::resolve`] but with an explicit key, no environment.
    pub fn with_key(
        engine: EngineConfig,
        stored_season: Option<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        let current_season = engine.season.current.clone().or(stored_season);
        info!(
            season = current_season.as_deref().unwrap_or("<none>"),
            provider_key = api_key.is_some(),
            "runtime configuration resolved"
        );
        Self {
            engine,
            current_season,
            api_key,
        }
    }
}
