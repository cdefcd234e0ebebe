use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};
use match_store::db::{connection::connect_sqlite, migrate::run_sqlite};
use match_store::{SqliteCorpus, import, seasons};
use query_engine::config::{EngineConfig, load_config_path};
use query_engine::{Engine, RuntimeConfig};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Football query engine CLI")]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides `corpus.database_url`.
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create or upgrade the match store schema
    Migrate,
    /// Load seasons and matches from a JSON fixture
    Import {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// Zone of kickoff times written without an offset
        #[arg(long, default_value = "Europe/London")]
        tz: String,
    },
    /// Inspect or change the current season
    Season(SeasonCmd),
    /// Turn a question into a read-only SQL query
    Ask {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        question: String,
    },
    /// Run every pattern detector over the stored matches
    Patterns,
}

#[derive(Args)]
struct SeasonCmd {
    #[command(subcommand)]
    sub: SeasonSub,
}

#[derive(Subcommand)]
enum SeasonSub {
    /// Flag a season as the current one
    SetCurrent {
        #[arg(long)]
        name: String,
    },
    /// Print the current season
    Current,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &cli.database {
        cfg.corpus.database_url = url.clone();
    }
    Ok(cfg)
}

/// The store's current season, if the store is readable.
fn stored_season(database_url: &str) -> Option<String> {
    let lookup = connect_sqlite(database_url).and_then(|mut conn| seasons::current_season(&mut conn));
    match lookup {
        Ok(season) => season.map(|s| s.name),
        Err(e) => {
            warn!(error = %e, "could not read the current season from the store");
            None
        }
    }
}

fn build_engine(cfg: EngineConfig) -> Result<Engine> {
    let database_url = cfg.corpus.database_url.clone();
    let runtime = RuntimeConfig::resolve(cfg, stored_season(&database_url));
    Engine::from_config(runtime, Arc::new(SqliteCorpus::new(database_url)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_engine_config(&cli)?;
    let database_url = cfg.corpus.database_url.clone();

    match cli.cmd {
        Cmd::Migrate => {
            run_sqlite(&database_url)?;
            info!(database = %database_url, "migrations applied");
        }
        Cmd::Import { file, tz } => {
            let tz: Tz = tz
                .parse()
                .map_err(|_| anyhow!("unknown time zone {tz}"))?;
            let mut conn = connect_sqlite(&database_url)?;
            let report = import::load_matches_json(&mut conn, &file, tz)
                .with_context(|| format!("import {}", file.display()))?;
            info!(
                seasons = report.seasons_created,
                matches = report.matches_inserted,
                current = report.current_season.as_deref().unwrap_or("<unchanged>"),
                "import finished"
            );
        }
        Cmd::Season(SeasonCmd { sub }) => {
            let mut conn = connect_sqlite(&database_url)?;
            match sub {
                SeasonSub::SetCurrent { name } => {
                    print_json(&seasons::set_current_season(&mut conn, &name)?)?;
                }
                SeasonSub::Current => print_json(&seasons::current_season(&mut conn)?)?,
            }
        }
        Cmd::Ask { question } => {
            let engine = build_engine(cfg)?;
            print_json(&engine.synthesize_query(&question).await?)?;
        }
        Cmd::Patterns => {
            let engine = build_engine(cfg)?;
            print_json(&engine.discover_patterns().await)?;
        }
    }

    Ok(())
}
