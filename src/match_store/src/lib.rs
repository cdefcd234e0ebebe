//! Match store: the SQLite-backed football match corpus.
//!
//! - [`db`]: tuned connections and embedded migrations.
//! - [`models`]: matches, seasons and their Diesel rows.
//! - [`corpus`]: the read-only [`corpus::Corpus`] trait the engine scans.
//! - [`repo`], [`seasons`], [`import`]: the write path.

#![deny(missing_docs)]

pub mod corpus;
pub mod db;
pub mod import;
pub mod models;
pub mod repo;
#[allow(missing_docs)]
pub mod schema;
pub mod seasons;
pub mod tz;

pub use corpus::{Corpus, CorpusError, MatchScan, MemoryCorpus, ScanOrder, SqliteCorpus, StatField};
pub use models::{Match, MatchStats, NewMatch, ResultCode, Season};
