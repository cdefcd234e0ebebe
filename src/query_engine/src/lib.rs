//! Football query engine.
//!
//! Two operations sit on top of the match store:
//! - [`Engine::synthesize_query`]: natural-language question to a read-only
//!   SQL query, grounded in the schema fragments [`retrieval`] selects.
//! - [`Engine::discover_patterns`]: runs the [`patterns`] detectors over the
//!   corpus and ranks what they find.
//!
//! Both degrade instead of failing when the LLM provider is missing or broken.

pub mod config;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod retrieval;
pub mod schema_catalog;
pub mod synthesis;

pub use config::{EngineConfig, RuntimeConfig};
pub use engine::Engine;
pub use error::{DetectorError, EngineError, GenerationError};
pub use patterns::{Pattern, PatternKind, PatternSource, Significance};
pub use synthesis::{QueryResult, QuerySource};
