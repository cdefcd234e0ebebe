//! Catalog configuration: parsing, normalization, and loading.
//!
//! A TOML-backed schema catalog describes:
//! - Tables (lowercase names) with a human description and example questions
//! - Columns per table (type, nullability, key flags, description)
//! - Worked example queries tied to tables
//! - Concept notes for football vocabulary ("clean sheet", "big six")
//!
//! Key behaviors:
//! - Normalization lowercases and trims table and column names and rejects
//!   tables that collide after normalization.
//! - Columns are de-duplicated by name; the first occurrence wins.
//! - Examples whose tables are not declared are dropped; concepts keep only
//!   declared table references.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_catalog_str`]
//! - Parse + normalize from a file path: [`load_catalog_path`]

use std::collections::HashSet;
use std::mem;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Map of table name -> definition, in declaration order.
    pub tables: IndexMap<String, SchemaTable>,
    /// Worked question/SQL pairs.
    #[serde(default)]
    pub examples: Vec<ExampleQuery>,
    /// Vocabulary notes.
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

/// One table of the queryable schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaTable {
    /// What a row represents.
    pub description: String,
    /// Columns in declaration order.
    pub columns: Vec<SchemaColumn>,
    /// Questions this table typically answers.
    #[serde(default)]
    pub example_questions: Vec<String>,
}

/// One column of a [`SchemaTable`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaColumn {
    /// Column name (normalized lowercase).
    pub name: String,
    /// SQL type as declared in the store.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// `table.column` this column references.
    #[serde(default)]
    pub foreign_key: Option<String>,
    pub description: String,
}

/// A worked example.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExampleQuery {
    pub question: String,
    pub sql: String,
    /// Tables the SQL reads.
    pub tables: Vec<String>,
}

/// A football concept and where it lives in the schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Concept {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tables: Vec<String>,
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Table keys that changed when lowercasing/trimming.
    pub tables_renamed: usize,
    /// Duplicate columns removed (first occurrence kept).
    pub columns_deduped: usize,
    /// Examples dropped because they reference undeclared tables.
    pub examples_dropped: usize,
    /// Concept table references dropped because the table is undeclared.
    pub concept_tables_dropped: usize,
}

fn norm(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize a catalog in place.
///
/// Errors:
/// - Empty or duplicate table names after normalization
/// - Empty column names, or a table with no columns
pub fn normalize_catalog(cat: &mut Catalog) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, SchemaTable> = IndexMap::new();
    for (raw_name, mut table) in mem::take(&mut cat.tables) {
        let name = norm(&raw_name);
        if name.is_empty() {
            bail!("table name cannot be empty after trimming");
        }
        if name != raw_name {
            report.tables_renamed += 1;
        }
        if rebuilt.contains_key(&name) {
            bail!("duplicate table name after normalization: {name}");
        }

        let before_len = table.columns.len();
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(before_len);
        for mut col in mem::take(&mut table.columns) {
            col.name = norm(&col.name);
            if col.name.is_empty() {
                bail!("column name in table {name} cannot be empty after trimming");
            }
            col.data_type = col.data_type.trim().to_uppercase();
            col.foreign_key = col.foreign_key.map(|fk| norm(&fk)).filter(|fk| !fk.is_empty());
            if seen.insert(col.name.clone()) {
                columns.push(col);
            }
        }
        report.columns_deduped += before_len - columns.len();
        if columns.is_empty() {
            bail!("table {name} declares no columns");
        }

        table.columns = columns;
        rebuilt.insert(name, table);
    }
    cat.tables = rebuilt;

    let declared: HashSet<String> = cat.tables.keys().cloned().collect();

    let before_len = cat.examples.len();
    cat.examples.retain_mut(|ex| {
        ex.tables = ex.tables.iter().map(|t| norm(t)).collect();
        ex.tables.iter().all(|t| declared.contains(t))
    });
    report.examples_dropped = before_len - cat.examples.len();

    for concept in &mut cat.concepts {
        concept.name = concept.name.trim().to_string();
        let before_len = concept.tables.len();
        concept.tables = mem::take(&mut concept.tables)
            .iter()
            .map(|t| norm(t))
            .filter(|t| declared.contains(t))
            .collect();
        report.concept_tables_dropped += before_len - concept.tables.len();
    }

    Ok(report)
}

/// Parse and normalize a catalog from a TOML string.
pub fn load_catalog_str(toml_str: &str) -> anyhow::Result<Catalog> {
    let mut cat: Catalog = toml::from_str(toml_str).context("failed to parse catalog TOML")?;
    let report = normalize_catalog(&mut cat).context("normalize_catalog failed")?;
    debug!(?report, "schema catalog normalized");
    Ok(cat)
}

/// Read a catalog TOML file from disk, parse, and normalize it.
pub fn load_catalog_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Catalog> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read catalog file {}", path.as_ref().display()))?;
    load_catalog_str(&text)
}
