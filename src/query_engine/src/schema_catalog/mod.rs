//! Read-only description of the queryable schema.
//!
//! The catalog is flattened into [`SchemaDocument`]s, the unit of retrieval:
//! one per table, column, worked example and concept note, in catalog order.

pub mod config;

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

pub use config::{Catalog, Concept, ExampleQuery, SchemaColumn, SchemaTable};

const BUILTIN_CATALOG: &str = include_str!("../../catalog/football.toml");

/// What a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Table,
    Column,
    Example,
    Concept,
}

/// A retrievable schema fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    /// Stable id, e.g. `column:matches.home_goals`.
    pub id: String,
    pub kind: DocumentKind,
    /// Tables this fragment is about.
    pub tables: Vec<String>,
    /// Human readable text; this is what gets embedded and shown to the model.
    pub body: String,
    /// Lowercase keywords (names, aliases, kind) used by lexical scoring.
    pub metadata: String,
}

/// A normalized catalog plus its documents.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    catalog: Catalog,
    documents: Vec<SchemaDocument>,
}

impl SchemaCatalog {
    /// The catalog compiled into the binary, describing the match store.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        config::load_catalog_str(toml_str).map(Self::new)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        config::load_catalog_path(path).map(Self::new)
    }

    /// Wraps an already normalized catalog.
    pub fn new(catalog: Catalog) -> Self {
        let documents = build_documents(&catalog);
        Self { catalog, documents }
    }

    pub fn tables(&self) -> &IndexMap<String, SchemaTable> {
        &self.catalog.tables
    }

    pub fn table(&self, name: &str) -> Option<&SchemaTable> {
        self.catalog.tables.get(&name.trim().to_lowercase())
    }

    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }
}

fn column_body(table: &str, col: &SchemaColumn) -> String {
    let mut attrs = vec![
        col.data_type.clone(),
        if col.nullable { "nullable" } else { "not null" }.to_string(),
    ];
    if col.primary_key {
        attrs.push("primary key".to_string());
    }
    if let Some(fk) = &col.foreign_key {
        attrs.push(format!("references {fk}"));
    }
    format!("{table}.{} ({}): {}", col.name, attrs.join(", "), col.description)
}

fn build_documents(catalog: &Catalog) -> Vec<SchemaDocument> {
    let mut docs = Vec::new();

    for (name, table) in &catalog.tables {
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let mut body = format!(
            "{name} table: {} Columns: {}.",
            table.description,
            columns.join(", ")
        );
        if !table.example_questions.is_empty() {
            body.push_str(" Example questions: ");
            body.push_str(&table.example_questions.join(" "));
        }
        docs.push(SchemaDocument {
            id: format!("table:{name}"),
            kind: DocumentKind::Table,
            tables: vec![name.clone()],
            body,
            metadata: format!("table {name}"),
        });

        for col in &table.columns {
            docs.push(SchemaDocument {
                id: format!("column:{name}.{}", col.name),
                kind: DocumentKind::Column,
                tables: vec![name.clone()],
                body: column_body(name, col),
                metadata: format!("column {name} {} {}", col.name, col.data_type.to_lowercase()),
            });
        }
    }

    for (idx, example) in catalog.examples.iter().enumerate() {
        docs.push(SchemaDocument {
            id: format!("example:{idx}"),
            kind: DocumentKind::Example,
            tables: example.tables.clone(),
            body: format!(
                "Example for {}: {} SQL: {}",
                example.tables.join(", "),
                example.question,
                example.sql
            ),
            metadata: format!("example {}", example.tables.join(" ")),
        });
    }

    for concept in &catalog.concepts {
        let mut metadata = vec!["concept".to_string(), concept.name.to_lowercase()];
        metadata.extend(concept.aliases.iter().map(|a| a.to_lowercase()));
        metadata.extend(concept.tables.iter().cloned());
        docs.push(SchemaDocument {
            id: format!("concept:{}", concept.name.to_lowercase()),
            kind: DocumentKind::Concept,
            tables: concept.tables.clone(),
            body: format!("{}: {}", concept.name, concept.description),
            metadata: metadata.join(" "),
        });
    }

    docs
}
