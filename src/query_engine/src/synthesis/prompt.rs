//! Prompt rendering and clean-up of model output.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::GenerationError;
use crate::synthesis::analysis::strip_literals;
use crate::synthesis::generator::GenerationContext;

/// Used when the explanation request fails; the SQL is still returned.
pub const CANNED_EXPLANATION: &str =
    "This query searches the football database based on your question.";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static FENCE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)```(?:sql)?"));
static GROUP_BY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bGROUP\s+BY\b"));
static WHERE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bWHERE\b"));
static WHERE_END: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:ORDER\s+BY|LIMIT|HAVING)\b"));
static COMPOUND: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:UNION|INTERSECT|EXCEPT)\b"));
static WRITE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(DROP|DELETE|TRUNCATE|INSERT|UPDATE|CREATE|ALTER|ATTACH|DETACH|PRAGMA|VACUUM)\b")
});

const SQL_RULES: &str = "\
1. Use only tables and columns from the schema context.
2. Write one read-only SELECT statement for SQLite.
3. Clause order is SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT; WHERE never follows GROUP BY.
4. Every non-aggregated selected column of an aggregate query appears in GROUP BY.
5. Restrict to the current season unless the question spans seasons.
6. Add a LIMIT when the result could be large.
7. Use team names exactly as stored, e.g. 'Man City'.";

/// One `- phrase: fragment` line per mapping, or `None`.
pub fn render_mappings(mappings: &IndexMap<String, String>) -> String {
    if mappings.is_empty() {
        return "None".to_string();
    }
    mappings
        .iter()
        .map(|(phrase, sql)| format!("- {phrase}: {sql}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for SQL only.
pub fn sql_prompt(ctx: &GenerationContext<'_>) -> String {
    let tables = if ctx.retrieval.tables.is_empty() {
        "unknown".to_string()
    } else {
        ctx.retrieval.tables.join(", ")
    };
    let schema = if ctx.retrieval.is_empty() {
        "- (no schema fragments matched)".to_string()
    } else {
        ctx.retrieval.context()
    };
    format!(
        "You are an expert SQL generator for a football match database.\n\
         \n\
         Relevant tables: {tables}\n\
         Current season: {season}\n\
         \n\
         Schema context:\n\
         {schema}\n\
         \n\
         Football terminology mappings:\n\
         {mappings}\n\
         \n\
         Rules:\n\
         {SQL_RULES}\n\
         \n\
         Question: {question}\n\
         \n\
         Return only the SQL query, no explanation.",
        season = ctx.current_season.unwrap_or("not set"),
        mappings = render_mappings(ctx.mappings),
        question = ctx.question,
    )
}

/// Prompt asking for a plain-language explanation of `sql`.
pub fn explanation_prompt(question: &str, sql: &str, mappings: &IndexMap<String, String>) -> String {
    format!(
        "Explain this SQL query in simple terms for someone learning SQL.\n\
         \n\
         Question: {question}\n\
         SQL: {sql}\n\
         \n\
         Football terms used:\n\
         {mappings}\n\
         \n\
         Give a brief, beginner-friendly explanation of what the query does and how it works.",
        mappings = render_mappings(mappings),
    )
}

/// Normalizes model output into a single statement.
///
/// Strips Markdown fences, collapses whitespace, moves a `WHERE` that follows
/// `GROUP BY` in front of it, and ends the statement with exactly one `;`.
pub fn clean_sql(raw: &str) -> String {
    let unfenced = FENCE.replace_all(raw, " ");
    let collapsed = unfenced.split_whitespace().collect::<Vec<_>>().join(" ");
    let body = collapsed.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if body.is_empty() {
        return String::new();
    }
    format!("{};", move_where_before_group_by(body))
}

/// `sql` with quoted text and everything inside brackets blanked out byte for
/// byte, so keyword offsets found in it are offsets of the outermost SELECT.
fn top_level(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut depth = 0usize;
    let mut quoted = false;
    for c in sql.chars() {
        let visible = match c {
            '\'' => {
                quoted = !quoted;
                false
            }
            _ if quoted => false,
            '(' => {
                depth += 1;
                false
            }
            ')' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        };
        if visible {
            out.push(c);
        } else {
            out.extend(std::iter::repeat_n(' ', c.len_utf8()));
        }
    }
    out
}

/// Reorders `... GROUP BY x WHERE y` in the outermost SELECT only; CTE bodies,
/// derived tables and subqueries are left as written.
fn move_where_before_group_by(sql: &str) -> String {
    let outer = top_level(sql);
    if COMPOUND.is_match(&outer) {
        return sql.to_string();
    }
    let (Some(group), Some(filter)) = (GROUP_BY.find(&outer), WHERE.find(&outer)) else {
        return sql.to_string();
    };
    if filter.start() < group.start() {
        return sql.to_string();
    }

    let filter_end = WHERE_END
        .find_at(&outer, filter.end())
        .map_or(sql.len(), |m| m.start());
    let clause = sql[filter.start()..filter_end].trim();
    let before = sql[..filter.start()].trim_end();
    let after = sql[filter_end..].trim_start();

    let mut out = format!(
        "{} {clause} {}",
        before[..group.start()].trim_end(),
        &before[group.start()..]
    );
    if !after.is_empty() {
        out.push(' ');
        out.push_str(after);
    }
    out
}

/// Accepts a single SELECT (or WITH ... SELECT) statement and nothing that writes.
pub fn ensure_read_only(sql: &str) -> Result<(), GenerationError> {
    let stripped = strip_literals(sql);
    let statement = stripped.trim().trim_end_matches(';');

    let head = statement
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_uppercase();
    if head != "SELECT" && head != "WITH" {
        let shown = if head.is_empty() { "nothing" } else { head.as_str() };
        return Err(GenerationError::NotReadOnly(format!("statement starts with {shown}")));
    }
    if statement.contains(';') {
        return Err(GenerationError::NotReadOnly("multiple statements".into()));
    }
    if let Some(m) = WRITE_KEYWORD.find(statement) {
        return Err(GenerationError::NotReadOnly(format!(
            "contains {}",
            m.as_str().to_uppercase()
        )));
    }
    Ok(())
}
