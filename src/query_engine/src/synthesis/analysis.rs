//! Static inspection of generated SQL: feature detection, optimisation hints
//! and a coarse performance tier.
//!
//! Detection is regex based and runs on the SQL with string literals blanked,
//! so `WHERE referee = 'A Taylor OR'` is not mistaken for an `OR` condition.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static STRING_LITERAL: LazyLock<Regex> = LazyLock::new(|| re(r"'(?:[^']|'')*'"));
static WHERE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bWHERE\b"));
static FILTER_END: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:GROUP\s+BY|HAVING|ORDER\s+BY|LIMIT)\b"));
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:id|[a-z0-9_]+_id)\b"));
static SELECT_STAR: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bSELECT\s+(?:DISTINCT\s+)?(?:[a-z_][a-z0-9_]*\.)?\*"));
static ORDER_BY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bORDER\s+BY\b"));
static LIMIT: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bLIMIT\b"));
static SUBSELECT: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:IN|FROM)\s*\(\s*SELECT\b"));
static JOIN: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bJOIN\b"));
static AGGREGATION: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:COUNT|SUM|AVG|MIN|MAX)\s*\(|\bGROUP\s+BY\b"));
static DISTINCT: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bDISTINCT\b"));
static OR: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bOR\b"));
static TABLE_REF: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:FROM|JOIN)\s+([a-z_][a-z0-9_]*)"));

/// Replaces every single-quoted literal with `''`.
pub(crate) fn strip_literals(sql: &str) -> String {
    STRING_LITERAL.replace_all(sql, "''").into_owned()
}

/// What a statement does, as far as regexes can tell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryFeatures {
    pub has_filter: bool,
    /// The WHERE clause names `id` or a `*_id` column.
    pub filters_on_identifier: bool,
    pub select_star: bool,
    pub has_order_by: bool,
    pub has_limit: bool,
    pub has_subselect: bool,
    pub has_join: bool,
    pub has_aggregation: bool,
    pub has_distinct: bool,
    pub or_conditions: usize,
    /// Tables after FROM / JOIN, lowercase, first appearance order.
    pub tables: Vec<String>,
}

impl QueryFeatures {
    pub fn detect(sql: &str) -> Self {
        let sql = strip_literals(sql);

        let filter = WHERE.find(&sql).map(|w| {
            let end = FILTER_END
                .find_at(&sql, w.end())
                .map_or(sql.len(), |m| m.start());
            &sql[w.end()..end]
        });

        let mut tables: Vec<String> = Vec::new();
        for cap in TABLE_REF.captures_iter(&sql) {
            let name = cap[1].to_lowercase();
            if !tables.contains(&name) {
                tables.push(name);
            }
        }

        Self {
            has_filter: filter.is_some(),
            filters_on_identifier: filter.is_some_and(|f| IDENTIFIER.is_match(f)),
            select_star: SELECT_STAR.is_match(&sql),
            has_order_by: ORDER_BY.is_match(&sql),
            has_limit: LIMIT.is_match(&sql),
            has_subselect: SUBSELECT.is_match(&sql),
            has_join: JOIN.is_match(&sql),
            has_aggregation: AGGREGATION.is_match(&sql),
            has_distinct: DISTINCT.is_match(&sql),
            or_conditions: OR.find_iter(&sql).count(),
            tables,
        }
    }
}

/// Optimisation hints, at most one per check, in a fixed order.
pub fn suggestions(features: &QueryFeatures) -> Vec<String> {
    let checks: [(bool, &str); 6] = [
        (
            features.has_filter && !features.filters_on_identifier,
            "Filter does not use an indexed identifier column (id or *_id); expect a scan on large tables",
        ),
        (
            features.select_star,
            "Select only the columns you need instead of SELECT *",
        ),
        (
            features.has_order_by && !features.has_limit,
            "ORDER BY without LIMIT sorts the whole result; add a LIMIT",
        ),
        (
            features.has_subselect,
            "Nested SELECT could be rewritten as a JOIN",
        ),
        (
            features.has_distinct,
            "Consider whether GROUP BY would be more efficient than DISTINCT",
        ),
        (
            features.or_conditions >= 2,
            "Replace repeated OR conditions with IN (...)",
        ),
    ];
    checks
        .into_iter()
        .filter(|(fires, _)| *fires)
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Expected cost class of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Fastest,
    Fast,
    Moderate,
    Variable,
}

impl PerformanceTier {
    /// First matching rule wins: no join with LIMIT, join without aggregation,
    /// any aggregation, anything else.
    pub fn classify(features: &QueryFeatures) -> Self {
        if !features.has_join && features.has_limit {
            Self::Fastest
        } else if features.has_join && !features.has_aggregation {
            Self::Fast
        } else if features.has_aggregation {
            Self::Moderate
        } else {
            Self::Variable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_do_not_trigger_keywords() {
        let f = QueryFeatures::detect(
            "SELECT kickoff FROM matches WHERE referee = 'Smith OR Jones JOIN' LIMIT 5",
        );
        assert_eq!(f.or_conditions, 0);
        assert!(!f.has_join);
        assert!(f.has_filter);
        assert_eq!(f.tables, ["matches"]);
    }

    #[test]
    fn identifier_filter_is_scoped_to_where_clause() {
        let joined = QueryFeatures::detect(
            "SELECT m.kickoff FROM matches m JOIN seasons s ON s.id = m.season_id WHERE m.result = 'H' ORDER BY m.kickoff DESC",
        );
        assert!(joined.has_filter);
        assert!(!joined.filters_on_identifier);
        assert_eq!(joined.tables, ["matches", "seasons"]);

        let by_season = QueryFeatures::detect("SELECT * FROM matches WHERE season_id = 3");
        assert!(by_season.filters_on_identifier);
    }

    #[test]
    fn suggestions_follow_check_order() {
        let f = QueryFeatures::detect(
            "SELECT DISTINCT * FROM matches WHERE home_team IN (SELECT home_team FROM matches WHERE result = 'H') OR referee = 'X' OR referee = 'Y' ORDER BY kickoff",
        );
        assert_eq!(
            suggestions(&f),
            [
                "Filter does not use an indexed identifier column (id or *_id); expect a scan on large tables",
                "Select only the columns you need instead of SELECT *",
                "ORDER BY without LIMIT sorts the whole result; add a LIMIT",
                "Nested SELECT could be rewritten as a JOIN",
                "Consider whether GROUP BY would be more efficient than DISTINCT",
                "Replace repeated OR conditions with IN (...)",
            ]
        );

        let clean = QueryFeatures::detect("SELECT home_team FROM matches WHERE id = 7 LIMIT 1");
        assert!(suggestions(&clean).is_empty());
    }

    #[test]
    fn count_star_is_not_select_star() {
        let f = QueryFeatures::detect("SELECT COUNT(*) FROM matches");
        assert!(!f.select_star);
        assert!(f.has_aggregation);
        assert!(QueryFeatures::detect("SELECT m.* FROM matches m").select_star);
    }

    #[test]
    fn tiers_apply_in_rule_order() {
        let tier = |sql: &str| PerformanceTier::classify(&QueryFeatures::detect(sql));
        assert_eq!(tier("SELECT COUNT(*) FROM matches LIMIT 1"), PerformanceTier::Fastest);
        assert_eq!(
            tier("SELECT m.id FROM matches m JOIN seasons s ON s.id = m.season_id LIMIT 5"),
            PerformanceTier::Fast
        );
        assert_eq!(
            tier("SELECT s.name, COUNT(*) FROM matches m JOIN seasons s ON s.id = m.season_id GROUP BY s.name"),
            PerformanceTier::Moderate
        );
        assert_eq!(tier("SELECT referee FROM matches"), PerformanceTier::Variable);
        assert_eq!(
            serde_json::to_string(&PerformanceTier::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
