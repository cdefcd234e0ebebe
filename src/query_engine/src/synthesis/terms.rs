//! Football vocabulary to SQL fragments over the `matches` schema.
//!
//! Phrases are matched case-insensitively on word boundaries; a trailing `s`
//! is tolerated so "clean sheets" hits "clean sheet".

use indexmap::IndexMap;

const BIG_SIX: &[&str] = &[
    "Arsenal",
    "Chelsea",
    "Liverpool",
    "Man City",
    "Man United",
    "Tottenham",
];

const TEAM_GROUPS: &[(&str, &[&str])] = &[
    ("big six", BIG_SIX),
    ("big 6", BIG_SIX),
    (
        "london clubs",
        &["Arsenal", "Brentford", "Chelsea", "Crystal Palace", "Fulham", "Tottenham", "West Ham"],
    ),
    ("manchester clubs", &["Man City", "Man United"]),
    ("north london", &["Arsenal", "Tottenham"]),
    ("merseyside", &["Everton", "Liverpool"]),
];

const CONCEPTS: &[(&str, &str)] = &[
    ("clean sheet", "(home_goals = 0 OR away_goals = 0)"),
    ("hat trick", "(home_goals >= 3 OR away_goals >= 3)"),
    ("hattrick", "(home_goals >= 3 OR away_goals >= 3)"),
    ("goalless", "(home_goals = 0 AND away_goals = 0)"),
    ("nil-nil", "(home_goals = 0 AND away_goals = 0)"),
    ("high scoring", "(home_goals + away_goals) >= 5"),
    ("home win", "result = 'H'"),
    ("away win", "result = 'A'"),
    ("draw", "result = 'D'"),
    (
        "comeback",
        "((half_time_result = 'A' AND result = 'H') OR (half_time_result = 'H' AND result = 'A'))",
    ),
    ("red card", "(home_red_cards + away_red_cards) > 0"),
    ("sent off", "(home_red_cards + away_red_cards) > 0"),
    ("yellow card", "(home_yellow_cards + away_yellow_cards) > 0"),
    ("booking", "(home_yellow_cards + away_yellow_cards) > 0"),
];

const TIME_PERIODS: &[(&str, &str)] = &[
    (
        "this season",
        "season_id = (SELECT id FROM seasons WHERE is_current = 1)",
    ),
    (
        "current season",
        "season_id = (SELECT id FROM seasons WHERE is_current = 1)",
    ),
    (
        "last season",
        "season_id = (SELECT id FROM seasons WHERE end_date < (SELECT start_date FROM seasons WHERE is_current = 1) ORDER BY end_date DESC LIMIT 1)",
    ),
    (
        "previous season",
        "season_id = (SELECT id FROM seasons WHERE end_date < (SELECT start_date FROM seasons WHERE is_current = 1) ORDER BY end_date DESC LIMIT 1)",
    ),
    ("december", "strftime('%m', kickoff) = '12'"),
    ("january", "strftime('%m', kickoff) = '01'"),
    ("festive period", "strftime('%m', kickoff) IN ('12', '01')"),
    ("boxing day", "strftime('%m-%d', kickoff) = '12-26'"),
];

const METRICS: &[(&str, &str)] = &[
    ("most goals", "ORDER BY (home_goals + away_goals) DESC"),
    (
        "most cards",
        "ORDER BY (home_yellow_cards + away_yellow_cards + home_red_cards + away_red_cards) DESC",
    ),
    ("most shots", "ORDER BY (home_shots + away_shots) DESC"),
    ("most corners", "ORDER BY (home_corners + away_corners) DESC"),
    ("most fouls", "ORDER BY (home_fouls + away_fouls) DESC"),
    ("biggest win", "ORDER BY ABS(home_goals - away_goals) DESC"),
];

const AGGREGATIONS: &[(&str, &str)] = &[
    ("total", "SUM"),
    ("average", "AVG"),
    ("mean", "AVG"),
    ("maximum", "MAX"),
    ("minimum", "MIN"),
    ("count", "COUNT"),
    ("number of", "COUNT"),
    ("how many", "COUNT"),
];

/// Ordered phrase table.
#[derive(Debug, Clone)]
pub struct TermMapper {
    entries: IndexMap<String, String>,
}

impl Default for TermMapper {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TermMapper {
    /// Team groups, concepts, time periods, metrics and aggregations, in that order.
    pub fn builtin() -> Self {
        let mut entries = IndexMap::new();
        for (group, teams) in TEAM_GROUPS {
            let list = teams
                .iter()
                .map(|t| format!("'{t}'"))
                .collect::<Vec<_>>()
                .join(", ");
            entries.insert(
                group.to_string(),
                format!("(home_team IN ({list}) OR away_team IN ({list}))"),
            );
        }
        for (phrase, sql) in CONCEPTS
            .iter()
            .chain(TIME_PERIODS)
            .chain(METRICS)
            .chain(AGGREGATIONS)
        {
            entries.insert(phrase.to_string(), sql.to_string());
        }
        Self { entries }
    }

    /// Adds or replaces a phrase; new phrases go last.
    pub fn with_term(mut self, phrase: &str, sql: &str) -> Self {
        self.entries.insert(phrase.trim().to_lowercase(), sql.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Phrases found in `question`, in table order.
    pub fn map(&self, question: &str) -> IndexMap<String, String> {
        let lowered = question.to_lowercase();
        self.entries
            .iter()
            .filter(|(phrase, _)| contains_phrase(&lowered, phrase))
            .map(|(phrase, sql)| (phrase.clone(), sql.clone()))
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, m)| {
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        let mut after = haystack[start + m.len()..].chars();
        let after_ok = match after.next() {
            None => true,
            Some('s') => after.next().is_none_or(|c| !is_word_char(c)),
            Some(c) => !is_word_char(c),
        };
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_phrases_in_table_order() {
        let mapper = TermMapper::builtin();
        let found = mapper.map("Average goals in big six clean sheets this season?");
        let phrases: Vec<_> = found.keys().map(String::as_str).collect();
        assert_eq!(phrases, ["big six", "clean sheet", "this season", "average"]);
        assert_eq!(found["clean sheet"], "(home_goals = 0 OR away_goals = 0)");
        assert!(found["big six"].starts_with("(home_team IN ('Arsenal', "));
    }

    #[test]
    fn respects_word_boundaries() {
        let mapper = TermMapper::builtin();
        assert!(mapper.map("which country scores most").is_empty());
        assert!(mapper.map("the drawing board").is_empty());
        assert_eq!(mapper.map("how many draws?").keys().collect::<Vec<_>>(), ["draw", "how many"]);
    }

    #[test]
    fn custom_terms_append() {
        let mapper = TermMapper::builtin().with_term("Six Pointer", "1 = 1");
        assert_eq!(mapper.len(), TermMapper::builtin().len() + 1);
        assert_eq!(mapper.map("a six pointer").get("six pointer").map(String::as_str), Some("1 = 1"));
    }
}
