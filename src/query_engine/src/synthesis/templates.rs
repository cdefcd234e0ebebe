//! Canned queries for when no completion provider is configured (or it fails).

use std::num::NonZeroU32;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::synthesis::QuerySource;
use crate::synthesis::generator::{GenerationContext, Generated, QueryGenerator};

/// A fixed query selected by keywords in the question.
#[derive(Debug)]
pub struct Template {
    pub intent: &'static str,
    /// Any of these, case-insensitively, selects the template.
    pub keywords: &'static [&'static str],
    sql: &'static str,
    explanation: &'static str,
}

impl Template {
    /// SQL with the row limit filled in.
    pub fn render(&self, limit: NonZeroU32) -> String {
        self.sql.replace("{limit}", &limit.to_string())
    }

    fn matches(&self, lowered_question: &str) -> bool {
        self.keywords.iter().any(|k| lowered_question.contains(k))
    }
}

/// Checked in order; the first hit wins.
pub const TEMPLATES: &[Template] = &[
    Template {
        intent: "most-goals",
        keywords: &["most goals"],
        sql: "SELECT kickoff, home_team, away_team, home_goals, away_goals, home_goals + away_goals AS total_goals \
              FROM matches WHERE home_goals IS NOT NULL AND away_goals IS NOT NULL \
              ORDER BY total_goals DESC, kickoff DESC LIMIT {limit};",
        explanation: "Lists played matches ordered by combined goals, highest first.",
    },
    Template {
        intent: "most-cards",
        keywords: &["most cards"],
        sql: "SELECT kickoff, home_team, away_team, referee, \
              home_yellow_cards + away_yellow_cards + home_red_cards + away_red_cards AS total_cards \
              FROM matches WHERE home_yellow_cards IS NOT NULL AND away_yellow_cards IS NOT NULL \
              AND home_red_cards IS NOT NULL AND away_red_cards IS NOT NULL \
              ORDER BY total_cards DESC, kickoff DESC LIMIT {limit};",
        explanation: "Lists matches ordered by yellow plus red cards shown, highest first.",
    },
    Template {
        intent: "recent",
        keywords: &["recent", "latest"],
        sql: "SELECT kickoff, home_team, away_team, home_goals, away_goals, result \
              FROM matches WHERE result IS NOT NULL ORDER BY kickoff DESC LIMIT {limit};",
        explanation: "Lists the most recently completed matches.",
    },
    Template {
        intent: "home-win",
        keywords: &["home win"],
        sql: "SELECT kickoff, home_team, away_team, home_goals, away_goals \
              FROM matches WHERE result = 'H' ORDER BY kickoff DESC LIMIT {limit};",
        explanation: "Lists the latest matches won by the home team.",
    },
];

/// Used when nothing else matches, and as the failure fallback.
pub const GENERIC: Template = Template {
    intent: "generic",
    keywords: &[],
    sql: "SELECT * FROM matches ORDER BY kickoff DESC LIMIT {limit};",
    explanation: "Shows the most recent matches.",
};

const FALLBACK_EXPLANATION: &str =
    "The query service could not answer this question, so this shows the most recent matches.";

/// The first template whose keywords appear in `question`, else [`GENERIC`].
pub fn select(question: &str) -> &'static Template {
    let lowered = question.to_lowercase();
    TEMPLATES
        .iter()
        .find(|t| t.matches(&lowered))
        .unwrap_or(&GENERIC)
}

/// The generic query, marked as a fallback.
pub fn fallback(limit: NonZeroU32) -> Generated {
    Generated {
        sql: GENERIC.render(limit),
        explanation: FALLBACK_EXPLANATION.to_string(),
        source: QuerySource::Fallback,
    }
}

/// Keyword-driven generator; never fails.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    limit: NonZeroU32,
}

impl TemplateGenerator {
    pub fn new(limit: NonZeroU32) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl QueryGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Generated, GenerationError> {
        let template = select(ctx.question);
        Ok(Generated {
            sql: template.render(self.limit),
            explanation: template.explanation.to_string(),
            source: QuerySource::Template,
        })
    }
}
