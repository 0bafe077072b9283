use regex::{Regex, RegexBuilder};
use tracing::debug;

/// One column's applied search predicate.
///
/// The expression is kept verbatim together with the flags it was applied
/// with; the matcher is compiled once when the query is set, not per cell.
#[derive(Debug, Clone)]
pub struct ColumnQuery {
    expression: String,
    regex: bool,
    smart: bool,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Empty query, matches every row.
    All,
    /// Whitespace-tolerant matching: every token must appear somewhere in
    /// the cell, case-insensitive, in any order.
    Smart(Vec<String>),
    /// Case-insensitive substring of the whole expression.
    Plain(String),
    Regex(Regex),
    /// A regex that failed to compile. Matches nothing rather than erroring
    /// out of the event handler.
    Never,
}

impl Default for ColumnQuery {
    fn default() -> Self {
        ColumnQuery::new("", false, true)
    }
}

impl ColumnQuery {
    pub fn new(expression: &str, regex: bool, smart: bool) -> Self {
        let matcher = if expression.is_empty() {
            Matcher::All
        } else if regex {
            match RegexBuilder::new(expression).case_insensitive(true).build() {
                Ok(re) => Matcher::Regex(re),
                Err(e) => {
                    debug!("Query \"{expression}\" does not compile: {e}");
                    Matcher::Never
                }
            }
        } else if smart {
            Matcher::Smart(
                expression
                    .split_whitespace()
                    .map(|t| t.to_lowercase())
                    .collect(),
            )
        } else {
            Matcher::Plain(expression.to_lowercase())
        };

        ColumnQuery {
            expression: expression.to_string(),
            regex,
            smart,
            matcher,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_regex(&self) -> bool {
        self.regex
    }

    pub fn is_smart(&self) -> bool {
        self.smart
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.matcher, Matcher::All)
    }

    pub fn matches(&self, cell: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Smart(tokens) => {
                let lower = cell.to_lowercase();
                tokens.iter().all(|t| lower.contains(t))
            }
            Matcher::Plain(needle) => cell.to_lowercase().contains(needle),
            Matcher::Regex(re) => re.is_match(cell),
            Matcher::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        let q = ColumnQuery::new("", false, true);
        assert!(q.is_empty());
        assert!(q.matches("anything"));
        assert!(q.matches(""));
    }

    #[test]
    fn smart_matching_is_token_based() {
        let q = ColumnQuery::new("new york", false, true);
        assert!(q.matches("New York City"));
        assert!(q.matches("york, NEW"));
        assert!(!q.matches("Newark"));
    }

    #[test]
    fn plain_matching_keeps_whitespace() {
        let q = ColumnQuery::new("new york", false, false);
        assert!(q.matches("greater New York area"));
        assert!(!q.matches("york, new"));
    }

    #[test]
    fn regex_matching_is_case_insensitive() {
        let q = ColumnQuery::new("^an+a?$", true, false);
        assert!(q.matches("Ann"));
        assert!(q.matches("ANNA"));
        assert!(!q.matches("Joanna"));
    }

    #[test]
    fn broken_regex_matches_nothing() {
        let q = ColumnQuery::new("((((30", true, false);
        assert!(!q.is_empty());
        assert!(!q.matches("30"));
        assert!(!q.matches("((((30"));
    }
}
