//! Query rewriting for search precision.
//!
//! All functions here are total over string input: they never fail, they only
//! transform. Three rewrites exist, applied in tool-specific combinations:
//! account-name quoting, alias expansion, and temporal-expression extraction.

use chrono::{Duration, Utc};

use crate::aliases::AliasTable;
use crate::filters::FacetFilter;

/// Document field the temporal filters compare against.
pub const LAST_UPDATED_FIELD: &str = "last_updated_at";

/// Words that end the leading account-name span in `quote_account_name`.
/// Closed vocabulary; extend here, not at call sites.
const ACTION_WORDS: &[&str] = &[
    "renewal",
    "renew",
    "contract",
    "opportunity",
    "deal",
    "contact",
    "contacts",
    "stakeholder",
    "decision",
    "account",
    "company",
    "info",
    "overview",
    "call",
    "calls",
    "meeting",
    "email",
    "slack",
    "qbr",
    "ebr",
    "plan",
    "strategy",
    "doc",
    "metric",
    "metrics",
    "dashboard",
    "spend",
    "funding",
    "key",
    "recent",
    "last",
    "latest",
    "upcoming",
];

/// Wraps the leading run of non-action words in quotes so the search engine
/// treats a multi-word account name as a single phrase.
///
/// Idempotent: a query that already starts with a quote is returned
/// unchanged. A query with no leading non-action words is also unchanged.
pub fn quote_account_name(query: &str) -> String {
    if query.starts_with('"') {
        return query.to_string();
    }

    let mut account_words = Vec::new();
    let mut rest_words = Vec::new();
    let mut found_action = false;

    for word in query.split_whitespace() {
        let is_action = ACTION_WORDS.contains(&word.to_ascii_lowercase().as_str());
        if !found_action && !is_action {
            account_words.push(word);
        } else {
            found_action = true;
            rest_words.push(word);
        }
    }

    if account_words.is_empty() {
        return query.to_string();
    }

    let mut quoted = format!("\"{}\"", account_words.join(" "));
    if !rest_words.is_empty() {
        quoted.push(' ');
        quoted.push_str(&rest_words.join(" "));
    }
    quoted
}

/// Replaces the first alias-table match in `query` with an OR-of-quoted-names
/// clause covering the canonical name and every known alias.
///
/// Only the first matching table key (in table order) is expanded; a query
/// mentioning two distinct accounts expands one. This mirrors the deployed
/// behavior and is accepted, not a bug to fix silently.
pub fn expand_account_aliases(query: &str, table: &AliasTable) -> String {
    match table.first_match(query) {
        Some(matched) => {
            format!("{}{}{}", &query[..matched.start], matched.or_clause, &query[matched.end..])
        }
        None => query.to_string(),
    }
}

/// Symbolic date buckets understood by the search backend, checked in
/// priority order before the computed `last N days` pattern.
const BUCKET_PATTERNS: &[(&[&str], &str)] = &[
    (&["last|past", "week"], "past_week"),
    (&["last|past", "month"], "past_month"),
    (&["last|past", "day"], "past_day"),
    (&["today"], "today"),
    (&["yesterday"], "yesterday"),
    (&["recent|recently"], "past_week"),
];

/// Extracts a temporal expression from `query`, returning the query with the
/// matched words removed (whitespace collapsed) plus the date filter, if any.
///
/// Exactly one pattern produces a filter per call, selected by declared
/// priority rather than position in the text. `last N days` is only
/// considered when no symbolic bucket matched; it computes an absolute start
/// date of now minus N days and emits a greater-than filter.
pub fn parse_time_expression(query: &str) -> (String, Option<Vec<FacetFilter>>) {
    let words: Vec<&str> = query.split_whitespace().collect();
    let normalized: Vec<String> = words.iter().map(|word| normalize_word(word)).collect();

    for (pattern, bucket) in BUCKET_PATTERNS {
        if let Some(start) = find_pattern(&normalized, pattern) {
            let cleaned = remove_words(&words, start, pattern.len());
            let filter = vec![FacetFilter::equals(LAST_UPDATED_FIELD, bucket)];
            return (cleaned, Some(filter));
        }
    }

    if let Some((start, days)) = find_days_pattern(&normalized) {
        if let Some(start_date) = start_date_days_ago(days) {
            let cleaned = remove_words(&words, start, 3);
            let filter = vec![FacetFilter::greater_than(LAST_UPDATED_FIELD, &start_date)];
            return (cleaned, Some(filter));
        }
    }

    (words.join(" "), None)
}

/// `None` when `days` is outside chrono's representable range; the caller
/// then emits no filter instead of panicking on a nonsense day count.
fn start_date_days_ago(days: i64) -> Option<String> {
    let delta = Duration::try_days(days)?;
    let start = Utc::now().checked_sub_signed(delta)?;
    Some(start.format("%Y-%m-%d").to_string())
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|ch: char| !ch.is_ascii_alphanumeric()).to_ascii_lowercase()
}

fn word_matches(normalized: &str, alternatives: &str) -> bool {
    alternatives.split('|').any(|alternative| normalized == alternative)
}

fn find_pattern(normalized: &[String], pattern: &[&str]) -> Option<usize> {
    if normalized.len() < pattern.len() {
        return None;
    }
    (0..=normalized.len() - pattern.len()).find(|&start| {
        pattern
            .iter()
            .enumerate()
            .all(|(offset, alternatives)| word_matches(&normalized[start + offset], alternatives))
    })
}

/// Finds `{last|past} N days?` and returns the start index and parsed N.
fn find_days_pattern(normalized: &[String]) -> Option<(usize, i64)> {
    if normalized.len() < 3 {
        return None;
    }
    for start in 0..=normalized.len() - 3 {
        if !word_matches(&normalized[start], "last|past") {
            continue;
        }
        let Ok(days) = normalized[start + 1].parse::<i64>() else {
            continue;
        };
        if word_matches(&normalized[start + 2], "day|days") {
            return Some((start, days));
        }
    }
    None
}

fn remove_words(words: &[&str], start: usize, count: usize) -> String {
    words
        .iter()
        .enumerate()
        .filter(|(index, _)| *index < start || *index >= start + count)
        .map(|(_, word)| *word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{expand_account_aliases, parse_time_expression, quote_account_name};
    use crate::aliases::AliasTable;
    use crate::filters::RelationType;

    #[test]
    fn quotes_leading_account_name_before_action_words() {
        assert_eq!(quote_account_name("JPMorgan Chase renewal"), "\"JPMorgan Chase\" renewal");
        assert_eq!(
            quote_account_name("Baylor Scott White upcoming qbr"),
            "\"Baylor Scott White\" upcoming qbr"
        );
    }

    #[test]
    fn quoting_is_idempotent() {
        let once = quote_account_name("AdventHealth contract status");
        let twice = quote_account_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn query_with_only_action_words_is_unchanged() {
        assert_eq!(quote_account_name("recent renewal metrics"), "recent renewal metrics");
    }

    #[test]
    fn query_with_no_action_words_is_fully_quoted() {
        assert_eq!(quote_account_name("Din Tai Fung"), "\"Din Tai Fung\"");
    }

    #[test]
    fn expands_first_alias_into_or_clause() {
        let expanded = expand_account_aliases("JPMC renewal", AliasTable::shared());

        assert!(expanded.contains("(\"JPMorgan Chase\" OR \"JPMC\" OR \"JPM\""));
        assert_eq!(expanded.matches("JPMorgan Chase").count(), 1);
        assert!(expanded.ends_with(" renewal"));
    }

    #[test]
    fn expansion_without_table_match_is_identity() {
        let table = AliasTable::shared();
        assert_eq!(expand_account_aliases("Initech renewal", table), "Initech renewal");
    }

    #[test]
    fn only_the_first_account_mention_is_expanded() {
        let table = AliasTable::from_pairs(&[("Tesla", &[]), ("Ford", &["Ford Motor"])]);
        let expanded = expand_account_aliases("Tesla and Ford contacts", &table);

        assert_eq!(expanded, "(\"Tesla\") and Ford contacts");
    }

    #[test]
    fn extracts_symbolic_week_bucket_and_cleans_query() {
        let (cleaned, filter) = parse_time_expression("AdventHealth calls last week");

        assert_eq!(cleaned, "AdventHealth calls");
        let filter = filter.expect("week expression should produce a filter");
        assert_eq!(filter.len(), 1);
        assert_eq!(filter[0].field_name, "last_updated_at");
        assert_eq!(filter[0].values[0].relation_type, RelationType::Equals);
        assert_eq!(filter[0].values[0].value, "past_week");
    }

    #[test]
    fn recently_maps_to_past_week() {
        let (cleaned, filter) = parse_time_expression("Walmart escalations recently");
        assert_eq!(cleaned, "Walmart escalations");
        assert_eq!(filter.expect("filter")[0].values[0].value, "past_week");
    }

    #[test]
    fn symbolic_buckets_win_over_the_days_pattern() {
        let (_, filter) = parse_time_expression("calls last week and last 30 days");
        assert_eq!(filter.expect("filter")[0].values[0].value, "past_week");
    }

    #[test]
    fn last_n_days_computes_greater_than_start_date() {
        let before = (Utc::now() - Duration::days(15)).format("%Y-%m-%d").to_string();
        let (cleaned, filter) = parse_time_expression("renewals last 15 days");
        let after = (Utc::now() - Duration::days(15)).format("%Y-%m-%d").to_string();

        assert_eq!(cleaned, "renewals");
        let filter = filter.expect("days expression should produce a filter");
        assert_eq!(filter[0].values[0].relation_type, RelationType::Gt);
        let value = &filter[0].values[0].value;
        assert!(
            *value == before || *value == after,
            "start date {value} should be 15 days before the call"
        );
    }

    #[test]
    fn absurd_day_counts_produce_no_filter_instead_of_overflowing() {
        let (cleaned, filter) = parse_time_expression("renewals last 100000000 days");
        assert_eq!(cleaned, "renewals last 100000000 days");
        assert!(filter.is_none());

        let (_, filter) = parse_time_expression("renewals last 9223372036854775807 days");
        assert!(filter.is_none());
    }

    #[test]
    fn no_temporal_expression_normalizes_whitespace_only() {
        let (cleaned, filter) = parse_time_expression("  Tesla   open   issues ");
        assert_eq!(cleaned, "Tesla open issues");
        assert!(filter.is_none());
    }
}
