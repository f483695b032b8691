use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Final layout pass over rendered SQL: whitespace runs collapse to one
/// space, spaces just inside parentheses and before commas go away, and
/// the ends are trimmed.
pub fn format_sql(sql: &str) -> String {
    WHITESPACE
        .replace_all(sql, " ")
        .replace("( ", "(")
        .replace(" )", ")")
        .replace(" ,", ",")
        .trim()
        .to_string()
}
