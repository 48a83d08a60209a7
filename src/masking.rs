use once_cell::sync::Lazy;
use regex::Regex;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Non-greedy literal runs; escaped quotes are not special.
static RE_SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*'").unwrap());

static RE_DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());

static RE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

/// Canonicalize a SQL statement into the pattern used as its grouping key.
///
/// Whitespace runs collapse to one space, quoted literals become `'?'` / `"?"`
/// and bare integers become `?`. Applying it twice yields the same text.
pub fn normalize_query(query: &str) -> String {
    // Order matters: literals first so digits inside them are already gone
    let s = collapse_whitespace(query);
    let s = RE_SINGLE_QUOTED.replace_all(&s, "'?'");
    let s = RE_DOUBLE_QUOTED.replace_all(&s, "\"?\"");
    let s = RE_INT.replace_all(&s, "?");
    s.into_owned()
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").into_owned()
}
