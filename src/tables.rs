use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::report::AnalysisRow;

static RE_TABLE_REFS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"FROM\s+(\w+)",
        r"JOIN\s+(\w+)",
        r"UPDATE\s+(\w+)",
        r"INSERT\s+INTO\s+(\w+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Keywords that can follow FROM/JOIN in subqueries and are not tables.
const NOT_TABLES: &[&str] = &["SELECT", "WHERE", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET"];

/// Lower-cased table names referenced by the sample statements of `rows`.
pub fn extract_table_names(rows: &[AnalysisRow]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for row in rows {
        let query = row.sample_query.to_uppercase();
        for re in RE_TABLE_REFS.iter() {
            for cap in re.captures_iter(&query) {
                let name = &cap[1];
                if !NOT_TABLES.contains(&name) {
                    names.insert(name.to_lowercase());
                }
            }
        }
    }
    names
}
