//! Heuristic classification of normalized patterns.
//!
//! Each classifier is an ordered rule list evaluated top to bottom on the
//! upper-cased pattern; the first matching rule wins.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComplexityType {
    #[serde(rename = "Complex JOIN")]
    ComplexJoin,
    #[serde(rename = "JOIN Query")]
    JoinQuery,
    #[serde(rename = "Single Table Search")]
    SingleTableSearch,
    #[serde(rename = "Simple SELECT")]
    SimpleSelect,
    #[serde(rename = "INSERT Operation")]
    InsertOperation,
    #[serde(rename = "UPDATE Operation")]
    UpdateOperation,
    #[serde(rename = "DELETE Operation")]
    DeleteOperation,
    Other,
}

impl ComplexityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityType::ComplexJoin => "Complex JOIN",
            ComplexityType::JoinQuery => "JOIN Query",
            ComplexityType::SingleTableSearch => "Single Table Search",
            ComplexityType::SimpleSelect => "Simple SELECT",
            ComplexityType::InsertOperation => "INSERT Operation",
            ComplexityType::UpdateOperation => "UPDATE Operation",
            ComplexityType::DeleteOperation => "DELETE Operation",
            ComplexityType::Other => "Other",
        }
    }
}

impl fmt::Display for ComplexityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndexUsageHint {
    #[serde(rename = "Likely Primary Key")]
    LikelyPrimaryKey,
    #[serde(rename = "Likely Indexed")]
    LikelyIndexed,
    #[serde(rename = "Potential Full Scan")]
    PotentialFullScan,
    #[serde(rename = "Sort Key Candidate")]
    SortKeyCandidate,
    #[serde(rename = "Unknown Index Usage")]
    Unknown,
}

impl IndexUsageHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexUsageHint::LikelyPrimaryKey => "Likely Primary Key",
            IndexUsageHint::LikelyIndexed => "Likely Indexed",
            IndexUsageHint::PotentialFullScan => "Potential Full Scan",
            IndexUsageHint::SortKeyCandidate => "Sort Key Candidate",
            IndexUsageHint::Unknown => "Unknown Index Usage",
        }
    }
}

impl fmt::Display for IndexUsageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

type Rule<T> = (fn(&str) -> bool, T);

fn has_join(q: &str) -> bool {
    q.contains("JOIN")
}

fn has_where_eq(q: &str) -> bool {
    q.contains("WHERE") && q.contains('=')
}

// JOIN + aggregation/ordering must precede plain JOIN.
const COMPLEXITY_RULES: &[Rule<ComplexityType>] = &[
    (
        |q| has_join(q) && ["GROUP BY", "ORDER BY", "HAVING"].iter().any(|k| q.contains(k)),
        ComplexityType::ComplexJoin,
    ),
    (has_join, ComplexityType::JoinQuery),
    (|q| q.contains("WHERE") || q.contains('='), ComplexityType::SingleTableSearch),
    (|q| q.starts_with("SELECT"), ComplexityType::SimpleSelect),
    (|q| q.starts_with("INSERT"), ComplexityType::InsertOperation),
    (|q| q.starts_with("UPDATE"), ComplexityType::UpdateOperation),
    (|q| q.starts_with("DELETE"), ComplexityType::DeleteOperation),
];

const INDEX_RULES: &[Rule<IndexUsageHint>] = &[
    (|q| has_where_eq(q) && q.contains("ID"), IndexUsageHint::LikelyPrimaryKey),
    (has_where_eq, IndexUsageHint::LikelyIndexed),
    (|q| q.contains("WHERE") && q.contains("LIKE"), IndexUsageHint::PotentialFullScan),
    (|q| q.contains("ORDER BY"), IndexUsageHint::SortKeyCandidate),
];

fn first_match<T: Copy>(rules: &[Rule<T>], pattern: &str, default: T) -> T {
    let upper = pattern.to_uppercase();
    rules
        .iter()
        .find(|(matches, _)| matches(&upper))
        .map(|(_, v)| *v)
        .unwrap_or(default)
}

pub fn classify_complexity(pattern: &str) -> ComplexityType {
    first_match(COMPLEXITY_RULES, pattern, ComplexityType::Other)
}

pub fn index_usage_hint(pattern: &str) -> IndexUsageHint {
    first_match(INDEX_RULES, pattern, IndexUsageHint::Unknown)
}
