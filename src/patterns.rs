use ahash::AHashMap;
use chrono::{DateTime, Utc};

use crate::masking::normalize_query;
use crate::parser::LogRecord;

/// Longest sample statement kept in a report, in characters.
pub const SAMPLE_QUERY_MAX_CHARS: usize = 200;

/// Aggregate state for one normalized pattern.
#[derive(Debug, Clone)]
pub struct PatternBucket {
    pub pattern: String,
    pub frequency: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// In arrival order; never empty.
    pub member_records: Vec<LogRecord>,
}

impl PatternBucket {
    fn new(pattern: String, record: LogRecord) -> Self {
        Self {
            pattern,
            frequency: 1,
            first_seen: record.timestamp,
            last_seen: record.timestamp,
            member_records: vec![record],
        }
    }

    fn add(&mut self, record: LogRecord) {
        self.frequency += 1;
        self.first_seen = self.first_seen.min(record.timestamp);
        self.last_seen = self.last_seen.max(record.timestamp);
        self.member_records.push(record);
    }

    /// Statement text of the first member, cut to 200 characters plus `...`.
    pub fn sample_query(&self) -> String {
        let text = self
            .member_records
            .first()
            .map(|r| r.query_text.as_str())
            .unwrap_or_default();
        if text.chars().count() > SAMPLE_QUERY_MAX_CHARS {
            let mut s: String = text.chars().take(SAMPLE_QUERY_MAX_CHARS).collect();
            s.push_str("...");
            s
        } else {
            text.to_string()
        }
    }
}

/// Buckets keyed by pattern, kept in order of first occurrence.
#[derive(Debug, Default)]
pub struct PatternSet {
    buckets: Vec<PatternBucket>,
    index: AHashMap<String, usize>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: LogRecord) {
        let pattern = normalize_query(&record.query_text);
        match self.index.get(&pattern).copied() {
            Some(i) => self.buckets[i].add(record),
            None => {
                self.index.insert(pattern.clone(), self.buckets.len());
                self.buckets.push(PatternBucket::new(pattern, record));
            }
        }
    }

    pub fn get(&self, pattern: &str) -> Option<&PatternBucket> {
        self.index.get(pattern).map(|&i| &self.buckets[i])
    }

    pub fn buckets(&self) -> &[PatternBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.buckets.iter().map(|b| b.frequency).sum()
    }

    /// Earliest and latest timestamp across every bucket.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let min = self.buckets.iter().map(|b| b.first_seen).min()?;
        let max = self.buckets.iter().map(|b| b.last_seen).max()?;
        Some((min, max))
    }
}

pub fn aggregate(records: impl IntoIterator<Item = LogRecord>) -> PatternSet {
    let mut set = PatternSet::new();
    for rec in records {
        set.push(rec);
    }
    set
}
