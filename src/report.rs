use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::classify::{classify_complexity, index_usage_hint, ComplexityType, IndexUsageHint};
use crate::parser::{self, LogFormat, LogReadError, LogRecord};
use crate::patterns::{self, PatternBucket, PatternSet};
use crate::tables;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub query_pattern: String,
    pub frequency: usize,
    pub calculated_rps: f64,
    pub complexity_type: ComplexityType,
    pub index_usage_hint: IndexUsageHint,
    pub sample_query: String,
}

impl AnalysisRow {
    pub fn from_bucket(bucket: &PatternBucket, analysis_days: i64) -> Self {
        Self {
            query_pattern: bucket.pattern.clone(),
            frequency: bucket.frequency,
            calculated_rps: calculated_rps(bucket.frequency, analysis_days),
            complexity_type: classify_complexity(&bucket.pattern),
            index_usage_hint: index_usage_hint(&bucket.pattern),
            sample_query: bucket.sample_query(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub format: Option<LogFormat>,
    pub total_records: usize,
    pub unique_patterns: usize,
    pub analysis_days: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Records whose timestamp fell back to ingestion time.
    pub fallback_timestamps: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub patterns: Vec<AnalysisRow>,
    pub tables: BTreeSet<String>,
}

/// Whole days spanned by `[min, max]`, counting the first day; at least 1.
pub fn analysis_days(bounds: Option<(DateTime<Utc>, DateTime<Utc>)>) -> i64 {
    match bounds {
        Some((min, max)) => ((max - min).num_days() + 1).max(1),
        None => 1,
    }
}

pub fn calculated_rps(frequency: usize, analysis_days: i64) -> f64 {
    let total_seconds = analysis_days as f64 * SECONDS_PER_DAY;
    round4(frequency as f64 / total_seconds)
}

/// Four decimals, rounded on the exact binary value with ties to even.
fn round4(x: f64) -> f64 {
    format!("{x:.4}").parse().unwrap_or(x)
}

/// Rank buckets by frequency, descending. Ties keep first-occurrence order.
pub fn rank_patterns(set: &PatternSet) -> Vec<AnalysisRow> {
    let days = analysis_days(set.time_bounds());
    let mut rows: Vec<AnalysisRow> = set
        .buckets()
        .iter()
        .map(|b| AnalysisRow::from_bucket(b, days))
        .collect();
    // stable sort
    rows.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    rows
}

pub fn analyze_query_patterns(records: Vec<LogRecord>) -> Vec<AnalysisRow> {
    rank_patterns(&patterns::aggregate(records))
}

pub fn analyze_lines<S: AsRef<str>>(lines: &[S]) -> AnalysisReport {
    analyze_lines_at(lines, Utc::now())
}

pub fn analyze_lines_at<S: AsRef<str>>(lines: &[S], now: DateTime<Utc>) -> AnalysisReport {
    let (format, records) = parser::parse_lines_detected(lines, now);
    let fallback_timestamps = records.iter().filter(|r| r.timestamp_fallback).count();

    let set = patterns::aggregate(records);
    let bounds = set.time_bounds();
    let rows = rank_patterns(&set);
    let tables = tables::extract_table_names(&rows);
    debug!(
        records = set.total_records(),
        patterns = set.len(),
        fallback_timestamps,
        "analysis complete"
    );

    AnalysisReport {
        summary: Summary {
            format,
            total_records: set.total_records(),
            unique_patterns: set.len(),
            analysis_days: analysis_days(bounds),
            start_date: bounds.map(|(min, _)| fmt_ts(min)),
            end_date: bounds.map(|(_, max)| fmt_ts(max)),
            fallback_timestamps,
        },
        patterns: rows,
        tables,
    }
}

pub fn analyze_log_file(path: impl AsRef<Path>) -> Result<AnalysisReport, LogReadError> {
    let lines = parser::read_log_lines(path.as_ref())?;
    Ok(analyze_lines(&lines))
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
