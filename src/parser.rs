use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{multiline, tabular};

#[derive(Debug, Error)]
pub enum LogReadError {
    #[error("failed to read log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Header-delimited export of a general-log table.
    TabularExtract,
    /// Line-oriented general log with continuation lines.
    FreeForm,
}

/// Header tokens that identify a tabular export on its first line.
const TABULAR_MARKERS: &[&str] = &["EVENT_TIME", "ARGUMENT", "COMMAND_TYPE", "USER_HOST"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query,
    Execute,
    Prepare,
    Other(String),
}

impl Command {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Query" => Command::Query,
            "Execute" => Command::Execute,
            "Prepare" => Command::Prepare,
            other => Command::Other(other.to_string()),
        }
    }

    /// Commands that carry statement text worth analysing.
    pub fn is_statement(&self) -> bool {
        !matches!(self, Command::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Command::Query => "Query",
            Command::Execute => "Execute",
            Command::Prepare => "Prepare",
            Command::Other(s) => s,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed statement execution.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub connection_id: String,
    pub command: Command,
    pub query_text: String,
    /// Set when the source timestamp was unparseable and ingestion time was used.
    pub timestamp_fallback: bool,
}

/// Pick the extraction strategy from the first line. `None` when there are no lines.
pub fn detect_format<S: AsRef<str>>(lines: &[S]) -> Option<LogFormat> {
    let first = lines.first()?.as_ref().trim().to_uppercase();
    if TABULAR_MARKERS.iter().any(|m| first.contains(m)) {
        Some(LogFormat::TabularExtract)
    } else {
        Some(LogFormat::FreeForm)
    }
}

pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LogRecord> {
    parse_lines_at(lines, Utc::now())
}

/// Parse with an explicit fallback instant for unparseable timestamps.
pub fn parse_lines_at<S: AsRef<str>>(lines: &[S], now: DateTime<Utc>) -> Vec<LogRecord> {
    parse_lines_detected(lines, now).1
}

/// Detect the format once and parse with it, returning both.
pub fn parse_lines_detected<S: AsRef<str>>(
    lines: &[S],
    now: DateTime<Utc>,
) -> (Option<LogFormat>, Vec<LogRecord>) {
    let format = detect_format(lines);
    let records = match format {
        None => Vec::new(),
        Some(LogFormat::TabularExtract) => tabular::parse_tabular_extract(lines, now),
        Some(LogFormat::FreeForm) => multiline::parse_free_form(lines, now),
    };
    (format, records)
}

pub fn parse_log_file(path: impl AsRef<Path>) -> Result<Vec<LogRecord>, LogReadError> {
    let lines = read_log_lines(path.as_ref())?;
    Ok(parse_lines(&lines))
}

pub(crate) fn read_log_lines(path: &Path) -> Result<Vec<String>, LogReadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LogReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Timestamp from a tabular export: ISO-8601 when it contains `T`, otherwise
/// `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn parse_extract_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.contains('T') {
        parse_iso8601(s)
    } else {
        parse_naive(s, "%Y-%m-%d %H:%M:%S")
    }
}

/// Timestamp from a free-form log line.
pub(crate) fn parse_log_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.contains('T') {
        if let Some(ts) = parse_iso8601(s) {
            return Some(ts);
        }
    }
    let fmts = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
    ];
    fmts.iter().find_map(|f| parse_naive(s, f))
}

/// Resolve a timestamp or fall back to `now`; the flag reports the fallback.
pub(crate) fn timestamp_or(parsed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    match parsed {
        Some(ts) => (ts, false),
        None => (now, true),
    }
}

fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let with_offset = match s.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&with_offset) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(&with_offset, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    // No offset: taken as UTC
    parse_naive(s, "%Y-%m-%dT%H:%M:%S%.f").or_else(|| parse_naive(s, "%Y-%m-%dT%H:%M"))
}

fn parse_naive(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), fmt)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}
