use chrono::{DateTime, Utc};
use tracing::debug;

use crate::filter::is_system_query;
use crate::parser::{self, Command, LogRecord};
use crate::tabular::strip_quotes;

/// Lines inspected when guessing the field delimiter.
const SAMPLE_LINES: usize = 20;

/// timestamp, connection id, command, statement
const MIN_HEADER_FIELDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Tab => line.split('\t').collect(),
            Delimiter::Comma => line.split(',').collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }

    fn joiner(&self) -> &'static str {
        match self {
            Delimiter::Tab => "\t",
            Delimiter::Comma => ",",
            Delimiter::Whitespace => " ",
        }
    }
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Guess the delimiter from the leading content lines, or `None` when no
/// sampled line has enough fields under any candidate.
pub fn detect_delimiter<S: AsRef<str>>(lines: &[S]) -> Option<Delimiter> {
    let sample: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !is_skippable(l))
        .take(SAMPLE_LINES)
        .collect();
    [Delimiter::Tab, Delimiter::Comma, Delimiter::Whitespace]
        .into_iter()
        .find(|d| sample.iter().any(|l| d.split(l).len() >= MIN_HEADER_FIELDS))
}

/// Accumulates free-form log lines into records. A header line opens a new
/// record and closes the previous one; shorter lines extend the open record.
pub struct StatementAggregator {
    delimiter: Delimiter,
    now: DateTime<Utc>,
    open: Option<LogRecord>,
}

impl StatementAggregator {
    pub fn new(delimiter: Delimiter, now: DateTime<Utc>) -> Self {
        Self { delimiter, now, open: None }
    }

    /// Feed one raw line. Returns a record when this line closes one that is
    /// application traffic.
    pub fn push(&mut self, line: &str) -> Option<LogRecord> {
        let line = line.trim();
        if is_skippable(line) {
            return None;
        }

        let parts = self.delimiter.split(line);
        if parts.len() < MIN_HEADER_FIELDS {
            if let Some(open) = self.open.as_mut() {
                open.query_text.push(' ');
                open.query_text.push_str(line);
            }
            return None;
        }

        let closed = self.open.take().filter(|r| !is_system_query(&r.query_text));
        let command = Command::parse(parts[2].trim());
        if command.is_statement() {
            let ts_str = strip_quotes(parts[0]);
            let (timestamp, timestamp_fallback) =
                parser::timestamp_or(parser::parse_log_timestamp(ts_str), self.now);
            self.open = Some(LogRecord {
                timestamp,
                connection_id: parts[1].trim().to_string(),
                command,
                query_text: parts[3..].join(self.delimiter.joiner()).trim().to_string(),
                timestamp_fallback,
            });
        }
        closed
    }

    /// Flush the record still open at end of input.
    pub fn finish(&mut self) -> Option<LogRecord> {
        self.open.take().filter(|r| !is_system_query(&r.query_text))
    }
}

/// Parse a line-oriented general log. Administrative commands (`Connect`,
/// `Quit`, ...) and system statements are dropped.
pub fn parse_free_form<S: AsRef<str>>(lines: &[S], now: DateTime<Utc>) -> Vec<LogRecord> {
    let Some(delimiter) = detect_delimiter(lines) else {
        debug!("no delimiter with enough fields in sampled lines");
        return Vec::new();
    };
    debug!(?delimiter, "free-form log delimiter");

    let mut agg = StatementAggregator::new(delimiter, now);
    let mut out = Vec::new();
    for l in lines {
        if let Some(rec) = agg.push(l.as_ref()) {
            out.push(rec);
        }
    }
    if let Some(rec) = agg.finish() {
        out.push(rec);
    }
    out
}
