use ahash::AHashMap;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::filter::is_system_query;
use crate::parser::{self, Command, LogRecord};

const TIME_COLUMNS: &[&str] = &["EVENT_TIME", "TIMESTAMP", "TIME"];
const QUERY_COLUMNS: &[&str] = &["ARGUMENT", "QUERY", "SQL_TEXT"];
const COMMAND_COLUMNS: &[&str] = &["COMMAND_TYPE", "COMMAND"];
const CONNECTION_COLUMNS: &[&str] = &["CONNECTION_ID", "THREAD_ID"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnRoles {
    time: usize,
    query: usize,
    command: Option<usize>,
    connection: Option<usize>,
}

impl ColumnRoles {
    fn resolve(columns: &[String]) -> Option<Self> {
        let index: AHashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.to_uppercase(), i))
            .collect();
        let lookup = |names: &[&str]| names.iter().find_map(|n| index.get(*n).copied());
        Some(Self {
            time: lookup(TIME_COLUMNS)?,
            query: lookup(QUERY_COLUMNS)?,
            command: lookup(COMMAND_COLUMNS),
            connection: lookup(CONNECTION_COLUMNS),
        })
    }
}

/// Parse a CSV/TSV export of a general-log table.
///
/// Returns an empty list when the header lacks a time or query column. Rows
/// that are short, malformed, or administrative are skipped individually.
pub fn parse_tabular_extract<S: AsRef<str>>(lines: &[S], now: DateTime<Utc>) -> Vec<LogRecord> {
    let Some(header) = lines.first().map(|l| l.as_ref().trim()) else {
        return Vec::new();
    };
    let delimiter = if header.contains(',') { ',' } else { '\t' };
    let columns: Vec<String> = header
        .split(delimiter)
        .map(|c| strip_quotes(c.trim()).to_string())
        .collect();

    let Some(roles) = ColumnRoles::resolve(&columns) else {
        debug!(?columns, "tabular header has no time or query column");
        return Vec::new();
    };

    let mut out = Vec::new();
    for (offset, line) in lines[1..].iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() < columns.len() {
            trace!(row = offset + 2, "skipping short row");
            continue;
        }
        match parse_row(&fields, roles, now) {
            Some(rec) => out.push(rec),
            None => trace!(row = offset + 2, "skipping row"),
        }
    }
    out
}

fn parse_row(fields: &[&str], roles: ColumnRoles, now: DateTime<Utc>) -> Option<LogRecord> {
    let timestamp_str = strip_quotes(fields.get(roles.time)?);
    let raw_query = strip_quotes(fields.get(roles.query)?);
    let command = match roles.command {
        Some(i) => strip_quotes(fields.get(i)?),
        None => "Query",
    };
    let connection_id = match roles.connection {
        Some(i) => strip_quotes(fields.get(i)?),
        None => "0",
    };

    let query_text = decode_hex_query(raw_query);
    if is_system_query(&query_text) {
        return None;
    }

    let (timestamp, timestamp_fallback) =
        parser::timestamp_or(parser::parse_extract_timestamp(timestamp_str), now);
    Some(LogRecord {
        timestamp,
        connection_id: connection_id.to_string(),
        command: Command::parse(command),
        query_text,
        timestamp_fallback,
    })
}

/// Strip wrapping single and double quotes from both ends.
pub(crate) fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

/// Decode a `0x`-prefixed hex argument to text, dropping invalid UTF-8 bytes.
/// Whitespace may separate byte pairs but not split one. Anything that is not
/// valid hex is returned unchanged.
pub(crate) fn decode_hex_query(s: &str) -> String {
    let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return s.to_string();
    };
    let decoded: Result<Vec<Vec<u8>>, hex::FromHexError> =
        hex_part.split_ascii_whitespace().map(hex::decode).collect();
    match decoded {
        Ok(groups) => {
            let bytes = groups.concat();
            bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
        }
        Err(e) => {
            trace!(error = %e, "hex argument kept verbatim");
            s.to_string()
        }
    }
}
