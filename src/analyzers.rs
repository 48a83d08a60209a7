use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::parser::{self, LogReadError};
use crate::report::{self, AnalysisReport};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported database type: {0}")]
pub struct UnsupportedDatabase(pub String);

/// Source databases whose query logs can be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    MySql,
}

impl DatabaseKind {
    pub const ALL: &'static [DatabaseKind] = &[DatabaseKind::MySql];

    pub fn tag(&self) -> &'static str {
        match self {
            DatabaseKind::MySql => "mysql",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DatabaseKind {
    type Err = UnsupportedDatabase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseKind::ALL
            .iter()
            .copied()
            .find(|k| k.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedDatabase(s.to_string()))
    }
}

/// Trait that every log analyzer implements.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze_lines_at(&self, lines: &[String], now: DateTime<Utc>) -> AnalysisReport;
}

/// MySQL general log, either raw or exported from `mysql.general_log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlLogAnalyzer;

impl Analyzer for MySqlLogAnalyzer {
    fn name(&self) -> &'static str {
        "mysql_general_log"
    }

    fn analyze_lines_at(&self, lines: &[String], now: DateTime<Utc>) -> AnalysisReport {
        report::analyze_lines_at(lines, now)
    }
}

/// One variant per supported source; adding a source adds a variant here.
#[derive(Debug, Clone, Copy)]
pub enum SourceAnalyzer {
    MySql(MySqlLogAnalyzer),
}

pub fn analyzer_for(kind: DatabaseKind) -> SourceAnalyzer {
    match kind {
        DatabaseKind::MySql => SourceAnalyzer::MySql(MySqlLogAnalyzer),
    }
}

impl SourceAnalyzer {
    pub fn kind(&self) -> DatabaseKind {
        match self {
            SourceAnalyzer::MySql(_) => DatabaseKind::MySql,
        }
    }

    fn inner(&self) -> &dyn Analyzer {
        match self {
            SourceAnalyzer::MySql(a) => a,
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner().name()
    }

    pub fn analyze_lines(&self, lines: &[String]) -> AnalysisReport {
        self.inner().analyze_lines_at(lines, Utc::now())
    }

    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisReport, LogReadError> {
        let lines = parser::read_log_lines(path.as_ref())?;
        Ok(self.analyze_lines(&lines))
    }
}
