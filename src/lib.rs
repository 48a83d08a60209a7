pub mod filter;
pub mod masking;
pub mod parser;
pub mod tabular;
pub mod multiline;
pub mod patterns;
pub mod classify;
pub mod report;
pub mod tables;
pub mod analyzers;

pub use analyzers::{analyzer_for, DatabaseKind, SourceAnalyzer};
pub use parser::{LogRecord, LogFormat};
pub use report::{AnalysisReport, AnalysisRow};
