/// Whole-statement matches that are always connection noise.
const EXACT: &[&str] = &["SELECT 1", "COMMIT", "ROLLBACK"];

/// Session control, introspection and transaction framing.
const PREFIXES: &[&str] = &[
    "SELECT @@",
    "SET GLOBAL",
    "SET SESSION",
    "SET LOCAL",
    "SET @@",
    "SET ",
    "SHOW ",
    "DESCRIBE ",
    "EXPLAIN ",
    "USE ",
    "COMMIT",
    "ROLLBACK",
    "START TRANSACTION",
    "BEGIN",
    "/* RDS DATA API */",
    "ALTER USER",
];

/// Tokens that mark a statement as administrative wherever they appear.
const KEYWORDS: &[&str] = &[
    // schema introspection
    "INFORMATION_SCHEMA",
    "PERFORMANCE_SCHEMA",
    "MYSQL.",
    "SYS.",
    // instrumentation
    "DIGEST_TEXT",
    "EVENTS_STATEMENTS_",
    "@@GLOBAL",
    "@@SESSION",
    // managed-service replica probe
    "OSCAR_LOCAL_ONLY_REPLICA_HOST_STATUS",
    // session variables
    "SQL_LOG_BIN",
    "CHARACTER_SET_RESULTS",
    "AUTOCOMMIT",
    "SQL_MODE",
    // internal admin account
    "RDSADMIN@",
];

/// Returns true when `query` is administrative or driver noise rather than
/// application traffic. Matching is done on the trimmed, upper-cased text.
pub fn is_system_query(query: &str) -> bool {
    let upper = query.trim().to_uppercase();
    if upper.is_empty() {
        return true;
    }
    if EXACT.contains(&upper.as_str()) {
        return true;
    }
    if PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return true;
    }
    KEYWORDS.iter().any(|k| upper.contains(k))
}
