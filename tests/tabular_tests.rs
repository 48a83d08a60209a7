use chrono::{TimeZone, Utc};
use querylog::parser::Command;
use querylog::tabular::parse_tabular_extract;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn defaults_command_and_connection_when_columns_absent() {
    let lines = [
        "EVENT_TIME,ARGUMENT",
        "2024-01-01 10:00:00,SELECT * FROM users WHERE id = 1",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].command, Command::Query);
    assert_eq!(recs[0].connection_id, "0");
    assert_eq!(recs[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
}

#[test]
fn resolves_synonym_columns_case_insensitively() {
    let lines = [
        "\"timestamp\",\"thread_id\",\"command\",\"sql_text\"",
        "\"2024-02-03T04:05:06Z\",\"77\",\"Execute\",\"UPDATE carts SET n = 2 WHERE id = 9\"",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 1);
    let r = &recs[0];
    assert_eq!(r.connection_id, "77");
    assert_eq!(r.command, Command::Execute);
    assert_eq!(r.query_text, "UPDATE carts SET n = 2 WHERE id = 9");
    assert_eq!(r.timestamp, Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
}

#[test]
fn first_listed_synonym_wins() {
    let lines = [
        "TIME,EVENT_TIME,QUERY,ARGUMENT",
        "2000-01-01 00:00:00,2024-01-01 10:00:00,SELECT * FROM ignored,SELECT * FROM used",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs[0].query_text, "SELECT * FROM used");
    assert_eq!(recs[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
}

#[test]
fn missing_required_column_is_a_soft_failure() {
    let no_query = ["EVENT_TIME,USER_HOST", "2024-01-01 10:00:00,app@host"];
    assert!(parse_tabular_extract(&no_query, now()).is_empty());
    let no_time = ["ARGUMENT,USER_HOST", "SELECT * FROM t,app@host"];
    assert!(parse_tabular_extract(&no_time, now()).is_empty());
}

#[test]
fn tab_delimiter_when_header_has_no_comma() {
    let lines = [
        "event_time\tuser_host\tthread_id\tcommand_type\targument",
        "2024-01-01 10:00:00\tapp[app] @ [10.0.0.1]\t12\tQuery\tSELECT id, name FROM users",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 1);
    // commas inside the statement survive tab splitting
    assert_eq!(recs[0].query_text, "SELECT id, name FROM users");
    assert_eq!(recs[0].connection_id, "12");
}

#[test]
fn short_blank_and_system_rows_are_skipped() {
    let lines = [
        "EVENT_TIME,CONNECTION_ID,COMMAND_TYPE,ARGUMENT",
        "2024-01-01 10:00:00,1,Query",
        "",
        "2024-01-01 10:00:01,1,Query,SET autocommit=1",
        "2024-01-01 10:00:02,1,Query,SELECT 1",
        "2024-01-01 10:00:03,1,Query,SELECT * FROM orders",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].query_text, "SELECT * FROM orders");
}

#[test]
fn hex_arguments_are_decoded() {
    let lines = [
        "EVENT_TIME,ARGUMENT",
        "2024-01-01 10:00:00,0x53454C454354202A2046524F4D206F7264657273",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs[0].query_text, "SELECT * FROM orders");
}

#[test]
fn spaced_hex_arguments_share_a_pattern_with_packed_ones() {
    let lines = [
        "EVENT_TIME\tARGUMENT",
        "2024-01-01 10:00:00\t0x53 45 4C 45 43 54 20 2A 20 46 52 4F 4D 20 74",
        "2024-01-01 10:00:01\t0x53454C454354202A2046524F4D2074",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].query_text, "SELECT * FROM t");
    assert_eq!(recs[0].query_text, recs[1].query_text);
}

#[test]
fn undecodable_hex_is_kept_verbatim() {
    let lines = ["EVENT_TIME,ARGUMENT", "2024-01-01 10:00:00,0x53454C454354203"];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].query_text, "0x53454C454354203");
}

#[test]
fn unparseable_timestamp_falls_back_to_now() {
    let lines = [
        "EVENT_TIME,ARGUMENT",
        "01/02/2024 10:00:00,SELECT * FROM a",
        "not a time,SELECT * FROM b",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.timestamp == now() && r.timestamp_fallback));
}

#[test]
fn non_query_commands_are_kept_as_passthrough() {
    let lines = [
        "EVENT_TIME,COMMAND_TYPE,ARGUMENT",
        "2024-01-01 10:00:00,Connect,app@10.0.0.1 on shop using TCP/IP",
    ];
    let recs = parse_tabular_extract(&lines, now());
    assert_eq!(recs[0].command, Command::Other("Connect".into()));
}
