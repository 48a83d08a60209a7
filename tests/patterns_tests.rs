use chrono::{DateTime, TimeZone, Utc};
use querylog::filter::is_system_query;
use querylog::parser::{parse_lines_at, Command, LogRecord};
use querylog::patterns::{aggregate, SAMPLE_QUERY_MAX_CHARS};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

fn rec(ts: DateTime<Utc>, q: &str) -> LogRecord {
    LogRecord {
        timestamp: ts,
        connection_id: "1".into(),
        command: Command::Query,
        query_text: q.into(),
        timestamp_fallback: false,
    }
}

#[test]
fn groups_by_normalized_pattern_in_first_seen_order() {
    let set = aggregate(vec![
        rec(at(10, 0), "SELECT * FROM b WHERE id = 1"),
        rec(at(9, 0), "SELECT * FROM a"),
        rec(at(11, 0), "SELECT * FROM b WHERE id = 2"),
    ]);
    let patterns: Vec<&str> = set.buckets().iter().map(|b| b.pattern.as_str()).collect();
    assert_eq!(patterns, vec!["SELECT * FROM b WHERE id = ?", "SELECT * FROM a"]);

    let b = set.get("SELECT * FROM b WHERE id = ?").unwrap();
    assert_eq!(b.frequency, 2);
    assert_eq!(b.frequency, b.member_records.len());
    assert_eq!(b.first_seen, at(10, 0));
    assert_eq!(b.last_seen, at(11, 0));
    assert_eq!(b.sample_query(), "SELECT * FROM b WHERE id = 1");
}

#[test]
fn bounds_track_out_of_order_arrivals() {
    let set = aggregate(vec![
        rec(at(12, 0), "DELETE FROM t WHERE id = 1"),
        rec(at(8, 30), "DELETE FROM t WHERE id = 2"),
        rec(at(15, 0), "DELETE FROM t WHERE id = 3"),
        rec(at(9, 0), "DELETE FROM t WHERE id = 4"),
    ]);
    let b = &set.buckets()[0];
    assert_eq!((b.first_seen, b.last_seen), (at(8, 30), at(15, 0)));
    assert!(b.first_seen <= b.last_seen);
    assert_eq!(set.time_bounds(), Some((at(8, 30), at(15, 0))));
}

#[test]
fn long_samples_are_truncated_with_ellipsis() {
    let long = format!("SELECT * FROM t WHERE c IN ({})", vec!["'é'"; 80].join(","));
    let set = aggregate(vec![rec(at(1, 0), &long)]);
    let sample = set.buckets()[0].sample_query();
    assert!(sample.ends_with("..."));
    assert_eq!(sample.chars().count(), SAMPLE_QUERY_MAX_CHARS + 3);

    let exact: String = "x".repeat(SAMPLE_QUERY_MAX_CHARS);
    let set = aggregate(vec![rec(at(1, 0), &exact)]);
    assert_eq!(set.buckets()[0].sample_query(), exact);
}

#[test]
fn empty_input_yields_empty_set() {
    let set = aggregate(Vec::new());
    assert!(set.is_empty());
    assert_eq!(set.total_records(), 0);
    assert_eq!(set.time_bounds(), None);
}

#[test]
fn frequency_is_conserved_across_buckets() {
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let lines = [
        "2024-01-01 10:00:00\t1\tQuery\tSELECT * FROM a WHERE id = 1",
        "2024-01-01 10:00:01\t1\tQuery\tSELECT 1",
        "2024-01-01 10:00:02\t1\tQuery\tSELECT * FROM a WHERE id = 2",
        "2024-01-01 10:00:03\t1\tQuery\tUPDATE a SET v = 'x' WHERE id = 2",
        "2024-01-02 10:00:03\t2\tQuery\tSHOW TABLES",
        "2024-01-02 10:00:04\t2\tQuery\tINSERT INTO a VALUES (3)",
    ];
    let recs = parse_lines_at(&lines, now);
    let kept = recs.iter().filter(|r| !is_system_query(&r.query_text)).count();
    let set = aggregate(recs);
    assert_eq!(set.total_records(), kept);
    assert_eq!(set.total_records(), 4);
    let (min, max) = set.time_bounds().unwrap();
    for b in set.buckets() {
        assert!(b.first_seen <= b.last_seen);
        assert!(min <= b.first_seen && b.last_seen <= max);
    }
}
