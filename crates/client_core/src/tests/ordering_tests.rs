use super::*;
use crate::summary::parse_timestamp;

struct Entry {
    id: &'static str,
    at: Option<DateTime<Utc>>,
}

impl Chronological for Entry {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.at
    }

    fn tie_break_id(&self) -> &str {
        self.id
    }
}

fn entry(id: &'static str, at: Option<&str>) -> Entry {
    Entry {
        id,
        at: at.map(|raw| parse_timestamp(raw).expect("timestamp")),
    }
}

fn ids(entries: &[Entry]) -> Vec<&'static str> {
    entries.iter().map(|e| e.id).collect()
}

#[test]
fn timestamped_first_then_untimed_by_descending_id() {
    let mut entries = vec![
        entry("a", None),
        entry("b", None),
        entry("c", Some("2024-01-02")),
    ];
    sort_newest_first(&mut entries);
    assert_eq!(ids(&entries), ["c", "b", "a"]);
}

#[test]
fn newer_timestamps_come_first() {
    let mut entries = vec![
        entry("x", Some("2024-01-01T09:00:00Z")),
        entry("y", Some("2024-03-01T09:00:00Z")),
        entry("z", Some("2024-02-01T09:00:00Z")),
    ];
    sort_newest_first(&mut entries);
    assert_eq!(ids(&entries), ["y", "z", "x"]);
}

#[test]
fn equal_timestamps_fall_back_to_id() {
    let mut entries = vec![
        entry("slot-1", Some("2024-05-05T12:00:00Z")),
        entry("slot-3", Some("2024-05-05T12:00:00Z")),
        entry("slot-2", Some("2024-05-05T12:00:00Z")),
    ];
    sort_newest_first(&mut entries);
    assert_eq!(ids(&entries), ["slot-3", "slot-2", "slot-1"]);
}

#[test]
fn ids_compare_as_strings_not_numbers() {
    let mut entries = vec![entry("9", None), entry("10", None), entry("2", None)];
    sort_newest_first(&mut entries);
    assert_eq!(ids(&entries), ["9", "2", "10"]);
}

#[test]
fn ordering_is_stable_across_resorts() {
    let mut first = vec![
        entry("b", None),
        entry("c", Some("2024-01-02")),
        entry("a", None),
    ];
    let mut second = vec![
        entry("a", None),
        entry("b", None),
        entry("c", Some("2024-01-02")),
    ];
    sort_newest_first(&mut first);
    sort_newest_first(&mut second);
    assert_eq!(ids(&first), ids(&second));
}
