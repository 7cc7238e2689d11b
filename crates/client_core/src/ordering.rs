use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Something listed newest first.
pub trait Chronological {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
    fn tie_break_id(&self) -> &str;
}

/// Descending by timestamp, timestamped entries before untimed ones, then
/// descending by id compared as strings so equal or missing timestamps still
/// give a stable order.
pub fn newest_first<T: Chronological>(a: &T, b: &T) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| b.tie_break_id().cmp(a.tie_break_id()))
}

pub fn sort_newest_first<T: Chronological>(items: &mut [T]) {
    items.sort_by(newest_first);
}

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
