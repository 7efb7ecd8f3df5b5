//! Storage partition key layout
//!
//! Raw events are sharded in object storage by account and hour using the
//! fixed key convention:
//!
//! ```text
//! account=<account>/date=<YYYY-MM-DD>/hour=<HH>/
//! ```
//!
//! The date is UTC and the hour is zero-padded 24h format. This layout is a
//! wire contract with existing data and must match exactly.

use crate::window::{truncate_to_hour, TimeRange};
use chrono::{DateTime, Duration, Timelike, Utc};

/// The partition key prefix covering the hour containing `t`.
pub fn key_prefix(account: &str, t: DateTime<Utc>) -> String {
    format!(
        "account={}/date={}/hour={:02}/",
        account,
        t.format("%Y-%m-%d"),
        t.hour()
    )
}

/// Hour boundaries crossed by `range`: inclusive of the start's hour,
/// exclusive of the end's hour.
pub fn hour_starts(range: &TimeRange) -> Vec<DateTime<Utc>> {
    let mut hours = Vec::new();
    let mut cursor = truncate_to_hour(range.start);
    let end = truncate_to_hour(range.end);
    while cursor < end {
        hours.push(cursor);
        cursor = cursor + Duration::hours(1);
    }
    hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prefix_matches_layout() {
        let t = Utc.with_ymd_and_hms(2006, 5, 4, 3, 0, 0).unwrap();
        assert_eq!(key_prefix("acme", t), "account=acme/date=2006-05-04/hour=03/");
    }

    #[test]
    fn prefix_pads_hour() {
        let t = Utc.with_ymd_and_hms(2006, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(
            key_prefix("acme", t),
            "account=acme/date=2006-12-31/hour=23/"
        );
    }

    #[test]
    fn hour_starts_cross_midnight() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2006, 5, 4, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2006, 5, 5, 2, 0, 0).unwrap(),
        )
        .unwrap();
        let hours = hour_starts(&range);
        assert_eq!(hours.len(), 4);
        assert_eq!(hours[0], Utc.with_ymd_and_hms(2006, 5, 4, 22, 0, 0).unwrap());
        assert_eq!(hours[3], Utc.with_ymd_and_hms(2006, 5, 5, 1, 0, 0).unwrap());
    }

    #[test]
    fn hour_starts_exclusive_of_end_hour() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2006, 5, 4, 3, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2006, 5, 4, 4, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(hour_starts(&range).len(), 1);
    }
}
