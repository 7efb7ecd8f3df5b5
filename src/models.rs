//! Core Data Models
//!
//! This module defines the data structures flowing through the metering
//! pipeline, from raw events read out of object storage to the metadata
//! written into the final report archive.
//!
//! ## Data Flow
//!
//! 1. **Raw data**: [`UsageEvent`] - individual events decoded from stored
//!    JSON arrays, one per resource-count observation
//! 2. **Aggregation**: events are folded into per-window maxima keyed by
//!    scope and resource kind (see [`crate::aggregate`])
//! 3. **Output**: one summary [`UsageEvent`] per key per window, stamped
//!    with the window's start/end and packaged alongside [`ReportMeta`]
//!
//! ## Wire Formats
//!
//! `usage.json` is a JSON array of events; an empty run produces `[]`,
//! never `null`. `meta.json` carries the account, the overall time range,
//! and the collection timestamp. All timestamps are RFC 3339.

use crate::window::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric name carried by every valid usage event: the maximum number of
/// resource instances of one kind observed in one scope during a window.
pub const MAX_RESOURCE_COUNT: &str = "max_resource_count";

/// One usage observation, as stored and as emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub name: String,
    pub tags: EventTags,
    pub timestamp: DateTime<Utc>,
    pub timestamp_end: DateTime<Utc>,
    pub value: f64,
}

/// Fixed tag record attributing an event to a scope and a resource kind.
///
/// `account` is empty on raw events read from storage; the report writer
/// stamps it from [`ReportMeta`] on the way out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTags {
    pub scope_id: String,
    #[serde(rename = "group")]
    pub resource_group: String,
    #[serde(rename = "version")]
    pub resource_version: String,
    #[serde(rename = "kind")]
    pub resource_kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,
}

/// Report metadata, written once per report and immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub account: String,
    pub time_range: TimeRange,
    pub collected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_wire_format_round_trips() {
        let event = UsageEvent {
            name: MAX_RESOURCE_COUNT.to_string(),
            tags: EventTags {
                scope_id: "space-1".to_string(),
                resource_group: "example.org".to_string(),
                resource_version: "v1".to_string(),
                resource_kind: "Widget".to_string(),
                account: String::new(),
            },
            timestamp: Utc.with_ymd_and_hms(2006, 5, 4, 3, 0, 0).unwrap(),
            timestamp_end: Utc.with_ymd_and_hms(2006, 5, 4, 4, 0, 0).unwrap(),
            value: 7.0,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""group":"example.org""#));
        assert!(json.contains(r#""kind":"Widget""#));
        // Empty account is omitted on the wire.
        assert!(!json.contains("account"));

        let back: UsageEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn meta_serializes_rfc3339() {
        let meta = ReportMeta {
            account: "acme".to_string(),
            time_range: TimeRange::new(
                Utc.with_ymd_and_hms(2006, 5, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2006, 6, 1, 0, 0, 0).unwrap(),
            )
            .unwrap(),
            collected_at: Utc.with_ymd_and_hms(2006, 6, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("2006-05-01T00:00:00Z"));
        assert!(json.contains(r#""account":"acme""#));
    }
}
