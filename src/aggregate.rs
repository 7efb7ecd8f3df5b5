//! Max-wins usage aggregation
//!
//! The [`Aggregator`] folds raw events into one running maximum per
//! [`AggregationKey`] for the lifetime of a single window. Max-wins is
//! commutative and associative, so the final aggregate is independent of
//! event arrival order across concurrently fetched objects.
//!
//! Value policy is centralized here: events with non-positive values are
//! silently skipped inside [`Aggregator::add`], so no backend path can
//! apply the filter differently. Placeholder zero/negative counts never
//! pollute an aggregate.

use crate::error::{Error, Result};
use crate::models::{EventTags, UsageEvent, MAX_RESOURCE_COUNT};
use crate::window::TimeRange;
use std::collections::HashMap;
use tracing::trace;

/// Identity of one running maximum: the scope plus the `(group, version,
/// kind)` triple of the resource being counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey {
    pub scope_id: String,
    pub resource_group: String,
    pub resource_version: String,
    pub resource_kind: String,
}

impl From<&EventTags> for AggregationKey {
    fn from(tags: &EventTags) -> Self {
        Self {
            scope_id: tags.scope_id.clone(),
            resource_group: tags.resource_group.clone(),
            resource_version: tags.resource_version.clone(),
            resource_kind: tags.resource_kind.clone(),
        }
    }
}

impl AggregationKey {
    fn into_tags(self) -> EventTags {
        EventTags {
            scope_id: self.scope_id,
            resource_group: self.resource_group,
            resource_version: self.resource_version,
            resource_kind: self.resource_kind,
            account: String::new(),
        }
    }
}

/// Per-window accumulator. Created fresh for each window and discarded
/// after its summaries are emitted; it carries no cross-window state.
#[derive(Debug, Default)]
pub struct Aggregator {
    max_values: HashMap<AggregationKey, f64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the aggregate.
    ///
    /// Fails with [`Error::Validation`] on a mismatched metric name or an
    /// empty required tag; validation failures are propagated, not
    /// swallowed, and abort the enclosing reader. Non-positive values pass
    /// validation but are skipped.
    pub fn add(&mut self, event: &UsageEvent) -> Result<()> {
        if event.name != MAX_RESOURCE_COUNT {
            return Err(Error::validation(format!(
                "unexpected metric name {:?}, want {:?}",
                event.name, MAX_RESOURCE_COUNT
            )));
        }
        for (field, value) in [
            ("scope_id", &event.tags.scope_id),
            ("group", &event.tags.resource_group),
            ("version", &event.tags.resource_version),
            ("kind", &event.tags.resource_kind),
        ] {
            if value.is_empty() {
                return Err(Error::validation(format!("missing required tag {field:?}")));
            }
        }

        if event.value <= 0.0 {
            trace!(scope_id = %event.tags.scope_id, value = event.value, "skipping non-positive value");
            return Ok(());
        }

        let current = self
            .max_values
            .entry(AggregationKey::from(&event.tags))
            .or_insert(event.value);
        if event.value > *current {
            *current = event.value;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.max_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_values.is_empty()
    }

    /// One summary event per key, stamped with the window's start and end.
    /// Sorted by key so emitted reports are deterministic.
    pub fn summaries(self, window: &TimeRange) -> Vec<UsageEvent> {
        let mut entries: Vec<_> = self.max_values.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
            .into_iter()
            .map(|(key, value)| UsageEvent {
                name: MAX_RESOURCE_COUNT.to_string(),
                tags: key.into_tags(),
                timestamp: window.start,
                timestamp_end: window.end,
                value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2006, 5, 4, 3, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2006, 5, 4, 4, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn event(scope: &str, kind: &str, value: f64) -> UsageEvent {
        UsageEvent {
            name: MAX_RESOURCE_COUNT.to_string(),
            tags: EventTags {
                scope_id: scope.to_string(),
                resource_group: "example.org".to_string(),
                resource_version: "v1".to_string(),
                resource_kind: kind.to_string(),
                account: String::new(),
            },
            timestamp: Utc.with_ymd_and_hms(2006, 5, 4, 3, 10, 0).unwrap(),
            timestamp_end: Utc.with_ymd_and_hms(2006, 5, 4, 3, 15, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn max_wins_for_same_key() {
        let mut agg = Aggregator::new();
        agg.add(&event("s1", "Widget", 4.0)).unwrap();
        agg.add(&event("s1", "Widget", 7.0)).unwrap();
        agg.add(&event("s1", "Widget", 5.0)).unwrap();

        let summaries = agg.summaries(&window());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].value, 7.0);
        assert_eq!(summaries[0].timestamp, window().start);
        assert_eq!(summaries[0].timestamp_end, window().end);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let events = vec![
            event("s1", "Widget", 3.0),
            event("s1", "Widget", 9.0),
            event("s2", "Widget", 1.0),
            event("s1", "Gadget", 6.0),
            event("s2", "Widget", 2.0),
        ];

        let mut forward = Aggregator::new();
        for e in &events {
            forward.add(e).unwrap();
        }
        let mut reverse = Aggregator::new();
        for e in events.iter().rev() {
            reverse.add(e).unwrap();
        }

        assert_eq!(forward.summaries(&window()), reverse.summaries(&window()));
    }

    #[test]
    fn non_positive_values_are_skipped() {
        let mut agg = Aggregator::new();
        agg.add(&event("s1", "Widget", -1.0)).unwrap();
        agg.add(&event("s2", "Widget", -2.0)).unwrap();
        agg.add(&event("s3", "Widget", 0.0)).unwrap();
        assert!(agg.is_empty());
        assert!(agg.summaries(&window()).is_empty());
    }

    #[test]
    fn non_positive_values_do_not_lower_a_maximum() {
        let mut agg = Aggregator::new();
        agg.add(&event("s1", "Widget", 5.0)).unwrap();
        agg.add(&event("s1", "Widget", -3.0)).unwrap();
        let summaries = agg.summaries(&window());
        assert_eq!(summaries[0].value, 5.0);
    }

    #[test]
    fn wrong_metric_name_is_rejected() {
        let mut agg = Aggregator::new();
        let mut e = event("s1", "Widget", 1.0);
        e.name = "cpu_seconds".to_string();
        assert!(matches!(agg.add(&e), Err(Error::Validation(_))));
    }

    #[test]
    fn missing_tags_are_rejected() {
        let mut agg = Aggregator::new();
        let mut e = event("s1", "Widget", 1.0);
        e.tags.scope_id = String::new();
        assert!(matches!(agg.add(&e), Err(Error::Validation(_))));

        let mut e = event("s1", "Widget", 1.0);
        e.tags.resource_version = String::new();
        assert!(matches!(agg.add(&e), Err(Error::Validation(_))));
    }

    #[test]
    fn distinct_keys_yield_distinct_summaries() {
        let mut agg = Aggregator::new();
        agg.add(&event("s1", "Widget", 2.0)).unwrap();
        agg.add(&event("s1", "Gadget", 3.0)).unwrap();
        agg.add(&event("s2", "Widget", 4.0)).unwrap();
        assert_eq!(agg.len(), 3);
        assert_eq!(agg.summaries(&window()).len(), 3);
    }
}
