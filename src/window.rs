//! Time ranges and hour-aligned window iteration
//!
//! A [`TimeRange`] is a half-open interval `[start, end)`. The
//! [`WindowIterator`] splits a range into consecutive sub-ranges ("windows")
//! of a configured duration, over which events are aggregated independently.
//!
//! Both the range endpoints and the window size are floored to the hour
//! before iteration begins. This is a deliberate precision loss matching the
//! hourly partition layout in storage; callers needing finer granularity
//! must pre-split their ranges. The final window is clipped to the range
//! end, so it may be shorter than the configured size.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval of time: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Both endpoints floored to the hour.
    pub fn truncated(&self) -> TimeRange {
        TimeRange {
            start: truncate_to_hour(self.start),
            end: truncate_to_hour(self.end),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Floor a timestamp to the top of its hour.
pub fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = (t.minute() as i64) * 60 + t.second() as i64;
    t - Duration::seconds(into_hour) - Duration::nanoseconds(t.nanosecond() as i64)
}

/// Splits a [`TimeRange`] into consecutive hour-aligned windows.
///
/// Construction fails with [`Error::WindowTooShort`] if the window is under
/// one hour, or [`Error::RangeTooShort`] if the truncated range spans less
/// than one hour. Emitted windows are contiguous and non-overlapping; their
/// union exactly covers the truncated range.
#[derive(Debug)]
pub struct WindowIterator {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    window: Duration,
}

impl WindowIterator {
    pub fn new(range: TimeRange, window: Duration) -> Result<Self> {
        // Window size is floored to whole hours, like the range endpoints.
        let window = Duration::hours(window.num_hours());
        if window < Duration::hours(1) {
            return Err(Error::WindowTooShort);
        }

        let range = range.truncated();
        if range.end - range.start < Duration::hours(1) {
            return Err(Error::RangeTooShort);
        }

        Ok(Self {
            cursor: range.start,
            end: range.end,
            window,
        })
    }

    /// Whether another window remains.
    pub fn more(&self) -> bool {
        self.cursor < self.end
    }

    /// The next window, clipped to the range end. Fails once exhausted.
    pub fn next_window(&mut self) -> Result<TimeRange> {
        if !self.more() {
            return Err(Error::NoMoreWindows);
        }
        let end = std::cmp::min(self.cursor + self.window, self.end);
        let window = TimeRange {
            start: self.cursor,
            end,
        };
        self.cursor = end;
        Ok(window)
    }
}

impl Iterator for WindowIterator {
    type Item = TimeRange;

    fn next(&mut self) -> Option<TimeRange> {
        self.next_window().ok()
    }
}
