// Fixed-capacity rolling windows of time-bucketed packet/byte counters

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{HashMap, VecDeque};

use crate::models::{Counter, WindowPoint};

/// Label format for recent-interval points.
pub const TIME_LABEL: &str = "%H:%M:%S";
/// Label format for daily points; also the key format of the snapshot's day map.
pub const DATE_LABEL: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bucket {
    at: NaiveDateTime,
    packets: u64,
    bytes: u64,
}

/// Ordered buffer of at most `capacity` buckets, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    spacing: Duration,
    label_format: &'static str,
    buckets: VecDeque<Bucket>,
}

impl RollingWindow {
    /// Window whose synthetic padding points are `spacing` apart.
    pub fn new(capacity: usize, spacing: Duration, label_format: &'static str) -> Self {
        Self {
            capacity: capacity.max(1),
            spacing,
            label_format,
            buckets: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Recent-interval window: `HH:MM:SS` labels, padded every `spacing_secs`.
    pub fn recent(capacity: usize, spacing_secs: u64) -> Self {
        Self::new(
            capacity,
            Duration::seconds(spacing_secs as i64),
            TIME_LABEL,
        )
    }

    /// Daily window: `YYYY-MM-DD` labels, one bucket per calendar day.
    pub fn daily(days: usize) -> Self {
        Self::new(days, Duration::days(1), DATE_LABEL)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of real (non-synthetic) points held.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Appends a point and evicts from the front until within capacity.
    pub fn append(&mut self, at: NaiveDateTime, packets: u64, bytes: u64) {
        self.buckets.push_back(Bucket { at, packets, bytes });
        while self.buckets.len() > self.capacity {
            self.buckets.pop_front();
        }
    }

    /// Real points only, oldest first.
    pub fn points(&self) -> Vec<WindowPoint> {
        self.buckets.iter().map(|b| self.point(b)).collect()
    }

    /// Exactly `capacity` points: missing history is filled with zero-valued points
    /// spaced `spacing` apart before the oldest real point (or before `now` when empty).
    pub fn padded(&self, now: NaiveDateTime) -> Vec<WindowPoint> {
        let missing = self.capacity.saturating_sub(self.buckets.len());
        let anchor = self.buckets.front().map(|b| b.at).unwrap_or(now);
        let mut out = Vec::with_capacity(self.capacity);
        for i in (1..=missing).rev() {
            let at = anchor - self.spacing * i as i32;
            out.push(self.point(&Bucket {
                at,
                packets: 0,
                bytes: 0,
            }));
        }
        out.extend(self.buckets.iter().map(|b| self.point(b)));
        out
    }

    /// Replaces the contents with the `days` calendar days ending at `anchor` (inclusive),
    /// oldest first. Days absent from `by_day` are zero.
    pub fn rebuild(&mut self, by_day: &HashMap<String, Counter>, anchor: NaiveDate, days: usize) {
        self.buckets.clear();
        let days = days.min(self.capacity);
        for back in (0..days).rev() {
            let Some(date) = anchor.checked_sub_days(chrono::Days::new(back as u64)) else {
                continue;
            };
            let key = date.format(DATE_LABEL).to_string();
            let counter = by_day.get(&key).copied().unwrap_or_default();
            self.buckets.push_back(Bucket {
                at: date.and_time(chrono::NaiveTime::MIN),
                packets: counter.count,
                bytes: counter.size,
            });
        }
    }

    fn point(&self, b: &Bucket) -> WindowPoint {
        WindowPoint {
            label: b.at.format(self.label_format).to_string(),
            packets: b.packets,
            bytes: b.bytes,
        }
    }
}
