// Turns raw snapshots into ranked, percentage-annotated, delta-aware summaries
// and keeps the two rolling windows current.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Counter, DashboardView, DerivedSummary, RankedEntry, Snapshot};
use crate::window::{DATE_LABEL, RollingWindow};

/// Smallest share reported for any entry, in percent.
pub const MIN_SHARE: f64 = 1.0;

/// Window sizes for the aggregator.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    pub window_capacity: usize,
    pub sample_spacing_secs: u64,
    pub history_days: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_capacity: 30,
            sample_spacing_secs: 5,
            history_days: 30,
        }
    }
}

pub struct SummaryAggregator {
    baseline: Option<Counter>,
    recent: RollingWindow,
    daily: RollingWindow,
    history_days: usize,
}

impl SummaryAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            baseline: None,
            recent: RollingWindow::recent(config.window_capacity, config.sample_spacing_secs),
            daily: RollingWindow::daily(config.history_days),
            history_days: config.history_days,
        }
    }

    /// Whether a baseline total has been recorded yet.
    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    /// Computes the derived summary for `snapshot` as seen at local time `now`,
    /// then advances the baseline and the windows.
    pub fn ingest(&mut self, snapshot: &Snapshot, now: NaiveDateTime) -> DerivedSummary {
        let total = snapshot.day_total();
        let first = self.baseline.is_none();
        let previous = self.baseline.unwrap_or(total);
        let inc_packets = total.count.saturating_sub(previous.count);
        let inc_bytes = total.size.saturating_sub(previous.size);
        self.baseline = Some(total);

        if !first {
            self.recent.append(now, inc_packets, inc_bytes);
        }
        let today = now.date();
        self.daily
            .rebuild(&snapshot.day_summary, today, self.history_days);

        let today_counter = snapshot
            .day_summary
            .get(&today.format(DATE_LABEL).to_string())
            .copied()
            .unwrap_or_default();

        let mut input: Vec<_> = snapshot.input_packets.values().cloned().collect();
        input.sort_by(|a, b| {
            b.summary
                .count
                .cmp(&a.summary.count)
                .then_with(|| a.src_ip.cmp(&b.src_ip))
        });

        let black: HashMap<String, Counter> = snapshot
            .black_summary
            .iter()
            .map(|(addr, hits)| (addr.clone(), Counter::new(*hits, 0)))
            .collect();

        DerivedSummary {
            inc_packets,
            inc_bytes,
            total_packets: total.count,
            total_bytes: total.size,
            day_packets: today_counter.count,
            day_bytes: today_counter.size,
            country: rank(&snapshot.country_summary),
            city: rank(&snapshot.city_summary),
            eth_type: rank(&snapshot.eth_type_summary),
            ip_proto: rank(&snapshot.ip_proto_summary),
            matched: rank(&snapshot.match_summary),
            dst_port: rank(&snapshot.dst_port_summary),
            black: rank(&black),
            input,
        }
    }

    /// `ingest` plus the current window contents, ready for presentation.
    pub fn view(&mut self, snapshot: &Snapshot, now: NaiveDateTime) -> DashboardView {
        let summary = self.ingest(snapshot, now);
        DashboardView {
            summary,
            recent: self.recent.padded(now),
            daily: self.daily.points(),
        }
    }

    pub fn recent(&self) -> &RollingWindow {
        &self.recent
    }

    pub fn daily(&self) -> &RollingWindow {
        &self.daily
    }
}

/// Sorts one dimension by count descending (ties by key) and annotates each entry with
/// `max(count / total * 100, MIN_SHARE)`.
pub fn rank<K>(entries: &HashMap<K, Counter>) -> Vec<RankedEntry<K>>
where
    K: Clone + Ord + Hash,
{
    let total: u64 = entries.values().map(|c| c.count).sum();
    let mut out: Vec<RankedEntry<K>> = entries
        .iter()
        .map(|(key, counter)| RankedEntry {
            key: key.clone(),
            counter: *counter,
            share: share(counter.count, total),
        })
        .collect();
    out.sort_by(|a, b| {
        b.counter
            .count
            .cmp(&a.counter.count)
            .then_with(|| a.key.cmp(&b.key))
    });
    out
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        return MIN_SHARE;
    }
    (count as f64 / total as f64 * 100.0).max(MIN_SHARE)
}
