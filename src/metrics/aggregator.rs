//! Usage aggregation engine.
//!
//! Routes decoded data points to reset-aware counters by metric name and
//! attribute, and records one history sample per tracked quantity after
//! every ingested batch.

use crate::metrics::counter::CumulativeCounter;
use crate::metrics::ring_buffer::TimeSeriesBuffer;
use crate::metrics::types::{names, MetricDataPoint};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Model name used when a cost data point carries no `model` attribute.
pub const UNKNOWN_MODEL: &str = "unknown";

/// The fixed counters tracked by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    InputTokens,
    OutputTokens,
    CacheReadTokens,
    CacheCreationTokens,
    Sessions,
    ActiveTime,
    LinesAdded,
    LinesRemoved,
    Commits,
    PullRequests,
}

impl CounterKind {
    pub const COUNT: usize = 10;

    pub const ALL: [CounterKind; Self::COUNT] = [
        CounterKind::InputTokens,
        CounterKind::OutputTokens,
        CounterKind::CacheReadTokens,
        CounterKind::CacheCreationTokens,
        CounterKind::Sessions,
        CounterKind::ActiveTime,
        CounterKind::LinesAdded,
        CounterKind::LinesRemoved,
        CounterKind::Commits,
        CounterKind::PullRequests,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            CounterKind::InputTokens => "Input",
            CounterKind::OutputTokens => "Output",
            CounterKind::CacheReadTokens => "Cache Read",
            CounterKind::CacheCreationTokens => "Cache Create",
            CounterKind::Sessions => "Sessions",
            CounterKind::ActiveTime => "Active Time",
            CounterKind::LinesAdded => "Lines Added",
            CounterKind::LinesRemoved => "Lines Removed",
            CounterKind::Commits => "Commits",
            CounterKind::PullRequests => "PRs",
        }
    }
}

/// A quantity with a history buffer: a fixed counter or the summed cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Counter(CounterKind),
    TotalCost,
}

/// Where a data point is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Counter(CounterKind),
    ModelCost(String),
}

/// Resolve the target of a data point, or `None` when it is not tracked.
pub fn route(point: &MetricDataPoint) -> Option<Route> {
    let kind = match point.name() {
        names::TOKEN_USAGE => match point.attribute("type")? {
            "input" => CounterKind::InputTokens,
            "output" => CounterKind::OutputTokens,
            "cacheRead" => CounterKind::CacheReadTokens,
            "cacheCreation" => CounterKind::CacheCreationTokens,
            _ => return None,
        },
        names::COST_USAGE => {
            let model = point.attribute("model").unwrap_or(UNKNOWN_MODEL);
            return Some(Route::ModelCost(model.to_string()));
        },
        names::SESSION_COUNT => CounterKind::Sessions,
        names::LINES_OF_CODE => match point.attribute("type")? {
            "added" => CounterKind::LinesAdded,
            "removed" => CounterKind::LinesRemoved,
            _ => return None,
        },
        names::COMMIT_COUNT => CounterKind::Commits,
        names::PR_COUNT => CounterKind::PullRequests,
        names::ACTIVE_TIME => CounterKind::ActiveTime,
        _ => return None,
    };
    Some(Route::Counter(kind))
}

/// Outcome of one `ingest` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Data points applied to a counter
    pub routed: usize,
    /// Data points with no matching route
    pub ignored: usize,
    /// Counter resets detected while applying the batch
    pub counter_resets: usize,
}

/// All aggregated usage state: fixed counters, per-model cost counters and
/// their history buffers.
#[derive(Debug, Clone, Default)]
pub struct MetricsStore {
    counters: [CumulativeCounter; CounterKind::COUNT],
    cost_by_model: HashMap<String, CumulativeCounter>,
    counter_history: [TimeSeriesBuffer; CounterKind::COUNT],
    cost_history: TimeSeriesBuffer,
    has_received_data: bool,
    last_update_time: Option<DateTime<Utc>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of data points in order, then record one history sample.
    pub fn ingest(&mut self, points: &[MetricDataPoint]) -> IngestReport {
        self.ingest_at(points, Utc::now())
    }

    /// Same as [`MetricsStore::ingest`] with an explicit update time.
    pub fn ingest_at(&mut self, points: &[MetricDataPoint], now: DateTime<Utc>) -> IngestReport {
        let mut report = IngestReport::default();

        for point in points {
            let reset = match route(point) {
                Some(Route::Counter(kind)) => self.counters[kind.index()].update(point.value()),
                Some(Route::ModelCost(model)) => {
                    self.cost_by_model.entry(model).or_default().update(point.value())
                },
                None => {
                    report.ignored += 1;
                    continue;
                },
            };

            report.routed += 1;
            if reset {
                report.counter_resets += 1;
                tracing::debug!(
                    metric = point.name(),
                    value = point.value(),
                    "counter reset detected, folding previous value into total"
                );
            }
        }

        self.has_received_data = true;
        self.last_update_time = Some(now);
        self.record_snapshot();

        report
    }

    fn record_snapshot(&mut self) {
        for kind in CounterKind::ALL {
            let total = self.counters[kind.index()].total();
            self.counter_history[kind.index()].record(total);
        }
        let total_cost = self.total_cost();
        self.cost_history.record(total_cost);
    }

    /// Clear every counter, history buffer and the data-received flag.
    pub fn reset_all(&mut self) {
        for counter in &mut self.counters {
            counter.reset();
        }
        self.cost_by_model.clear();
        for history in &mut self.counter_history {
            history.reset();
        }
        self.cost_history.reset();
        self.has_received_data = false;
        self.last_update_time = None;
    }

    /// Current total of a tracked quantity.
    pub fn total(&self, series: Series) -> f64 {
        match series {
            Series::Counter(kind) => self.counters[kind.index()].total(),
            Series::TotalCost => self.total_cost(),
        }
    }

    /// History buffer paired with a tracked quantity.
    pub fn history(&self, series: Series) -> &TimeSeriesBuffer {
        match series {
            Series::Counter(kind) => &self.counter_history[kind.index()],
            Series::TotalCost => &self.cost_history,
        }
    }

    pub fn samples(&self, series: Series) -> Vec<f64> {
        self.history(series).samples()
    }

    /// Sum of every per-model cost counter.
    pub fn total_cost(&self) -> f64 {
        self.cost_by_model.values().map(CumulativeCounter::total).sum()
    }

    /// Per-model cost totals, highest first.
    pub fn model_costs(&self) -> Vec<(String, f64)> {
        let mut costs: Vec<(String, f64)> = self
            .cost_by_model
            .iter()
            .map(|(model, counter)| (model.clone(), counter.total()))
            .collect();
        costs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        costs
    }

    pub fn model_count(&self) -> usize {
        self.cost_by_model.len()
    }

    pub fn has_received_data(&self) -> bool {
        self.has_received_data
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.last_update_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, value: f64, attrs: &[(&str, &str)]) -> MetricDataPoint {
        let attributes = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MetricDataPoint::new(name, value, attributes)
    }

    #[test]
    fn test_route_table() {
        let cases = [
            (point(names::TOKEN_USAGE, 1.0, &[("type", "input")]), CounterKind::InputTokens),
            (point(names::TOKEN_USAGE, 1.0, &[("type", "output")]), CounterKind::OutputTokens),
            (point(names::TOKEN_USAGE, 1.0, &[("type", "cacheRead")]), CounterKind::CacheReadTokens),
            (
                point(names::TOKEN_USAGE, 1.0, &[("type", "cacheCreation")]),
                CounterKind::CacheCreationTokens,
            ),
            (point(names::SESSION_COUNT, 1.0, &[]), CounterKind::Sessions),
            (point(names::LINES_OF_CODE, 1.0, &[("type", "added")]), CounterKind::LinesAdded),
            (point(names::LINES_OF_CODE, 1.0, &[("type", "removed")]), CounterKind::LinesRemoved),
            (point(names::COMMIT_COUNT, 1.0, &[]), CounterKind::Commits),
            (point(names::PR_COUNT, 1.0, &[]), CounterKind::PullRequests),
            (point(names::ACTIVE_TIME, 1.0, &[]), CounterKind::ActiveTime),
        ];

        for (p, expected) in cases {
            assert_eq!(route(&p), Some(Route::Counter(expected)), "routing {}", p.name());
        }
    }

    #[test]
    fn test_route_cost_by_model() {
        let p = point(names::COST_USAGE, 0.5, &[("model", "claude-sonnet")]);
        assert_eq!(route(&p), Some(Route::ModelCost("claude-sonnet".to_string())));

        let p = point(names::COST_USAGE, 0.5, &[]);
        assert_eq!(route(&p), Some(Route::ModelCost(UNKNOWN_MODEL.to_string())));
    }

    #[test]
    fn test_route_ignores_unknown() {
        assert_eq!(route(&point("http.server.duration", 1.0, &[])), None);
        assert_eq!(route(&point(names::TOKEN_USAGE, 1.0, &[])), None);
        assert_eq!(route(&point(names::TOKEN_USAGE, 1.0, &[("type", "reasoning")])), None);
        assert_eq!(route(&point(names::LINES_OF_CODE, 1.0, &[("type", "moved")])), None);
    }

    #[test]
    fn test_two_batches_no_reset() {
        let mut store = MetricsStore::new();
        store.ingest(&[point(names::TOKEN_USAGE, 10.0, &[("type", "input")])]);
        store.ingest(&[point(names::TOKEN_USAGE, 25.0, &[("type", "input")])]);

        let input = Series::Counter(CounterKind::InputTokens);
        assert_eq!(store.total(input), 25.0);
        assert_eq!(store.samples(input), vec![10.0, 25.0]);
    }

    #[test]
    fn test_one_sample_per_batch() {
        let mut store = MetricsStore::new();
        let report = store.ingest(&[
            point(names::TOKEN_USAGE, 10.0, &[("type", "input")]),
            point(names::TOKEN_USAGE, 20.0, &[("type", "input")]),
            point(names::TOKEN_USAGE, 7.0, &[("type", "output")]),
            point("unrelated.metric", 3.0, &[]),
        ]);

        assert_eq!(report, IngestReport { routed: 3, ignored: 1, counter_resets: 0 });
        for kind in CounterKind::ALL {
            assert_eq!(store.history(Series::Counter(kind)).len(), 1);
        }
        assert_eq!(store.history(Series::TotalCost).len(), 1);
        assert_eq!(store.samples(Series::Counter(CounterKind::InputTokens)), vec![20.0]);
        assert_eq!(store.samples(Series::Counter(CounterKind::OutputTokens)), vec![7.0]);
    }

    #[test]
    fn test_unmatched_batch_still_counts_as_activity() {
        let mut store = MetricsStore::new();
        let now = Utc::now();
        let report = store.ingest_at(&[point("something.else", 1.0, &[])], now);

        assert_eq!(report.routed, 0);
        assert!(store.has_received_data());
        assert_eq!(store.last_update_time(), Some(now));
        assert_eq!(store.samples(Series::Counter(CounterKind::Sessions)), vec![0.0]);
    }

    #[test]
    fn test_reset_within_batch_reported() {
        let mut store = MetricsStore::new();
        let report = store.ingest(&[
            point(names::SESSION_COUNT, 4.0, &[]),
            point(names::SESSION_COUNT, 1.0, &[]),
        ]);

        assert_eq!(report.counter_resets, 1);
        assert_eq!(store.total(Series::Counter(CounterKind::Sessions)), 5.0);
    }

    #[test]
    fn test_cost_per_model_and_total() {
        let mut store = MetricsStore::new();
        store.ingest(&[
            point(names::COST_USAGE, 0.25, &[("model", "opus")]),
            point(names::COST_USAGE, 0.5, &[("model", "haiku")]),
            point(names::COST_USAGE, 0.75, &[]),
        ]);
        store.ingest(&[point(names::COST_USAGE, 1.0, &[("model", "opus")])]);

        assert_eq!(store.model_count(), 3);
        assert!((store.total_cost() - 2.25).abs() < 1e-9);
        assert_eq!(store.samples(Series::TotalCost), vec![1.5, 2.25]);
        assert_eq!(
            store.model_costs(),
            vec![
                ("opus".to_string(), 1.0),
                (UNKNOWN_MODEL.to_string(), 0.75),
                ("haiku".to_string(), 0.5),
            ]
        );
    }

    #[test]
    fn test_reset_all() {
        let mut store = MetricsStore::new();
        store.ingest(&[
            point(names::TOKEN_USAGE, 100.0, &[("type", "input")]),
            point(names::COST_USAGE, 2.0, &[("model", "opus")]),
            point(names::COMMIT_COUNT, 3.0, &[]),
        ]);
        store.ingest(&[point(names::TOKEN_USAGE, 40.0, &[("type", "input")])]);

        store.reset_all();

        for kind in CounterKind::ALL {
            assert_eq!(store.total(Series::Counter(kind)), 0.0);
            assert!(store.history(Series::Counter(kind)).is_empty());
        }
        assert_eq!(store.total(Series::TotalCost), 0.0);
        assert!(store.history(Series::TotalCost).is_empty());
        assert_eq!(store.model_count(), 0);
        assert!(!store.has_received_data());
        assert!(store.last_update_time().is_none());
    }
}
