//! Usage metrics state.
//!
//! - `types`: decoded data points and the metric names we track
//! - `counter`: reset-aware cumulative counters
//! - `ring_buffer`: bounded per-batch history for sparklines
//! - `aggregator`: routing table and the shared store

pub mod aggregator;
pub mod counter;
pub mod ring_buffer;
pub mod types;

pub use aggregator::{route, CounterKind, IngestReport, MetricsStore, Route, Series};
pub use counter::CumulativeCounter;
pub use ring_buffer::{TimeSeriesBuffer, HISTORY_CAPACITY};
pub use types::MetricDataPoint;

#[cfg(test)]
mod integration_test;
