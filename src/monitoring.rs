//! Receiver health counters.
//!
//! Lock-free counters updated by connection tasks and read by the display
//! and at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for the OTLP receiver.
#[derive(Debug, Default)]
pub struct ReceiverStats {
    connections_accepted: AtomicU64,
    requests_completed: AtomicU64,
    incomplete_requests: AtomicU64,
    discarded_requests: AtomicU64,
    metric_batches: AtomicU64,
    data_points: AtomicU64,
    connection_errors: AtomicU64,
}

/// Point-in-time copy of [`ReceiverStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReceiverSnapshot {
    /// Connections accepted by the listener
    pub connections_accepted: u64,
    /// Requests fully framed and answered
    pub requests_completed: u64,
    /// Connections closed before a full request arrived
    pub incomplete_requests: u64,
    /// Completed requests that were not metrics exports
    pub discarded_requests: u64,
    /// Non-empty metric batches handed to the store
    pub metric_batches: u64,
    /// Data points decoded across all batches
    pub data_points: u64,
    /// Connections torn down by a socket error
    pub connection_errors: u64,
}

impl ReceiverStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incomplete(&self) {
        self.incomplete_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self, points: usize) {
        self.metric_batches.fetch_add(1, Ordering::Relaxed);
        self.data_points.fetch_add(points as u64, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReceiverSnapshot {
        ReceiverSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            incomplete_requests: self.incomplete_requests.load(Ordering::Relaxed),
            discarded_requests: self.discarded_requests.load(Ordering::Relaxed),
            metric_batches: self.metric_batches.load(Ordering::Relaxed),
            data_points: self.data_points.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
        }
    }
}
