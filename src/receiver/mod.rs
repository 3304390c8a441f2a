//! OpenTelemetry metrics receiver.
//!
//! Accepts OTLP/HTTP exports on a loopback TCP socket, frames each
//! connection's bytes into one HTTP request, decodes `POST /v1/metrics`
//! bodies and feeds them to the shared [`MetricsStore`]. Every completed
//! request gets the same `200 {}` reply and the connection is closed.

pub mod http;
pub mod metrics;

use crate::core::config::ServerConfig;
use crate::core::{MeterError, Result};
use crate::metrics::{IngestReport, MetricDataPoint, MetricsStore};
use crate::monitoring::ReceiverStats;
use chrono::{DateTime, Utc};
use http::{HttpRequest, RequestFramer, OTLP_SUCCESS_RESPONSE};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Store shared between the receiver (single writer) and the display.
pub type SharedStore = Arc<parking_lot::Mutex<MetricsStore>>;

/// Published once per non-empty decoded batch, after it was ingested.
#[derive(Debug, Clone)]
pub struct MetricsEvent {
    pub data_points: Arc<[MetricDataPoint]>,
    pub report: IngestReport,
    pub received_at: DateTime<Utc>,
}

/// OTLP/HTTP metrics receiver bound to a loopback address.
pub struct OtlpReceiver {
    /// Listen address
    addr: SocketAddr,
    /// Bytes requested per socket read
    read_buffer_size: usize,
    /// Aggregated usage state
    store: SharedStore,
    /// Receiver counters
    stats: Arc<ReceiverStats>,
    /// New-data notifications for the presentation layer
    event_sender: broadcast::Sender<MetricsEvent>,
}

impl OtlpReceiver {
    /// Create a receiver writing into `store`.
    pub fn new(config: &ServerConfig, store: SharedStore) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            addr: config.socket_addr(),
            read_buffer_size: config.read_buffer_size.max(1),
            store,
            stats: Arc::new(ReceiverStats::new()),
            event_sender,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn stats(&self) -> &Arc<ReceiverStats> {
        &self.stats
    }

    /// Subscribe to new-data events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<MetricsEvent> {
        self.event_sender.subscribe()
    }

    /// Bind the listening socket. Only loopback addresses are accepted.
    pub async fn bind(&self) -> Result<TcpListener> {
        if !self.addr.ip().is_loopback() {
            return Err(MeterError::config(format!(
                "Refusing to listen on non-loopback address {}",
                self.addr
            )));
        }

        let listener = TcpListener::bind(self.addr).await.map_err(|source| MeterError::Bind {
            addr: self.addr,
            source,
        })?;

        tracing::info!("OTLP receiver listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Bind and serve until the task is dropped.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener, one task each.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Failed to accept OTLP connection: {}", e);
                    continue;
                },
            };

            self.stats.record_connection();
            tracing::debug!("Accepted OTLP connection from {}", peer);

            let receiver = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = receiver.handle_connection(stream).await {
                    receiver.stats.record_connection_error();
                    tracing::debug!(
                        category = e.category(),
                        "Connection from {} closed with error: {}",
                        peer,
                        e
                    );
                }
            });
        }
    }

    /// Read until one request is framed, answer it and close.
    async fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        let mut framer = RequestFramer::new();
        let mut chunk = vec![0u8; self.read_buffer_size];

        let request = loop {
            let read = stream.read(&mut chunk).await?;
            if read == 0 {
                self.stats.record_incomplete();
                tracing::debug!(
                    buffered = framer.buffered(),
                    "Connection closed before a complete request arrived"
                );
                return Ok(());
            }
            if let Some(request) = framer.push(&chunk[..read]) {
                break request;
            }
        };

        self.stats.record_request();
        self.dispatch(&request);

        stream.write_all(OTLP_SUCCESS_RESPONSE).await?;
        // The peer may already be gone; the reply was best effort anyway
        let _ = stream.shutdown().await;
        Ok(())
    }

    /// Handle a completed request. Returns the ingest report when the
    /// request carried a non-empty metrics batch.
    pub fn dispatch(&self, request: &HttpRequest) -> Option<IngestReport> {
        if !request.is_metrics_export() {
            self.stats.record_discarded();
            tracing::debug!("Acknowledged and discarded {} {}", request.method, request.path);
            return None;
        }

        let points = metrics::decode_metrics(&request.body);
        if points.is_empty() {
            tracing::debug!("Metrics export of {} bytes decoded to no data points", request.body.len());
            return None;
        }

        Some(self.ingest_batch(points))
    }

    fn ingest_batch(&self, points: Vec<MetricDataPoint>) -> IngestReport {
        let data_points: Arc<[MetricDataPoint]> = points.into();
        let received_at = Utc::now();

        let mut store = self.store.lock();
        let report = store.ingest_at(&data_points, received_at);
        self.stats.record_batch(data_points.len());

        tracing::debug!(
            points = data_points.len(),
            routed = report.routed,
            ignored = report.ignored,
            resets = report.counter_resets,
            "Ingested metrics batch"
        );

        // Sent while the store is still locked so events follow ingest order.
        // No subscribers is fine.
        let _ = self.event_sender.send(MetricsEvent {
            data_points,
            report,
            received_at,
        });
        drop(store);

        report
    }
}
