//! meterbar - local usage meter for Claude Code.
//!
//! Claude Code can export its usage telemetry as OTLP/JSON metrics. meterbar
//! listens for those exports on a loopback port, keeps reset-aware running
//! totals for tokens, cost, sessions and code activity, and renders them in
//! the terminal with short sparkline histories.
//!
//! # Architecture
//!
//! - `receiver`: loopback HTTP listener, request framing and OTLP/JSON decoding
//! - `metrics`: data points, cumulative counters, history buffers, aggregation
//! - `display`: number formatting and the terminal dashboard
//! - `monitoring`: receiver health counters
//! - `core`: configuration and errors
//! - `cli`: command-line interface and run loop
//!
//! # Example
//!
//! ```no_run
//! use meterbar_lib::receiver::{OtlpReceiver, SharedStore};
//! use meterbar_lib::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> meterbar_lib::Result<()> {
//!     let config = Config::default();
//!     let store = SharedStore::default();
//!     let receiver = Arc::new(OtlpReceiver::new(&config.server, Arc::clone(&store)));
//!     receiver.run().await
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod display;
pub mod metrics;
pub mod monitoring;
pub mod receiver;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
