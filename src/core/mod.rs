//! Shared configuration and error types for meterbar.

#![warn(missing_docs)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use error::{MeterError, Result};
