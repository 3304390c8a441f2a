//! Command-line interface for meterbar.
//!
//! Parses flags, loads configuration, sets up logging and runs the receiver
//! with a plain-text terminal display. Just run `meterbar` and point the
//! Claude Code OTLP exporter at it.

use crate::core::config::ConfigBuilder;
use crate::core::{Config, MeterError, Result};
use crate::display::{render_dashboard, render_receiver_footer, render_waiting, status_title};
use crate::receiver::{OtlpReceiver, SharedStore};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

/// Local OTLP receiver and usage meter for Claude Code.
#[derive(Parser, Debug)]
#[command(name = "meterbar")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// HTTP port for the OTLP receiver (default 4318)
    #[arg(long, env = "METERBAR_HTTP_PORT")]
    pub port: Option<u16>,

    /// Configuration file path (default: ~/.config/meterbar/config.yaml)
    #[arg(short, long, env = "METERBAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "METERBAR_DEBUG")]
    pub debug: bool,

    /// Do not print the status line or dashboard
    #[arg(short, long)]
    pub quiet: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Show version information
    #[arg(short = 'V', long = "show-version")]
    pub version: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return self.build_config_from_args(builder),
            },
        };

        let content = tokio::fs::read_to_string(&config_path).await.map_err(|e| {
            MeterError::config(format!("Failed to read config file {:?}: {}", config_path, e))
        })?;

        self.build_config_from_args(builder.from_yaml(&content)?)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(port) = self.port {
            builder = builder.http_port(port);
        }
        if self.quiet {
            builder = builder.display(false);
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging on stderr, keeping stdout for the display.
    ///
    /// `RUST_LOG` wins, then `METERBAR_LOG_LEVEL`, then the configured level.
    /// `--debug` forces debug output.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let level = if self.debug {
            "debug".to_string()
        } else {
            std::env::var("METERBAR_LOG_LEVEL")
                .unwrap_or_else(|_| config.logging.level.as_str().to_string())
        };

        let filter = if self.debug {
            EnvFilter::new(level)
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
        };

        let fmt_layer = if config.logging.structured {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .compact()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_line_number(false)
                .compact()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| MeterError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meterbar").join("config.yaml"))
}

/// Execute the meterbar application.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.version {
        println!("meterbar {}", env!("CARGO_PKG_VERSION"));
        println!("Local OTLP usage meter for Claude Code");
        return Ok(());
    }

    let config = cli.load_config().await?;
    cli.init_logging(&config)?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Listen address: {}", config.server.socket_addr());
        println!("  Read buffer: {} bytes", config.server.read_buffer_size);
        println!("  Display: {}", if config.display.enabled { "on" } else { "off" });
        println!("  Summary interval: {:?}", config.display.summary_interval);
        println!("  Log level: {}", config.logging.level.as_str());
        return Ok(());
    }

    run(config).await
}

/// Bind the receiver and drive the display until Ctrl-C.
///
/// A failed bind is returned to the caller without being logged here.
pub async fn run(config: Config) -> Result<()> {
    let store = SharedStore::default();
    let receiver = Arc::new(OtlpReceiver::new(&config.server, Arc::clone(&store)));

    let listener = receiver.bind().await?;
    let addr = listener.local_addr()?;
    let mut events = receiver.subscribe_events();
    let server = tokio::spawn(Arc::clone(&receiver).serve(listener));

    let display = config.display.enabled;
    if display {
        println!("meterbar listening on http://{}", addr);
        println!("{}", render_waiting());
    }

    let mut summary = tokio::time::interval(config.display.summary_interval);
    summary.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    summary.tick().await;

    let mut reset = reset_signal();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                tracing::info!("Received shutdown signal, stopping...");
                break Ok(());
            }
            () = wait_for_reset(&mut reset) => {
                store.lock().reset_all();
                tracing::info!("Usage statistics reset");
                if display {
                    println!("Statistics reset");
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    tracing::debug!(
                        points = event.data_points.len(),
                        routed = event.report.routed,
                        received_at = %event.received_at,
                        "New metrics data"
                    );
                    if display {
                        if let Some(title) = status_title(&store.lock()) {
                            println!("{}", title);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Display skipped {} metrics events", skipped);
                }
                Err(RecvError::Closed) => break Err(MeterError::ChannelClosed),
            },
            _ = summary.tick() => {
                if display {
                    let store = store.lock();
                    if store.has_received_data() {
                        println!("\n{}", render_dashboard(&store, Utc::now()));
                        println!("{}\n", render_receiver_footer(&receiver.stats().snapshot()));
                    }
                }
            }
        }
    };

    server.abort();
    match server.await {
        Ok(Err(e)) => return Err(e),
        Err(e) if !e.is_cancelled() => return Err(e.into()),
        _ => {},
    }

    let stats = receiver.stats().snapshot();
    tracing::info!(
        connections = stats.connections_accepted,
        requests = stats.requests_completed,
        batches = stats.metric_batches,
        points = stats.data_points,
        "OTLP receiver stopped"
    );

    outcome
}

#[cfg(unix)]
type ResetSignal = Option<tokio::signal::unix::Signal>;

#[cfg(not(unix))]
type ResetSignal = ();

/// SIGHUP clears all usage statistics.
#[cfg(unix)]
fn reset_signal() -> ResetSignal {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::hangup()) {
        Ok(signal) => Some(signal),
        Err(e) => {
            tracing::warn!("SIGHUP reset unavailable: {}", e);
            None
        },
    }
}

#[cfg(not(unix))]
fn reset_signal() -> ResetSignal {}

#[cfg(unix)]
async fn wait_for_reset(signal: &mut ResetSignal) {
    if let Some(hangup) = signal {
        if hangup.recv().await.is_some() {
            return;
        }
    }
    *signal = None;
    std::future::pending::<()>().await
}

#[cfg(not(unix))]
async fn wait_for_reset(_signal: &mut ResetSignal) {
    std::future::pending::<()>().await
}
