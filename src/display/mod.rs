//! Terminal rendering of aggregated usage.
//!
//! Read-only view over [`MetricsStore`]: number formatting, sparklines, the
//! one-line status title and the multi-section dashboard.

use crate::metrics::{CounterKind, MetricsStore, Series};
use crate::monitoring::ReceiverSnapshot;
use chrono::{DateTime, Utc};

/// Shown until the first metrics batch arrives.
pub const SETUP_INSTRUCTIONS: [&str; 5] = [
    "export CLAUDE_CODE_ENABLE_TELEMETRY=1",
    "export OTEL_METRICS_EXPORTER=otlp",
    "export OTEL_EXPORTER_OTLP_PROTOCOL=http/json",
    "export OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4318",
    "export OTEL_METRIC_EXPORT_INTERVAL=10000",
];

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Compact token count: `950`, `12.3K`, `4.5M`.
pub fn format_token_count(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value as i64)
    }
}

/// Rounded integer with thousands separators: `1,234,567`.
pub fn format_full_number(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Dollar amount; sub-cent costs keep four decimals.
pub fn format_cost(value: f64) -> String {
    if value > 0.0 && value < 0.01 {
        format!("${:.4}", value)
    } else {
        format!("${:.2}", value)
    }
}

/// `42s`, `3m 5s`, `2h 10m`.
pub fn format_active_time(seconds: f64) -> String {
    let total = seconds as i64;
    if total < 60 {
        return format!("{}s", total);
    }
    let minutes = total / 60;
    if minutes < 60 {
        return format!("{}m {}s", minutes, total % 60);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Relative age of the last update.
pub fn format_updated_ago(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last_update) = last_update else {
        return "No data yet".to_string();
    };

    let elapsed = (now - last_update).num_seconds().max(0);
    if elapsed < 5 {
        "Updated just now".to_string()
    } else if elapsed < 60 {
        format!("Updated {}s ago", elapsed)
    } else if elapsed < 3600 {
        format!("Updated {}m ago", elapsed / 60)
    } else {
        format!("Updated {}h ago", elapsed / 3600)
    }
}

/// Block-glyph sparkline scaled between the sample min and max.
/// Fewer than two samples render as nothing.
pub fn sparkline(values: &[f64]) -> String {
    if values.len() < 2 {
        return String::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            if range == 0.0 {
                return SPARK_BLOCKS[0];
            }
            let idx = (((v - min) / range) * 7.0) as usize;
            SPARK_BLOCKS[idx.min(7)]
        })
        .collect()
}

/// Status-bar style title, ` ↑<input> ↓<output>`, once data has arrived.
pub fn status_title(store: &MetricsStore) -> Option<String> {
    if !store.has_received_data() {
        return None;
    }
    let input = store.total(Series::Counter(CounterKind::InputTokens));
    let output = store.total(Series::Counter(CounterKind::OutputTokens));
    Some(format!(" ↑{} ↓{}", format_token_count(input), format_token_count(output)))
}

/// Waiting message with exporter setup hints.
pub fn render_waiting() -> String {
    let mut lines = vec!["Waiting for Claude Code metrics...".to_string(), String::new(), "Setup:".to_string()];
    lines.extend(SETUP_INSTRUCTIONS.iter().map(|line| format!("  {}", line)));
    lines.join("\n")
}

fn row(label: &str, value: &str, history: &[f64]) -> String {
    format!("  {:<14}{:>14}  {}", label, value, sparkline(history))
        .trim_end()
        .to_string()
}

fn counter_row(store: &MetricsStore, kind: CounterKind) -> String {
    let series = Series::Counter(kind);
    let total = store.total(series);
    let value = match kind {
        CounterKind::ActiveTime => format_active_time(total),
        _ => format_full_number(total),
    };
    row(kind.label(), &value, &store.samples(series))
}

/// Full dashboard: cost, tokens and activity sections.
pub fn render_dashboard(store: &MetricsStore, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "⚡ meterbar".to_string(),
        format_updated_ago(store.last_update_time(), now),
        String::new(),
        "● Cost".to_string(),
        row(
            "Total",
            &format_cost(store.total_cost()),
            &store.samples(Series::TotalCost),
        ),
    ];

    let models = store.model_costs();
    if models.len() > 1 {
        lines.extend(models.iter().map(|(model, cost)| row(model, &format_cost(*cost), &[])));
    }

    lines.push("◆ Tokens".to_string());
    for kind in [
        CounterKind::InputTokens,
        CounterKind::OutputTokens,
        CounterKind::CacheReadTokens,
        CounterKind::CacheCreationTokens,
    ] {
        lines.push(counter_row(store, kind));
    }

    lines.push("▲ Activity".to_string());
    for kind in [
        CounterKind::Sessions,
        CounterKind::ActiveTime,
        CounterKind::LinesAdded,
        CounterKind::LinesRemoved,
        CounterKind::Commits,
        CounterKind::PullRequests,
    ] {
        lines.push(counter_row(store, kind));
    }

    lines.join("\n")
}

/// One-line receiver summary.
pub fn render_receiver_footer(stats: &ReceiverSnapshot) -> String {
    format!(
        "receiver: {} connections, {} requests, {} batches, {} points, {} discarded, {} incomplete, {} errors",
        stats.connections_accepted,
        stats.requests_completed,
        stats.metric_batches,
        stats.data_points,
        stats.discarded_requests,
        stats.incomplete_requests,
        stats.connection_errors
    )
}
