//! Prometheus metrics for one CLI run
//!
//! The session library emits `session_*` counters through the `metrics`
//! facade; this module installs the recorder that collects them. With
//! `--metrics` the rendered text exposition is written to stderr on exit.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))
}

/// Record how the CLI command finished.
pub fn record_command(command: &'static str, success: bool) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("sessionctl_commands_total", "command" => command, "result" => result)
        .increment(1);
}
