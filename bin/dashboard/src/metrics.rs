//! Prometheus metrics for the dashboard.
//!
//! All metrics are aggregated in the [`Metrics`] struct. Without an installed
//! exporter every recording is a no-op.

use client::{TxOutcome, WalletEvent};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::{net::SocketAddr, time::Duration};
use view::Failure;

/// Aggregated metrics for the dashboard.
///
/// Metric descriptions are registered with the global registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Submission metrics
        describe_counter!(
            "dashboard_submissions_total",
            "Total number of form submissions by view"
        );
        describe_counter!(
            "dashboard_submissions_success_total",
            "Total number of confirmed submissions by view"
        );
        describe_counter!(
            "dashboard_submissions_failure_total",
            "Total number of failed submissions by view and failure kind"
        );
        describe_histogram!(
            "dashboard_submission_duration_seconds",
            "Duration from submit to confirmation or failure in seconds"
        );

        // Home metrics
        describe_counter!(
            "dashboard_refreshes_total",
            "Total number of home view refreshes"
        );

        // Wallet metrics
        describe_counter!(
            "dashboard_wallet_events_total",
            "Total number of wallet events by kind"
        );
    }

    /// Record a finished submission.
    pub fn record_submission(
        &self,
        view: &'static str,
        result: &Result<TxOutcome, Failure>,
        duration: Duration,
    ) {
        counter!("dashboard_submissions_total", "view" => view).increment(1);
        histogram!("dashboard_submission_duration_seconds", "view" => view)
            .record(duration.as_secs_f64());

        match result {
            Ok(_) => counter!("dashboard_submissions_success_total", "view" => view).increment(1),
            Err(failure) => counter!(
                "dashboard_submissions_failure_total",
                "view" => view,
                "kind" => failure.kind()
            )
            .increment(1),
        }
    }

    /// Record a home view refresh.
    pub fn record_refresh(&self) {
        counter!("dashboard_refreshes_total").increment(1);
    }

    /// Record a wallet event.
    pub fn record_wallet_event(&self, event: &WalletEvent) {
        let kind = match event {
            WalletEvent::AccountsChanged(_) => "accounts_changed",
            WalletEvent::ChainChanged(_) => "chain_changed",
        };
        counter!("dashboard_wallet_events_total", "kind" => kind).increment(1);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to `addr`.
pub fn install_prometheus_exporter(addr: SocketAddr) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
