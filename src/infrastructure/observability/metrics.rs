//! Prometheus metrics definitions for the monitor.
//!
//! All metrics use the `canslim_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, GaugeVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

/// Prometheus metrics for the monitor.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Open positions per state (watchlist, entry1, entry2, ...).
    pub positions_by_state: GenericGaugeVec<AtomicF64>,
    /// Alerts emitted, by severity.
    pub alerts_total: CounterVec,
    /// Latest market regime composite score.
    pub regime_composite_score: GenericGauge<AtomicF64>,
    /// Latest market regime entry-risk score.
    pub regime_entry_risk_score: GenericGauge<AtomicF64>,
    /// Fear & Greed sentiment index (0-100).
    pub sentiment_score: GenericGauge<AtomicF64>,
    /// Worker cycles completed, by worker name.
    pub worker_cycles_total: CounterVec,
    /// Worker cycle failures, by worker name.
    pub worker_errors_total: CounterVec,
    /// Targets processed in a worker's most recent cycle.
    pub worker_last_cycle_messages: GenericGaugeVec<AtomicF64>,
    /// Uptime in seconds.
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let positions_by_state = GaugeVec::new(
            Opts::new("canslim_positions_by_state", "Open positions by state"),
            &["state"],
        )?;
        registry.register(Box::new(positions_by_state.clone()))?;

        let alerts_total = CounterVec::new(
            Opts::new("canslim_alerts_total", "Alerts emitted by severity"),
            &["severity"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        let regime_composite_score = Gauge::with_opts(Opts::new(
            "canslim_regime_composite_score",
            "Latest market regime composite score",
        ))?;
        registry.register(Box::new(regime_composite_score.clone()))?;

        let regime_entry_risk_score = Gauge::with_opts(Opts::new(
            "canslim_regime_entry_risk_score",
            "Latest market regime entry-risk score",
        ))?;
        registry.register(Box::new(regime_entry_risk_score.clone()))?;

        let sentiment_score = Gauge::with_opts(Opts::new(
            "canslim_sentiment_score",
            "Fear & Greed sentiment index (0-100)",
        ))?;
        registry.register(Box::new(sentiment_score.clone()))?;

        let worker_cycles_total = CounterVec::new(
            Opts::new("canslim_worker_cycles_total", "Worker cycles completed"),
            &["worker"],
        )?;
        registry.register(Box::new(worker_cycles_total.clone()))?;

        let worker_errors_total = CounterVec::new(
            Opts::new("canslim_worker_errors_total", "Worker cycle failures"),
            &["worker"],
        )?;
        registry.register(Box::new(worker_errors_total.clone()))?;

        let worker_last_cycle_messages = GaugeVec::new(
            Opts::new(
                "canslim_worker_last_cycle_messages",
                "Targets processed in a worker's most recent cycle",
            ),
            &["worker"],
        )?;
        registry.register(Box::new(worker_last_cycle_messages.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "canslim_uptime_seconds",
            "Monitor uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            positions_by_state,
            alerts_total,
            regime_composite_score,
            regime_entry_risk_score,
            sentiment_score,
            worker_cycles_total,
            worker_errors_total,
            worker_last_cycle_messages,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families).unwrap_or_default()
    }

    /// Set the open-position count for one state label (e.g. "entry1").
    pub fn set_positions_in_state(&self, state: &str, count: f64) {
        self.positions_by_state.with_label_values(&[state]).set(count);
    }

    /// Increment the emitted-alerts counter for a severity.
    pub fn inc_alert(&self, severity: &str) {
        self.alerts_total.with_label_values(&[severity]).inc();
    }

    /// Record one completed worker cycle and the number of targets it processed.
    pub fn record_worker_cycle(&self, worker: &str, processed: u64) {
        self.worker_cycles_total.with_label_values(&[worker]).inc();
        self.worker_last_cycle_messages.with_label_values(&[worker]).set(processed as f64);
    }

    /// Record a worker cycle failure.
    pub fn record_worker_error(&self, worker: &str) {
        self.worker_errors_total.with_label_values(&[worker]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("failed to create default Metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("failed to create metrics");
        assert!(metrics.render().contains("canslim_"));
    }

    #[test]
    fn test_positions_by_state() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.set_positions_in_state("entry1", 4.0);
        metrics.set_positions_in_state("watchlist", 12.0);
        let output = metrics.render();
        assert!(output.contains("canslim_positions_by_state"));
        assert!(output.contains("entry1"));
        assert!(output.contains("watchlist"));
    }

    #[test]
    fn test_alert_counter() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.inc_alert("critical");
        metrics.inc_alert("warning");
        let output = metrics.render();
        assert!(output.contains("canslim_alerts_total"));
        assert!(output.contains("critical"));
    }

    #[test]
    fn test_worker_cycle_tracking() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.record_worker_cycle("position_worker", 7);
        metrics.record_worker_error("market_worker");
        let output = metrics.render();
        assert!(output.contains("canslim_worker_cycles_total"));
        assert!(output.contains("canslim_worker_errors_total"));
        assert!(output.contains("canslim_worker_last_cycle_messages"));
    }
}
