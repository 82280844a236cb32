//! Operational telemetry for the threadsim dispatcher (SPEC_FULL §10.4).
//!
//! Distinct from the spec's own `Counters` (`threadsim-core::CounterName`),
//! which are simulation-semantic values asserted directly by tests: these
//! metrics describe the dispatcher's own wall-clock behavior (step
//! latency, queue depth, dispatch throughput) and can be dropped or
//! sampled without affecting simulation outcomes. Re-exports the `metrics`
//! crate and declares every metric as a structured [`Metric`] constant to
//! avoid typos and give each one a description/unit/label set.
//!
//! # Example
//!
//! ```rust,ignore
//! use threadsim_metrics::{metric_defs, describe_metrics, MetricLabels};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new(1, "ideal").to_labels();
//! metrics::counter!(metric_defs::DISPATCH_EVENTS.name, &labels).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    pub labels: &'static [&'static str],
}

impl Metric {
    pub const fn counter(name: &'static str) -> Self {
        Self { name, kind: MetricKind::Counter, description: "", unit: None, labels: &[] }
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self { name, kind: MetricKind::Gauge, description: "", unit: None, labels: &[] }
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self { name, kind: MetricKind::Histogram, description: "", unit: None, labels: &[] }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    /// Called once at startup for each metric in [`metric_defs::ALL`].
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(self.name, unit, self.description),
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }

    pub fn unit_str(&self) -> &'static str {
        match self.unit {
            Some(Unit::Count) => "count",
            Some(Unit::Percent) => "percent",
            Some(Unit::Seconds) => "seconds",
            Some(Unit::Milliseconds) => "milliseconds",
            Some(Unit::Microseconds) => "microseconds",
            Some(Unit::Nanoseconds) => "nanoseconds",
            Some(Unit::Bytes) => "bytes",
            Some(Unit::CountPerSecond) => "count/second",
            _ => "",
        }
    }
}

/// All metric definitions for the dispatcher's operational telemetry.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Standard labels present on all node-scoped metrics.
    pub const STANDARD_LABELS: &[&str] = &["node", "radio_model"];

    // ========================================================================
    // Dispatch loop
    // ========================================================================

    /// Wall-clock time to execute one `Dispatcher::step` call.
    ///
    /// Labels: node
    pub const STEP_LATENCY: Metric = Metric::histogram("threadsim.dispatch.step_latency_us")
        .with_description("Wall-clock time to process one dispatched event")
        .with_unit(Unit::Microseconds)
        .with_labels(&["node"]);

    /// Events dispatched per `Dispatcher::step` call.
    pub const EVENTS_DISPATCHED: Metric = Metric::counter("threadsim.dispatch.events_total")
        .with_description("Total events pulled off the event queue and delivered")
        .with_unit(Unit::Count)
        .with_labels(&["node"]);

    /// Number of events currently queued but not yet dispatched.
    pub const QUEUE_DEPTH: Metric = Metric::gauge("threadsim.dispatch.queue_depth")
        .with_description("Events currently pending in the event queue")
        .with_unit(Unit::Count);

    /// Simulated-time lag behind the wall clock under a bounded speed.
    pub const VIRTUAL_TIME_LAG: Metric = Metric::gauge("threadsim.dispatch.virtual_time_lag_us")
        .with_description("Wall-clock microseconds the governor is sleeping past its anchor")
        .with_unit(Unit::Microseconds);

    // ========================================================================
    // Radio dispatch throughput
    // ========================================================================

    /// Radio-comm-start events accepted for transmission.
    ///
    /// Labels: node, radio_model
    pub const RADIO_TX_STARTED: Metric = Metric::counter("threadsim.radio.tx_started_total")
        .with_description("Radio transmissions accepted (not rejected by a failure window)")
        .with_unit(Unit::Count)
        .with_labels(&["node", "radio_model"]);

    /// Radio-received events delivered without error.
    ///
    /// Labels: node, radio_model
    pub const RADIO_RX_DELIVERED: Metric = Metric::counter("threadsim.radio.rx_delivered_total")
        .with_description("Radio receptions delivered with no error")
        .with_unit(Unit::Count)
        .with_labels(&["node", "radio_model"]);

    /// Radio receptions lost to a collision (per `CounterName::CollisionEvents`).
    pub const RADIO_RX_COLLIDED: Metric = Metric::counter("threadsim.radio.rx_collided_total")
        .with_description("Radio receptions lost to a concurrent-transmission collision")
        .with_unit(Unit::Count);

    /// Radio receptions dropped by the global packet loss ratio or an
    /// out-of-range/weak-SIR rejection.
    pub const RADIO_RX_DROPPED: Metric = Metric::counter("threadsim.radio.rx_dropped_total")
        .with_description("Radio receptions dropped (out of range, weak SIR, or loss ratio)")
        .with_unit(Unit::Count);

    /// Received signal strength at delivery, in dBm.
    ///
    /// Labels: node
    pub const RADIO_RX_RSSI: Metric = Metric::histogram("threadsim.radio.rx_rssi_dbm")
        .with_description("RSSI of a delivered reception in dBm")
        .with_labels(&["node"]);

    // ========================================================================
    // Node commands
    // ========================================================================

    /// `Command`/`CommandExpectNone` requests issued.
    pub const COMMAND_ISSUED: Metric = Metric::counter("threadsim.node.commands_issued_total")
        .with_description("Commands issued to a node over its UART")
        .with_unit(Unit::Count);

    /// Commands that timed out waiting for a reply.
    pub const COMMAND_TIMED_OUT: Metric = Metric::counter("threadsim.node.commands_timed_out_total")
        .with_description("Commands that hit their virtual-time timeout with no reply")
        .with_unit(Unit::Count);

    pub const ALL: &[&Metric] = &[
        &STEP_LATENCY,
        &EVENTS_DISPATCHED,
        &QUEUE_DEPTH,
        &VIRTUAL_TIME_LAG,
        &RADIO_TX_STARTED,
        &RADIO_RX_DELIVERED,
        &RADIO_RX_COLLIDED,
        &RADIO_RX_DROPPED,
        &RADIO_RX_RSSI,
        &COMMAND_ISSUED,
        &COMMAND_TIMED_OUT,
    ];
}

/// Metric labels identifying a node and the active radio model.
#[derive(Debug, Clone)]
pub struct MetricLabels {
    pub node: String,
    pub radio_model: String,
}

impl MetricLabels {
    pub fn new(node: impl std::fmt::Display, radio_model: impl Into<String>) -> Self {
        Self { node: node.to_string(), radio_model: radio_model.into() }
    }

    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("node", self.node.clone()), ("radio_model", self.radio_model.clone())]
    }

    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Registers every metric description with the active recorder. Call
/// once at startup (SPEC_FULL §10.4).
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_labels_round_trip() {
        let labels = MetricLabels::new(3, "ideal");
        let label_vec = labels.to_labels();
        assert!(label_vec.contains(&("node", "3".to_string())));
        assert!(label_vec.contains(&("radio_model", "ideal".to_string())));
    }

    #[test]
    fn with_extra_labels() {
        let labels = MetricLabels::new(1, "mi_disc");
        let extended = labels.with(&[("direction", "tx".to_string())]);
        assert_eq!(extended.len(), 3);
        assert!(extended.contains(&("direction", "tx".to_string())));
    }

    #[test]
    fn metric_definitions() {
        assert_eq!(metric_defs::STEP_LATENCY.name, "threadsim.dispatch.step_latency_us");
        assert_eq!(metric_defs::STEP_LATENCY.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::QUEUE_DEPTH.kind, MetricKind::Gauge);
        assert_eq!(metric_defs::COMMAND_TIMED_OUT.name, "threadsim.node.commands_timed_out_total");
    }

    #[test]
    fn all_metrics_present() {
        assert_eq!(metric_defs::ALL.len(), 11);
    }

    #[test]
    fn metric_minimal() {
        const MINIMAL: Metric = Metric::counter("minimal");
        assert_eq!(MINIMAL.name, "minimal");
        assert_eq!(MINIMAL.kind, MetricKind::Counter);
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }
}
