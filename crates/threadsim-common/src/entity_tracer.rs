//! Per-node trace logging (SPEC_FULL §10.2 "per-node watch levels").
//! Generalized from this codebase's entity tracer: instead of a flat
//! enable/disable spec string, tracing is driven by each node's
//! [`threadsim_node::WatchLevel`], set via `Dispatcher::watch_node`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use threadsim_core::event::{Event, EventKind};
use threadsim_core::{NodeId, SimTime};
use threadsim_node::WatchLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    EventReceived,
    EventEmitted,
    StateChange,
    Operation,
    Timer,
    Custom,
}

impl fmt::Display for TraceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceCategory::EventReceived => write!(f, "EVENT_RX"),
            TraceCategory::EventEmitted => write!(f, "EVENT_TX"),
            TraceCategory::StateChange => write!(f, "STATE"),
            TraceCategory::Operation => write!(f, "OP"),
            TraceCategory::Timer => write!(f, "TIMER"),
            TraceCategory::Custom => write!(f, "TRACE"),
        }
    }
}

/// The minimum [`WatchLevel`] at which a category becomes visible.
fn category_min_level(category: TraceCategory) -> WatchLevel {
    match category {
        TraceCategory::EventReceived | TraceCategory::EventEmitted => WatchLevel::Debug,
        TraceCategory::StateChange | TraceCategory::Timer => WatchLevel::Info,
        TraceCategory::Operation => WatchLevel::Trace,
        TraceCategory::Custom => WatchLevel::Warn,
    }
}

#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub node: NodeId,
    pub sim_time: SimTime,
    pub category: TraceCategory,
    pub description: String,
    pub details: Vec<(String, String)>,
}

impl TraceEvent {
    pub fn event_received(node: NodeId, sim_time: SimTime, event: &Event) -> Self {
        TraceEvent {
            node,
            sim_time,
            category: TraceCategory::EventReceived,
            description: describe_event(event),
            details: vec![("delay_us".to_string(), event.delay_us.to_string())],
        }
    }

    pub fn event_emitted(node: NodeId, sim_time: SimTime, event: &Event) -> Self {
        TraceEvent {
            node,
            sim_time,
            category: TraceCategory::EventEmitted,
            description: describe_event(event),
            details: vec![("delay_us".to_string(), event.delay_us.to_string())],
        }
    }

    pub fn state_change(node: NodeId, sim_time: SimTime, description: impl Into<String>) -> Self {
        TraceEvent { node, sim_time, category: TraceCategory::StateChange, description: description.into(), details: Vec::new() }
    }

    pub fn operation(node: NodeId, sim_time: SimTime, description: impl Into<String>) -> Self {
        TraceEvent { node, sim_time, category: TraceCategory::Operation, description: description.into(), details: Vec::new() }
    }

    pub fn timer(node: NodeId, sim_time: SimTime, description: impl Into<String>) -> Self {
        TraceEvent { node, sim_time, category: TraceCategory::Timer, description: description.into(), details: Vec::new() }
    }

    pub fn custom(node: NodeId, sim_time: SimTime, description: impl Into<String>) -> Self {
        TraceEvent { node, sim_time, category: TraceCategory::Custom, description: description.into(), details: Vec::new() }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }
}

fn describe_event(event: &Event) -> String {
    match event.kind {
        EventKind::UartWrite => {
            let text = String::from_utf8_lossy(&event.payload);
            format!("UartWrite {:?}", sanitize_for_display(&text))
        }
        kind => format!("{kind:?} payload_len={}", event.payload.len()),
    }
}

fn sanitize_for_display(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\0' => result.push_str("\\0"),
            c if c.is_ascii_control() => result.push_str(&format!("\\x{:02x}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

#[derive(Debug, Clone)]
pub struct EntityTracerConfig {
    traced_nodes: HashSet<NodeId>,
    trace_all: bool,
}

impl EntityTracerConfig {
    pub fn none() -> Self {
        EntityTracerConfig { traced_nodes: HashSet::new(), trace_all: false }
    }

    pub fn all() -> Self {
        EntityTracerConfig { traced_nodes: HashSet::new(), trace_all: true }
    }

    pub fn watch(mut self, id: NodeId) -> Self {
        self.traced_nodes.insert(id);
        self
    }

    pub fn unwatch(&mut self, id: NodeId) {
        self.traced_nodes.remove(&id);
    }

    pub fn is_enabled(&self) -> bool {
        self.trace_all || !self.traced_nodes.is_empty()
    }

    pub fn should_trace(&self, id: NodeId) -> bool {
        self.trace_all || self.traced_nodes.contains(&id)
    }
}

impl Default for EntityTracerConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-node trace sink, gated by each node's [`WatchLevel`] (set via
/// `Dispatcher::watch_node`) rather than the tracer's own config.
#[derive(Clone)]
pub struct EntityTracer {
    config: Arc<EntityTracerConfig>,
}

impl EntityTracer {
    pub fn new(config: EntityTracerConfig) -> Self {
        EntityTracer { config: Arc::new(config) }
    }

    pub fn disabled() -> Self {
        EntityTracer::new(EntityTracerConfig::none())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn should_trace(&self, id: NodeId) -> bool {
        self.config.should_trace(id)
    }

    pub fn config(&self) -> &EntityTracerConfig {
        &self.config
    }

    /// Logs `event` if its node is watched at or above the category's
    /// minimum [`WatchLevel`].
    pub fn log(&self, event: TraceEvent, node_watch_level: WatchLevel) {
        if !self.config.should_trace(event.node) {
            return;
        }
        if node_watch_level < category_min_level(event.category) {
            return;
        }
        self.output_trace(&event);
    }

    fn output_trace(&self, event: &TraceEvent) {
        let time_ms = event.sim_time.as_micros() as f64 / 1000.0;
        let details_str = if event.details.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = event.details.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!(" [{}]", parts.join(", "))
        };
        tracing::debug!(
            node = %event.node,
            sim_time_ms = time_ms,
            category = %event.category,
            "{}{}",
            event.description,
            details_str
        );
    }
}

impl Default for EntityTracer {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_none_traces_nothing() {
        let config = EntityTracerConfig::none();
        assert!(!config.is_enabled());
        assert!(!config.should_trace(NodeId(1)));
    }

    #[test]
    fn config_watch_traces_only_watched_node() {
        let config = EntityTracerConfig::none().watch(NodeId(1));
        assert!(config.should_trace(NodeId(1)));
        assert!(!config.should_trace(NodeId(2)));
    }

    #[test]
    fn config_all_traces_every_node() {
        let config = EntityTracerConfig::all();
        assert!(config.should_trace(NodeId(1)));
        assert!(config.should_trace(NodeId(999)));
    }

    #[test]
    fn category_gated_by_watch_level() {
        let tracer = EntityTracer::new(EntityTracerConfig::all());
        let evt = TraceEvent::operation(NodeId(1), SimTime::ZERO, "step");
        // Operation requires Trace; Info is below that, so nothing panics
        // and the call is simply dropped (no observable assertion, but
        // `should_trace` plus the min-level check both run).
        tracer.log(evt, WatchLevel::Info);
    }
}
