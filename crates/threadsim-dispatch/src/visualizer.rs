//! The visualizer contract (SPEC_FULL §6: "consumed, not defined here").
//! Every call here is fire-and-forget from the dispatcher's perspective —
//! a visualizer implementation owns its own rendering/IO and must not
//! block or fail the simulation. Grounded on `rerun_blueprint.rs`'s entity
//! path organization (per-node vs. per-network vs. global), generalized
//! from a rerun-specific logger into a plain trait so this crate carries
//! no visualization dependency of its own.

use threadsim_core::{NodeId, SimTime};
use threadsim_radio::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Disabled,
    Detached,
    Child,
    Router,
    Leader,
}

/// Consumed by the dispatcher after every topology- or time-affecting
/// mutation. A default no-op/logging implementation ([`LoggingVisualizer`])
/// is provided so the dispatcher always has a sink to call into; a real
/// front end (web UI, rerun, a replay writer) implements this instead.
pub trait Visualizer: Send {
    fn add_node(&mut self, id: NodeId, position: Position) {
        let _ = (id, position);
    }

    fn delete_node(&mut self, id: NodeId) {
        let _ = id;
    }

    fn set_node_position(&mut self, id: NodeId, position: Position) {
        let _ = (id, position);
    }

    fn set_node_role(&mut self, id: NodeId, role: DeviceRole) {
        let _ = (id, role);
    }

    fn set_node_partition(&mut self, id: NodeId, partition: PartitionId) {
        let _ = (id, partition);
    }

    fn set_node_rloc16(&mut self, id: NodeId, rloc16: u16) {
        let _ = (id, rloc16);
    }

    fn set_node_mode(&mut self, id: NodeId, mode: &str) {
        let _ = (id, mode);
    }

    fn set_node_ext_addr(&mut self, id: NodeId, ext_addr: u64) {
        let _ = (id, ext_addr);
    }

    fn add_router_table_entry(&mut self, id: NodeId, router: NodeId) {
        let _ = (id, router);
    }

    fn remove_router_table_entry(&mut self, id: NodeId, router: NodeId) {
        let _ = (id, router);
    }

    fn add_child_table_entry(&mut self, id: NodeId, child: NodeId) {
        let _ = (id, child);
    }

    fn remove_child_table_entry(&mut self, id: NodeId, child: NodeId) {
        let _ = (id, child);
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        let _ = (id, parent);
    }

    fn advance_time(&mut self, now: SimTime) {
        let _ = now;
    }

    fn on_node_fail(&mut self, id: NodeId) {
        let _ = id;
    }

    fn on_node_recover(&mut self, id: NodeId) {
        let _ = id;
    }

    fn send(&mut self, src: NodeId, dst: Option<NodeId>, at: SimTime) {
        let _ = (src, dst, at);
    }

    fn show_title(&mut self, title: &str) {
        let _ = title;
    }

    fn show_legend(&mut self, on: bool) {
        let _ = on;
    }

    fn show_countdown(&mut self, remaining_us: u64) {
        let _ = remaining_us;
    }
}

/// Logs every call at `trace` level and otherwise does nothing; installed
/// by default so the dispatcher always has a visualizer to call into.
#[derive(Debug, Default)]
pub struct LoggingVisualizer;

impl Visualizer for LoggingVisualizer {
    fn add_node(&mut self, id: NodeId, position: Position) {
        tracing::trace!(node = %id, x = position.x, y = position.y, "visualizer: add_node");
    }

    fn delete_node(&mut self, id: NodeId) {
        tracing::trace!(node = %id, "visualizer: delete_node");
    }

    fn set_node_position(&mut self, id: NodeId, position: Position) {
        tracing::trace!(node = %id, x = position.x, y = position.y, "visualizer: set_node_position");
    }

    fn on_node_fail(&mut self, id: NodeId) {
        tracing::trace!(node = %id, "visualizer: on_node_fail");
    }

    fn on_node_recover(&mut self, id: NodeId) {
        tracing::trace!(node = %id, "visualizer: on_node_recover");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_methods_are_no_ops_and_dont_panic() {
        struct Inert;
        impl Visualizer for Inert {}
        let mut v = Inert;
        v.add_node(NodeId(1), Position::default());
        v.set_node_role(NodeId(1), DeviceRole::Leader);
        v.advance_time(SimTime::ZERO);
        v.show_title("test");
    }
}
