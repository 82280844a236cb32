//! Optional persisted state (SPEC_FULL §6): a capture file of frame
//! traffic and a textual replay log of visualizer events. Neither
//! feeds back into simulator semantics on read — both are write-only
//! observers wired in alongside (not instead of) the dispatcher's own
//! delivery path. Grounded on `build_model.rs`'s `generate_yaml` (a
//! `Box<dyn Write>` that targets either a file or stdout, written line
//! by line) and on `threadsim-wire`'s frame encoding for the binary
//! capture format.

use crate::error::{DispatchError, DispatchResult};
use crate::visualizer::{DeviceRole, PartitionId, Visualizer};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use threadsim_core::event::Event;
use threadsim_core::{NodeId, SimTime};
use threadsim_radio::Position;
use threadsim_wire::encode_event;

/// Appends every dispatched frame's wire encoding to a file, for later
/// offline replay or inspection. Write-only: nothing reads this back
/// into the running simulation.
pub struct FrameCapture {
    writer: BufWriter<File>,
}

impl FrameCapture {
    pub fn create(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let file = File::create(path).map_err(io_err)?;
        Ok(FrameCapture { writer: BufWriter::new(file) })
    }

    pub fn record(&mut self, evt: &Event) -> DispatchResult<()> {
        let buf = encode_event(evt)?;
        self.writer.write_all(&buf).map_err(io_err)
    }

    pub fn flush(&mut self) -> DispatchResult<()> {
        self.writer.flush().map_err(io_err)
    }
}

fn io_err(e: io::Error) -> DispatchError {
    DispatchError::InvalidArgument { message: format!("capture file I/O error: {e}") }
}

/// A [`Visualizer`] that writes every call as one line of text, for a
/// human-readable record of what a front end would have shown.
pub struct ReplayLogWriter {
    writer: BufWriter<File>,
}

impl ReplayLogWriter {
    pub fn create(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let file = File::create(path).map_err(io_err)?;
        Ok(ReplayLogWriter { writer: BufWriter::new(file) })
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
    }
}

impl Visualizer for ReplayLogWriter {
    fn add_node(&mut self, id: NodeId, position: Position) {
        self.line(&format!("add_node {id} {} {} {}", position.x, position.y, position.z));
    }

    fn delete_node(&mut self, id: NodeId) {
        self.line(&format!("delete_node {id}"));
    }

    fn set_node_position(&mut self, id: NodeId, position: Position) {
        self.line(&format!("set_node_position {id} {} {} {}", position.x, position.y, position.z));
    }

    fn set_node_role(&mut self, id: NodeId, role: DeviceRole) {
        self.line(&format!("set_node_role {id} {role:?}"));
    }

    fn set_node_partition(&mut self, id: NodeId, partition: PartitionId) {
        self.line(&format!("set_node_partition {id} {}", partition.0));
    }

    fn set_node_rloc16(&mut self, id: NodeId, rloc16: u16) {
        self.line(&format!("set_node_rloc16 {id} {rloc16:#06x}"));
    }

    fn set_node_mode(&mut self, id: NodeId, mode: &str) {
        self.line(&format!("set_node_mode {id} {mode}"));
    }

    fn set_node_ext_addr(&mut self, id: NodeId, ext_addr: u64) {
        self.line(&format!("set_node_ext_addr {id} {ext_addr:#018x}"));
    }

    fn add_router_table_entry(&mut self, id: NodeId, router: NodeId) {
        self.line(&format!("add_router_table_entry {id} {router}"));
    }

    fn remove_router_table_entry(&mut self, id: NodeId, router: NodeId) {
        self.line(&format!("remove_router_table_entry {id} {router}"));
    }

    fn add_child_table_entry(&mut self, id: NodeId, child: NodeId) {
        self.line(&format!("add_child_table_entry {id} {child}"));
    }

    fn remove_child_table_entry(&mut self, id: NodeId, child: NodeId) {
        self.line(&format!("remove_child_table_entry {id} {child}"));
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            Some(p) => self.line(&format!("set_parent {id} {p}")),
            None => self.line(&format!("set_parent {id} none")),
        }
    }

    fn advance_time(&mut self, now: SimTime) {
        self.line(&format!("advance_time {}", now.as_micros()));
    }

    fn on_node_fail(&mut self, id: NodeId) {
        self.line(&format!("on_node_fail {id}"));
    }

    fn on_node_recover(&mut self, id: NodeId) {
        self.line(&format!("on_node_recover {id}"));
    }

    fn send(&mut self, src: NodeId, dst: Option<NodeId>, at: SimTime) {
        match dst {
            Some(d) => self.line(&format!("send {src} {d} {}", at.as_micros())),
            None => self.line(&format!("send {src} broadcast {}", at.as_micros())),
        }
    }

    fn show_title(&mut self, title: &str) {
        self.line(&format!("show_title {title}"));
    }

    fn show_legend(&mut self, on: bool) {
        self.line(&format!("show_legend {on}"));
    }

    fn show_countdown(&mut self, remaining_us: u64) {
        self.line(&format!("show_countdown {remaining_us}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use tempfile::NamedTempFile;

    #[test]
    fn replay_log_writes_one_line_per_call() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut log = ReplayLogWriter::create(tmp.path()).unwrap();
            log.add_node(NodeId(1), Position::default());
            log.advance_time(SimTime::from_micros(500));
        }
        let mut contents = String::new();
        File::open(tmp.path()).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().starts_with("add_node 1"));
    }
}
