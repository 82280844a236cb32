//! Background watchdog thread monitoring the dispatcher's current event
//! (SPEC_FULL §4.5, §5). Grounded on the old `mcsim-runner` watchdog's
//! `Arc<Mutex<Option<CurrentEventInfo>>>` + polling-thread design; the
//! event payload description here is specialized to `EventKind` rather
//! than `mcsim_common::EventPayload`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use threadsim_core::event::EventKind;
use threadsim_core::{NodeId, SimTime};

#[derive(Debug, Clone)]
pub struct CurrentEventInfo {
    pub kind: EventKind,
    pub node: NodeId,
    pub sim_time: SimTime,
    pub started_at: Instant,
}

#[derive(Clone, Default)]
pub struct WatchdogState {
    current: Arc<Mutex<Option<CurrentEventInfo>>>,
}

impl WatchdogState {
    pub fn new() -> Self {
        WatchdogState::default()
    }

    pub fn begin(&self, kind: EventKind, node: NodeId, sim_time: SimTime) {
        *self.current.lock() = Some(CurrentEventInfo { kind, node, sim_time, started_at: Instant::now() });
    }

    pub fn end(&self) {
        *self.current.lock() = None;
    }

    pub fn current(&self) -> Option<CurrentEventInfo> {
        self.current.lock().clone()
    }
}

/// Polls [`WatchdogState`] on its own thread and logs a warning once an
/// event has been "in flight" longer than `timeout`.
pub struct Watchdog {
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn spawn(state: WatchdogState, timeout: Duration, poll_interval: Duration) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_for_thread = stop_flag.clone();
        let thread_handle = thread::spawn(move || {
            while !stop_for_thread.load(Ordering::Relaxed) {
                if let Some(info) = state.current() {
                    let elapsed = info.started_at.elapsed();
                    if elapsed > timeout {
                        tracing::warn!(
                            node = %info.node,
                            kind = ?info.kind,
                            sim_time = %info.sim_time,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "dispatcher event handling exceeded watchdog timeout"
                        );
                    }
                }
                thread::sleep(poll_interval);
            }
        });
        Watchdog { stop_flag, thread_handle: Some(thread_handle) }
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
