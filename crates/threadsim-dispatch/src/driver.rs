//! Threaded wrapper around [`crate::core::Dispatcher`]: the `Go`/
//! `GoAtSpeed` done-channel contract, `PostAsync`, and cancellation
//! (SPEC_FULL §4.5, §5, §6). Grounded on `node_thread.rs`'s
//! `Coordinator` (owns the worker thread + typed channels) and the
//! `ctrlc`-driven shutdown already wired into this codebase's runner.

use crate::core::{Dispatcher, DispatcherState};
use crate::governor::{Speed, SpeedGovernor};
use crate::watchdog::{Watchdog, WatchdogState};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use threadsim_core::{NodeId, SimTime};
use threadsim_node::WatchLevel;
use threadsim_radio::RadioModelKind;

/// Outcome of a `Go`/`GoAtSpeed` call, delivered on its done channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoOutcome {
    pub reached: SimTime,
    pub interrupted: bool,
}

enum Command {
    Go { duration_us: u64, speed: Speed, done: Sender<GoOutcome> },
    SetSpeed(Speed),
    PostAsync(Box<dyn FnOnce(&mut Dispatcher) + Send>),
    Query(Box<dyn FnOnce(&Dispatcher) + Send>),
    Stop,
}

/// Owns the dispatcher thread and exposes the CLI-facing entry points
/// from SPEC_FULL §6 as channel sends.
pub struct DispatchDriver {
    commands: Sender<Command>,
    cancel: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    watchdog: Watchdog,
    speed_cell: Arc<Mutex<Speed>>,
}

impl DispatchDriver {
    pub fn spawn(mut dispatcher: Dispatcher) -> Self {
        let (tx, rx): (Sender<Command>, Receiver<Command>) = bounded(64);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_thread = cancel.clone();
        let watchdog_state = WatchdogState::new();
        let watchdog_state_for_thread = watchdog_state.clone();
        let watchdog = Watchdog::spawn(watchdog_state, Duration::from_secs(5), Duration::from_millis(200));
        let speed_cell = Arc::new(Mutex::new(Speed::Factor(1.0)));
        let speed_cell_for_thread = speed_cell.clone();

        let thread_handle = thread::spawn(move || {
            let watchdog_state = watchdog_state_for_thread;
            let speed_cell = speed_cell_for_thread;
            let mut governor = SpeedGovernor::new(Speed::Factor(1.0), dispatcher.cur_time());
            'outer: loop {
                let cmd = match rx.recv() {
                    Ok(cmd) => cmd,
                    Err(_) => break,
                };
                match cmd {
                    Command::Stop => break 'outer,
                    Command::SetSpeed(speed) => {
                        governor.set_speed(speed, dispatcher.cur_time());
                        *speed_cell.lock() = speed;
                    }
                    Command::PostAsync(f) => f(&mut dispatcher),
                    Command::Query(f) => f(&dispatcher),
                    Command::Go { duration_us, speed, done } => {
                        governor.set_speed(speed, dispatcher.cur_time());
                        *speed_cell.lock() = speed;
                        let target = dispatcher.cur_time().plus_delay(duration_us);
                        let mut interrupted = false;
                        loop {
                            if cancel_for_thread.load(Ordering::Relaxed) {
                                interrupted = true;
                                break;
                            }
                            let Some(next_ts) = dispatcher.peek_next_timestamp() else { break };
                            if next_ts > target {
                                break;
                            }
                            if let Some(sleep) = governor.sleep_until(next_ts) {
                                thread::sleep(sleep);
                            }
                            watchdog_state.begin(
                                threadsim_core::event::EventKind::AlarmFired,
                                threadsim_core::NodeId(0),
                                next_ts,
                            );
                            let stepped = dispatcher.step();
                            watchdog_state.end();
                            if stepped.is_none() {
                                break;
                            }
                        }
                        let reached = dispatcher.advance_to(target);
                        let _ = done.send(GoOutcome { reached, interrupted });
                        if interrupted {
                            break 'outer;
                        }
                    }
                }
            }
        });

        DispatchDriver { commands: tx, cancel, thread_handle: Some(thread_handle), watchdog, speed_cell }
    }

    /// Runs `f` against the dispatcher on its own thread and blocks for
    /// the result. Used for the read-only `Get*` entry points in §6.
    pub fn query<R: Send + 'static>(&self, f: impl FnOnce(&Dispatcher) -> R + Send + 'static) -> Option<R> {
        let (tx, rx) = bounded(1);
        self.commands
            .send(Command::Query(Box::new(move |d: &Dispatcher| {
                let _ = tx.send(f(d));
            })))
            .ok()?;
        rx.recv().ok()
    }

    /// `GetSpeed()` (SPEC_FULL §6). Reads the last speed set via `Go`/
    /// `GoAtSpeed`/`SetSpeed` without round-tripping through the
    /// dispatcher thread.
    pub fn get_speed(&self) -> Speed {
        *self.speed_cell.lock()
    }

    /// `GetRadioModel()` (SPEC_FULL §6).
    pub fn get_radio_model(&self) -> Option<RadioModelKind> {
        self.query(|d| d.radio_model())
    }

    /// `GetWatchingNodes()` (SPEC_FULL §6).
    pub fn get_watching_nodes(&self) -> Option<Vec<(NodeId, WatchLevel)>> {
        self.query(|d| d.watching_nodes())
    }

    /// `CurTime()` (SPEC_FULL §6).
    pub fn cur_time(&self) -> Option<SimTime> {
        self.query(|d| d.cur_time())
    }

    /// Installs a visualizer (SPEC_FULL §6 "Visualizer contract").
    pub fn set_visualizer(&self, visualizer: Box<dyn crate::visualizer::Visualizer>) -> bool {
        self.post_async(move |d| d.set_visualizer(visualizer))
    }

    pub fn go(&self, duration_us: u64) -> Receiver<GoOutcome> {
        self.go_at_speed(duration_us, Speed::Factor(1.0))
    }

    pub fn go_at_speed(&self, duration_us: u64, speed: Speed) -> Receiver<GoOutcome> {
        let (done_tx, done_rx) = bounded(1);
        let _ = self.commands.send(Command::Go { duration_us, speed, done: done_tx });
        done_rx
    }

    pub fn set_speed(&self, speed: Speed) {
        let _ = self.commands.send(Command::SetSpeed(speed));
    }

    /// Non-blocking accept; returns false once the driver is stopping.
    pub fn post_async(&self, f: impl FnOnce(&mut Dispatcher) + Send + 'static) -> bool {
        self.commands.send(Command::PostAsync(Box::new(f))).is_ok()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.commands.send(Command::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        // `self.watchdog`'s own `Drop` stops its thread when `self` is
        // dropped at the end of this function.
    }

    /// Installs a process-wide `ctrlc` handler that cancels this driver.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let cancel = self.cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
    }
}

impl Drop for DispatchDriver {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.commands.send(Command::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
