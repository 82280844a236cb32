//! The speed governor (SPEC_FULL §4.5): wall-clock/virtual-time anchor
//! pair, re-anchored on every speed change. Grounded on
//! `realtime.rs`'s `RealTimePacer` (`start_wall`/`start_sim` anchors,
//! `target_sim_time`, `sleep_until_event`), generalized from a fixed
//! speed multiplier to the three-state `Speed` the spec requires
//! (paused, a finite multiplier, and the uncapped `MaxSimulateSpeed`).

use std::time::{Duration, Instant};
use threadsim_core::SimTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    /// A positive multiplier; 1.0 is real-time.
    Factor(f64),
    /// `MaxSimulateSpeed`: bypasses the sleep entirely.
    Max,
}

impl Speed {
    pub fn factor(self) -> Option<f64> {
        match self {
            Speed::Factor(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct SpeedGovernor {
    speed: Speed,
    wall_anchor: Instant,
    virt_anchor: SimTime,
}

impl SpeedGovernor {
    pub fn new(speed: Speed, virt_anchor: SimTime) -> Self {
        SpeedGovernor { speed, wall_anchor: Instant::now(), virt_anchor }
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Re-anchors at the given virtual time, to avoid a jump in pacing
    /// when the speed changes mid-run.
    pub fn set_speed(&mut self, speed: Speed, current_virt: SimTime) {
        self.wall_anchor = Instant::now();
        self.virt_anchor = current_virt;
        self.speed = speed;
    }

    /// How long to sleep before `target_virt` should be processed, or
    /// `None` to proceed immediately (`Speed::Max` bypasses pacing
    /// entirely).
    pub fn sleep_until(&self, target_virt: SimTime) -> Option<Duration> {
        let factor = match self.speed {
            Speed::Max => return None,
            Speed::Factor(f) => f,
        };
        if target_virt <= self.virt_anchor {
            return None;
        }
        let delta_virt_us = target_virt.as_micros() - self.virt_anchor.as_micros();
        let wall_offset = Duration::from_micros((delta_virt_us as f64 / factor) as u64);
        let target_wall = self.wall_anchor + wall_offset;
        let now = Instant::now();
        if target_wall > now {
            Some(target_wall - now)
        } else {
            None
        }
    }
}
