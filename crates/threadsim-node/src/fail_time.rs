//! Per-node failure-injection schedule (SPEC_FULL §4.4, §8 "Failure window
//! boundary").

use crate::error::{NodeError, NodeResult};
use serde::{Deserialize, Serialize};

/// `(0, 0)` disables the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailTime {
    pub duration_us: u64,
    pub interval_us: u64,
}

impl FailTime {
    pub const DISABLED: FailTime = FailTime { duration_us: 0, interval_us: 0 };

    pub fn new(duration_us: u64, interval_us: u64) -> NodeResult<Self> {
        if duration_us == 0 && interval_us == 0 {
            return Ok(FailTime::DISABLED);
        }
        if duration_us >= interval_us {
            return Err(NodeError::InvalidFailSchedule { duration_us, interval_us });
        }
        Ok(FailTime { duration_us, interval_us })
    }

    pub fn is_disabled(&self) -> bool {
        self.duration_us == 0
    }

    /// Whether virtual time `t_us` falls inside a failure window, i.e.
    /// `[k*interval, k*interval + duration)` for some integer k.
    pub fn is_failing_at(&self, t_us: u64) -> bool {
        if self.is_disabled() {
            return false;
        }
        (t_us % self.interval_us) < self.duration_us
    }
}

impl Default for FailTime {
    fn default() -> Self {
        FailTime::DISABLED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_schedule_never_fails() {
        assert!(!FailTime::DISABLED.is_failing_at(0));
        assert!(!FailTime::DISABLED.is_failing_at(1_000_000));
    }

    #[test]
    fn rejects_duration_not_less_than_interval() {
        assert!(FailTime::new(60, 60).is_err());
        assert!(FailTime::new(61, 60).is_err());
        assert!(FailTime::new(10, 60).is_ok());
    }

    #[test]
    fn window_boundary_matches_spec_example() {
        let ft = FailTime::new(10_000_000, 60_000_000).unwrap();
        assert!(ft.is_failing_at(0));
        assert!(ft.is_failing_at(9_999_999));
        assert!(!ft.is_failing_at(10_000_000));
        assert!(!ft.is_failing_at(59_999_999));
        assert!(ft.is_failing_at(60_000_000));
        assert!(ft.is_failing_at(69_999_999));
        assert!(!ft.is_failing_at(70_000_000));
    }
}
