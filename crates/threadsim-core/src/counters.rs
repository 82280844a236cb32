//! Process-wide monotonic counters, owned exclusively by the dispatcher
//! (SPEC_FULL §3, §9 "Struct-reflection for counters is replaced by an
//! explicit enum of counter names").

use serde::{Deserialize, Serialize};

/// Declared counter names, in snapshot export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CounterName {
    AlarmEvents,
    RadioEvents,
    StatusPushEvents,
    UartWriteEvents,
    CollisionEvents,
    DispatchAllInRange,
}

impl CounterName {
    pub const ALL: &'static [CounterName] = &[
        CounterName::AlarmEvents,
        CounterName::RadioEvents,
        CounterName::StatusPushEvents,
        CounterName::UartWriteEvents,
        CounterName::CollisionEvents,
        CounterName::DispatchAllInRange,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CounterName::AlarmEvents => "alarm-events",
            CounterName::RadioEvents => "radio-events",
            CounterName::StatusPushEvents => "status-push-events",
            CounterName::UartWriteEvents => "uart-write-events",
            CounterName::CollisionEvents => "collision-events",
            CounterName::DispatchAllInRange => "dispatch-all-in-range",
        }
    }

    const fn index(self) -> usize {
        // Kept in lockstep with `ALL`; a debug_assert in `Counters::new`
        // catches drift if a variant is added without updating both.
        self as usize
    }
}

/// Fixed-layout counter bank. Written only by the dispatcher; reads are
/// copy-out snapshots (SPEC_FULL §5).
#[derive(Debug, Clone)]
pub struct Counters {
    values: [u64; CounterName::ALL.len()],
}

impl Default for Counters {
    fn default() -> Self {
        Counters::new()
    }
}

impl Counters {
    pub fn new() -> Self {
        for (i, name) in CounterName::ALL.iter().enumerate() {
            debug_assert_eq!(name.index(), i, "CounterName::ALL order must match discriminants");
        }
        Counters { values: [0; CounterName::ALL.len()] }
    }

    pub fn increment(&mut self, name: CounterName) {
        self.values[name.index()] += 1;
    }

    pub fn add(&mut self, name: CounterName, n: u64) {
        self.values[name.index()] += n;
    }

    pub fn get(&self, name: CounterName) -> u64 {
        self.values[name.index()]
    }

    /// Snapshot export in the declared `CounterName::ALL` order.
    pub fn snapshot(&self) -> Vec<(CounterName, u64)> {
        CounterName::ALL.iter().map(|&n| (n, self.get(n))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_snapshots_in_declared_order() {
        let mut c = Counters::new();
        c.increment(CounterName::RadioEvents);
        c.add(CounterName::RadioEvents, 5);
        c.increment(CounterName::CollisionEvents);

        assert_eq!(c.get(CounterName::RadioEvents), 6);
        let snap = c.snapshot();
        assert_eq!(snap[0].0, CounterName::AlarmEvents);
        assert_eq!(snap[1].0, CounterName::RadioEvents);
        assert_eq!(snap[1].1, 6);
        assert_eq!(snap.len(), CounterName::ALL.len());
    }
}
