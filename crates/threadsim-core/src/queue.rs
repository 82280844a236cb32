//! The dispatcher's event queue: a deterministic min-heap over
//! (timestamp, msg-id, node-id), per SPEC_FULL §3 and §4.2.

use crate::event::Event;
use crate::time::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Wraps an [`Event`] with the reversed ordering `BinaryHeap` needs to
/// behave as a min-heap on (timestamp, msg_id, node).
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedEvent(Event);

impl QueuedEvent {
    fn sort_key(&self) -> (SimTime, u64, i32) {
        (self.0.timestamp, self.0.msg_id.0, self.0.node.0)
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the smallest key pops first.
        other.sort_key().cmp(&self.sort_key())
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered multiset of pending events. The dispatcher is the sole owner;
/// no internal synchronization is provided (SPEC_FULL §4.2, §5).
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, event: Event) {
        self.heap.push(QueuedEvent(event));
    }

    pub fn peek_min(&self) -> Option<&Event> {
        self.heap.peek().map(|q| &q.0)
    }

    pub fn pop_min(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.0)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Removes every event matching `predicate`, used on node deletion or
    /// disconnect (SPEC_FULL §4.2, "PurgeIf"). O(n), by design.
    pub fn purge_if<F: Fn(&Event) -> bool>(&mut self, predicate: F) {
        let remaining: Vec<Event> = self
            .heap
            .drain()
            .map(|q| q.0)
            .filter(|e| !predicate(e))
            .collect();
        for e in remaining {
            self.heap.push(QueuedEvent(e));
        }
    }

    /// Pops every event whose timestamp equals the queue minimum, in
    /// (msg_id, node) order, as one dispatch batch (SPEC_FULL §4.5 step 2).
    pub fn pop_batch_at_min(&mut self) -> Vec<Event> {
        let Some(min_ts) = self.peek_min().map(|e| e.timestamp) else {
            return Vec::new();
        };
        let mut batch = Vec::new();
        while let Some(e) = self.peek_min() {
            if e.timestamp != min_ts {
                break;
            }
            batch.push(self.pop_min().expect("peeked event must pop"));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::time::{MsgId, NodeId};

    fn ev(ts: u64, msg: u64, node: i32) -> Event {
        let mut e = Event::new(EventKind::AlarmFired, NodeId(node), MsgId(msg), 0);
        e.timestamp = SimTime(ts);
        e
    }

    #[test]
    fn orders_by_timestamp_then_msgid_then_node() {
        let mut q = EventQueue::new();
        q.push(ev(10, 5, 1));
        q.push(ev(5, 9, 2));
        q.push(ev(5, 1, 3));
        q.push(ev(5, 1, 1));

        let first = q.pop_min().unwrap();
        assert_eq!((first.timestamp.0, first.msg_id.0, first.node.0), (5, 1, 1));
        let second = q.pop_min().unwrap();
        assert_eq!((second.timestamp.0, second.msg_id.0, second.node.0), (5, 1, 3));
        let third = q.pop_min().unwrap();
        assert_eq!((third.timestamp.0, third.msg_id.0, third.node.0), (5, 9, 2));
        let fourth = q.pop_min().unwrap();
        assert_eq!(fourth.timestamp.0, 10);
    }

    #[test]
    fn pop_batch_groups_equal_timestamps() {
        let mut q = EventQueue::new();
        q.push(ev(5, 1, 1));
        q.push(ev(5, 2, 1));
        q.push(ev(7, 0, 1));

        let batch = q.pop_batch_at_min();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|e| e.timestamp.0 == 5));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn purge_if_removes_matching_node() {
        let mut q = EventQueue::new();
        q.push(ev(1, 0, 1));
        q.push(ev(2, 0, 2));
        q.push(ev(3, 0, 1));

        q.purge_if(|e| e.node.0 == 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_min().unwrap().node.0, 2);
    }

    #[test]
    fn empty_queue_has_no_min() {
        let q = EventQueue::new();
        assert!(q.is_empty());
        assert!(q.peek_min().is_none());
    }
}
