//! Discrete-event queue keyed by absolute half-cycle time.

use std::collections::BTreeMap;

/// A callback scheduled by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Event {
    /// Absolute half-cycle time the callback becomes due.
    pub due: u64,
    /// 6-bit address of the device whose handler runs.
    pub device: u8,
    /// Device-defined reason code passed back to the handler.
    pub reason: i32,
}

/// Ordered set of pending device callbacks.
///
/// Events fire in due-time order; events sharing a due time fire in the
/// order they were scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    pending: BTreeMap<(u64, u64), Event>,
    next_sequence: u64,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `device`'s handler at absolute time `due` with `reason`.
    pub fn schedule(&mut self, due: u64, device: u8, reason: i32) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.insert((due, sequence), Event { due, device, reason });
    }

    /// Removes and returns the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<Event> {
        let (&key, _) = self.pending.first_key_value()?;
        if key.0 > now {
            return None;
        }
        self.pending.remove(&key)
    }

    /// Removes and returns the earliest event regardless of time.
    pub fn pop_next(&mut self) -> Option<Event> {
        self.pending.pop_first().map(|(_, event)| event)
    }

    /// Removes every event due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: u64) -> Vec<Event> {
        let later = self.pending.split_off(&(now.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.pending, later);
        let mut events: Vec<Event> = due.into_values().collect();
        if now == u64::MAX {
            events.extend(std::mem::take(&mut self.pending).into_values());
        }
        events
    }

    /// Drops every pending event.
    pub fn discard_all(&mut self) {
        self.pending.clear();
    }

    /// Due time of the earliest pending event.
    #[must_use]
    pub fn peek_next_time(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Due time of the latest pending event.
    #[must_use]
    pub fn peek_last_time(&self) -> Option<u64> {
        self.pending.keys().next_back().map(|(due, _)| *due)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
