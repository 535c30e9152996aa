//! Deadline scheduling for delayed simulation work
//!
//! Delayed actions (clearing a hit cue, removing a corpse) are stored with an
//! absolute deadline and polled from the fixed tick, instead of firing from
//! timer callbacks.

/// A list of items waiting for a simulation-clock deadline.
#[derive(Debug, Clone)]
pub struct Deadlines<T> {
    entries: Vec<(f64, T)>,
}

impl<T> Deadlines<T> {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedule `item` to become due at `deadline`.
    pub fn schedule(&mut self, deadline: f64, item: T) {
        self.entries.push((deadline, item));
    }

    /// Remove and return every item with `deadline <= now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].0 <= now {
                due.push(self.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, item)| item).collect()
    }

    /// Number of scheduled items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Deadlines<T> {
    fn default() -> Self {
        Self::new()
    }
}
