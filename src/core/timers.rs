use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Pending one-shot deadlines keyed by `K`.
///
/// The table never reads the clock itself: callers pass `now`, which keeps
/// debounce behaviour testable with synthetic instants. Scheduling a key that
/// is already pending replaces its deadline (trailing-edge debounce).
#[derive(Debug)]
pub struct Timers<K: Ord + Copy> {
    deadlines: BTreeMap<K, Instant>,
}

impl<K: Ord + Copy> Default for Timers<K> {
    fn default() -> Self {
        Self {
            deadlines: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: K, now: Instant, delay: Duration) {
        self.deadlines.insert(key, now + delay);
    }

    pub fn cancel(&mut self, key: K) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Removes and returns every key due at `now`, earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, K)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*at, *key))
            .collect();
        due.sort();

        for (_, key) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Removes every pending key regardless of its deadline, earliest first.
    pub fn drain(&mut self) -> Vec<K> {
        let mut all: Vec<(Instant, K)> = self
            .deadlines
            .iter()
            .map(|(key, at)| (*at, *key))
            .collect();
        all.sort();
        self.deadlines.clear();
        all.into_iter().map(|(_, key)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        A,
        B,
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reschedule_pushes_deadline_back() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(Key::A, t0, ms(1000));
        timers.schedule(Key::A, t0 + ms(500), ms(1000));

        assert!(timers.take_due(t0 + ms(1000)).is_empty());
        assert_eq!(timers.next_deadline(), Some(t0 + ms(1500)));
        assert_eq!(timers.take_due(t0 + ms(1500)), vec![Key::A]);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn take_due_orders_by_deadline() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(Key::A, t0, ms(300));
        timers.schedule(Key::B, t0, ms(100));

        assert_eq!(timers.next_deadline(), Some(t0 + ms(100)));
        assert_eq!(timers.take_due(t0 + ms(400)), vec![Key::B, Key::A]);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn cancel_and_drain() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(Key::A, t0, ms(100));
        assert!(timers.cancel(Key::A));
        assert!(!timers.cancel(Key::A));

        timers.schedule(Key::B, t0, ms(5000));
        timers.schedule(Key::A, t0, ms(9000));
        assert_eq!(timers.drain(), vec![Key::B, Key::A]);
        assert!(timers.take_due(t0 + ms(10_000)).is_empty());
    }
}
