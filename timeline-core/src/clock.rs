//! Time sources and the timer queue.
//!
//! The session never sleeps. It asks a [`Clock`] what time it is and fires
//! whatever timers in the [`TimerQueue`] have come due. Tests drive a
//! [`ManualClock`] instead of waiting on real time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic time since the clock started.
    fn now(&self) -> Duration;

    /// Calendar time, used for save stamps and export dates.
    fn wall(&self) -> DateTime<Utc>;
}

/// Real time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    elapsed_ms: Arc<AtomicU64>,
    base: DateTime<Utc>,
}

impl ManualClock {
    /// Start at zero elapsed time, with `base` as the wall-clock origin.
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            base,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, elapsed: Duration) {
        self.elapsed_ms
            .store(elapsed.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }

    fn wall(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::milliseconds(self.elapsed_ms.load(Ordering::SeqCst) as i64)
    }
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<K> {
    id: TimerId,
    due: Duration,
    kind: K,
}

/// Pending timers ordered by due time, ties broken by scheduling order.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    timers: Vec<Timer<K>>,
    next_id: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `due`.
    pub fn schedule(&mut self, kind: K, due: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due, kind });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel every timer matching `predicate`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| !predicate(&t.kind));
        before - self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest due time, if anything is pending.
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.due).min()
    }

    pub fn pending(&self) -> impl Iterator<Item = &K> {
        self.timers.iter().map(|t| &t.kind)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, K)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id.0))
            .map(|(i, _)| i)?;
        let timer = self.timers.remove(index);
        Some((timer.due, timer.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shares_time() {
        let base = Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap();
        let clock = ManualClock::new(base);
        let other = clock.clone();
        clock.advance_ms(1500);
        assert_eq!(other.now(), Duration::from_millis(1500));
        assert_eq!(other.wall(), base + chrono::Duration::milliseconds(1500));
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule("late", Duration::from_millis(300));
        queue.schedule("early", Duration::from_millis(100));

        let now = Duration::from_millis(1000);
        assert_eq!(queue.pop_due(now).map(|(_, k)| k), Some("early"));
        assert_eq!(queue.pop_due(now).map(|(_, k)| k), Some("late"));
        assert!(queue.pop_due(now).is_none());
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        let due = Duration::from_millis(50);
        queue.schedule(1, due);
        queue.schedule(2, due);
        queue.schedule(3, due);

        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(due).map(|(_, k)| k)).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_not_due_yet() {
        let mut queue = TimerQueue::new();
        queue.schedule((), Duration::from_millis(800));
        assert!(queue.pop_due(Duration::from_millis(799)).is_none());
        assert_eq!(queue.next_due(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_cancel_where() {
        let mut queue = TimerQueue::new();
        queue.schedule("recap", Duration::ZERO);
        queue.schedule("reveal", Duration::ZERO);
        queue.schedule("recap", Duration::ZERO);

        assert_eq!(queue.cancel_where(|k| *k == "recap"), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel_by_id() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule("x", Duration::ZERO);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.is_empty());
    }
}
