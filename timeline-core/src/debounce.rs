//! Trailing debounce for autosave.

use std::time::Duration;

/// Fires once input has been quiet for `quiet`. Each touch restarts the wait.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: Duration) {
        self.deadline = Some(now + self.quiet);
    }

    /// True exactly once per quiet period, when the deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending fire. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_quiet_period() {
        let mut debounce = Debouncer::new(ms(1000));
        debounce.touch(ms(0));
        assert!(!debounce.poll(ms(999)));
        assert!(debounce.poll(ms(1000)));
        assert!(!debounce.poll(ms(5000)));
    }

    #[test]
    fn test_touch_restarts_wait() {
        let mut debounce = Debouncer::new(ms(1000));
        debounce.touch(ms(0));
        debounce.touch(ms(600));
        assert!(!debounce.poll(ms(1000)));
        assert!(debounce.poll(ms(1600)));
    }

    #[test]
    fn test_cancel() {
        let mut debounce = Debouncer::new(ms(1000));
        assert!(!debounce.cancel());
        debounce.touch(ms(0));
        assert!(debounce.cancel());
        assert!(!debounce.poll(ms(2000)));
    }
}
