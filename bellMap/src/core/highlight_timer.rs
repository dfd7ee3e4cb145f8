use std::time::{Duration, Instant};

use crate::config::constants::HIGHLIGHT_DISMISS_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingDismiss {
    token: u64,
    bell_id: usize,
    deadline: Instant,
}

/// Auto-dismiss for the highlighted nearest-bell popup.
///
/// Each `arm` gets a fresh token and replaces whatever was pending, so a
/// dismissal scheduled for an older highlight can never close a newer one.
/// Time is passed in by the caller; nothing here sleeps or spawns.
#[derive(Debug, Clone)]
pub struct HighlightTimer {
    delay: Duration,
    next_token: u64,
    pending: Option<PendingDismiss>,
}

impl Default for HighlightTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(HIGHLIGHT_DISMISS_SECS))
    }
}

impl HighlightTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_token: 0,
            pending: None,
        }
    }

    /// Schedule dismissal of `bell_id`, cancelling any earlier schedule.
    pub fn arm(&mut self, now: Instant, bell_id: usize) -> u64 {
        self.next_token += 1;
        self.pending = Some(PendingDismiss {
            token: self.next_token,
            bell_id,
            deadline: now + self.delay,
        });
        self.next_token
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the bell to dismiss once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let due = self.pending.filter(|p| now >= p.deadline)?;
        self.fire(due.token)
    }

    /// A token that has been superseded or cancelled does nothing.
    fn fire(&mut self, token: u64) -> Option<usize> {
        match self.pending {
            Some(p) if p.token == token => {
                self.pending = None;
                Some(p.bell_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismisses_after_delay() {
        let start = Instant::now();
        let mut timer = HighlightTimer::new(Duration::from_secs(10));
        timer.arm(start, 7);
        assert_eq!(timer.poll(start + Duration::from_secs(9)), None);
        assert_eq!(timer.poll(start + Duration::from_secs(10)), Some(7));
        assert!(!timer.is_armed());
        assert_eq!(timer.poll(start + Duration::from_secs(11)), None);
    }

    #[test]
    fn stale_token_does_not_dismiss_newer_highlight() {
        let start = Instant::now();
        let mut timer = HighlightTimer::default();
        let first = timer.arm(start, 1);
        let second = timer.arm(start + Duration::from_secs(5), 2);
        assert_eq!(timer.fire(first), None);
        assert!(timer.is_armed());
        assert_eq!(timer.fire(second), Some(2));
        timer.arm(start + Duration::from_secs(5), 2);
        assert_eq!(timer.poll(start + Duration::from_secs(10)), None);
        assert_eq!(timer.poll(start + Duration::from_secs(15)), Some(2));
    }

    #[test]
    fn cancel_invalidates_pending() {
        let start = Instant::now();
        let mut timer = HighlightTimer::default();
        let token = timer.arm(start, 3);
        timer.cancel();
        assert_eq!(timer.fire(token), None);
        assert_eq!(timer.poll(start + Duration::from_secs(60)), None);
    }
}
