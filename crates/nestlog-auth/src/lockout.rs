//! Brute-force lockout countdown
//!
//! Tracks the IP-scoped lockout the server reports and renders the
//! remaining time while input is disabled. The client view is purely
//! advisory: the server re-checks every authentication attempt, and the
//! tracker self-clears at the expiry instant to re-enable the form.

use nestlog_core::LockoutStatus;

/// An observed lockout, pinned to an absolute expiry instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutState {
    pub locked: bool,
    /// Epoch millis at which the lockout ends
    pub unlock_at_ms: i64,
}

impl LockoutState {
    /// Pin a server-reported remaining duration to the local clock
    pub fn from_status(status: LockoutStatus, now_ms: i64) -> Self {
        Self {
            locked: status.locked,
            unlock_at_ms: now_ms + status.remaining_time.max(0),
        }
    }

    /// Milliseconds left, clamped at zero
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.unlock_at_ms - now_ms).max(0)
    }

    /// Whether the lockout has run out
    pub fn is_expired(&self, now_ms: i64) -> bool {
        !self.locked || self.remaining_ms(now_ms) == 0
    }
}

/// Render a remaining duration as `M:SS`, rounding up to the next whole
/// second so the countdown never shows 0:00 while still locked.
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_secs = (remaining_ms.max(0) + 999) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// What the login form shows on each countdown tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockoutView {
    pub locked: bool,
    /// `M:SS` countdown while locked
    pub countdown: Option<String>,
}

/// Countdown state machine driven on a 1-second cadence
#[derive(Debug, Default)]
pub struct LockoutTracker {
    state: Option<LockoutState>,
}

impl LockoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lockout status fresh from the server
    pub fn observe(&mut self, status: LockoutStatus, now_ms: i64) {
        if status.locked {
            self.state = Some(LockoutState::from_status(status, now_ms));
        } else {
            self.state = None;
        }
    }

    /// Record an already-pinned lockout (e.g. from a failed login)
    pub fn observe_state(&mut self, state: LockoutState) {
        self.state = state.locked.then_some(state);
    }

    /// Advance the countdown. Clears itself at the expiry instant, at
    /// which point the form re-enables.
    pub fn tick(&mut self, now_ms: i64) -> LockoutView {
        match self.state {
            Some(state) if !state.is_expired(now_ms) => LockoutView {
                locked: true,
                countdown: Some(format_remaining(state.remaining_ms(now_ms))),
            },
            Some(_) => {
                self.state = None;
                LockoutView::default()
            }
            None => LockoutView::default(),
        }
    }

    /// Whether credential input should currently be accepted
    pub fn is_input_enabled(&self, now_ms: i64) -> bool {
        match self.state {
            Some(state) => state.is_expired(now_ms),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked_status(remaining_ms: i64) -> LockoutStatus {
        LockoutStatus {
            locked: true,
            remaining_time: remaining_ms,
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(125_000), "2:05");
        assert_eq!(format_remaining(60_000), "1:00");
        assert_eq!(format_remaining(999), "0:01");
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(-5), "0:00");
    }

    #[test]
    fn test_countdown_ticks_and_self_clears() {
        let mut tracker = LockoutTracker::new();
        tracker.observe(locked_status(125_000), 0);

        let view = tracker.tick(0);
        assert!(view.locked);
        assert_eq!(view.countdown.as_deref(), Some("2:05"));
        assert!(!tracker.is_input_enabled(0));

        let view = tracker.tick(124_000);
        assert_eq!(view.countdown.as_deref(), Some("0:01"));

        // At expiry the lockout clears and the form re-enables
        let view = tracker.tick(125_000);
        assert_eq!(view, LockoutView::default());
        assert!(tracker.is_input_enabled(125_000));

        // Stays cleared on subsequent ticks
        assert_eq!(tracker.tick(126_000), LockoutView::default());
    }

    #[test]
    fn test_observe_pinned_state_from_failed_login() {
        let mut tracker = LockoutTracker::new();
        let state = LockoutState::from_status(locked_status(30_000), 5_000);
        tracker.observe_state(state);

        let view = tracker.tick(5_000);
        assert_eq!(view.countdown.as_deref(), Some("0:30"));
        assert!(tracker.tick(35_000).countdown.is_none());
    }

    #[test]
    fn test_unlocked_status_clears() {
        let mut tracker = LockoutTracker::new();
        tracker.observe(locked_status(10_000), 0);
        tracker.observe(
            LockoutStatus {
                locked: false,
                remaining_time: 0,
            },
            1_000,
        );
        assert!(tracker.is_input_enabled(1_000));
    }
}
