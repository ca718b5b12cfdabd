//! Hidden admin-unlock gesture
//!
//! The disabled submit button still counts clicks. Ten clicks inside a
//! rolling 5-second window switch the login form into the admin-password
//! sub-mode, bypassing the PIN flow. The short window keeps the gesture
//! out of reach of accidental repeated taps while staying discoverable by
//! an operator who knows it.

use tracing::debug;

/// Clicks required inside the window to unlock admin mode
pub const UNLOCK_CLICK_COUNT: u32 = 10;

/// The reset timer each click restarts, in milliseconds
pub const RESET_WINDOW_MS: i64 = 5000;

/// Click-counting state machine for the admin escape hatch
#[derive(Debug, Default)]
pub struct AdminGestureDetector {
    clicks: u32,
    last_click_ms: Option<i64>,
}

impl AdminGestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one click. Returns true exactly when the click completes
    /// the gesture; the counter restarts from this click whenever more
    /// than the reset window has passed since the previous one.
    pub fn click(&mut self, now_ms: i64) -> bool {
        match self.last_click_ms {
            Some(last) if now_ms - last <= RESET_WINDOW_MS => self.clicks += 1,
            _ => self.clicks = 1,
        }
        self.last_click_ms = Some(now_ms);

        if self.clicks >= UNLOCK_CLICK_COUNT {
            debug!("Admin unlock gesture completed");
            self.reset();
            true
        } else {
            false
        }
    }

    /// Clear all gesture progress (called when leaving admin mode)
    pub fn reset(&mut self) {
        self.clicks = 0;
        self.last_click_ms = None;
    }

    /// Current in-window click count
    pub fn click_count(&self) -> u32 {
        self.clicks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_clicks_do_not_unlock() {
        let mut detector = AdminGestureDetector::new();
        for i in 0..9 {
            assert!(!detector.click(i * 100));
        }
        assert_eq!(detector.click_count(), 9);
    }

    #[test]
    fn test_tenth_click_in_window_unlocks() {
        let mut detector = AdminGestureDetector::new();
        for i in 0..9 {
            assert!(!detector.click(i * 100));
        }
        assert!(detector.click(900));
        // Completing the gesture consumes the progress
        assert_eq!(detector.click_count(), 0);
    }

    #[test]
    fn test_slow_clicks_never_unlock() {
        let mut detector = AdminGestureDetector::new();
        // Each gap exceeds the reset window, so the count restarts at 1
        for i in 0..20 {
            assert!(!detector.click(i * (RESET_WINDOW_MS + 1)));
            assert_eq!(detector.click_count(), 1);
        }
    }

    #[test]
    fn test_window_is_rolling_not_fixed() {
        let mut detector = AdminGestureDetector::new();
        // 4.9s between clicks keeps the gesture alive indefinitely even
        // though the total span far exceeds one window
        for i in 0..9 {
            assert!(!detector.click(i * 4900));
        }
        assert!(detector.click(9 * 4900));
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut detector = AdminGestureDetector::new();
        for i in 0..5 {
            detector.click(i);
        }
        detector.reset();
        assert_eq!(detector.click_count(), 0);
        assert!(!detector.click(10));
        assert_eq!(detector.click_count(), 1);
    }
}
