//! Session snapshot and the validity law
//!
//! A session is never stored as one object. It is reconstructed each tick
//! from the persisted token, the last-unlock timestamp, and the cached
//! server policy values, then judged by [`SessionSnapshot::is_valid`]. All
//! functions here take `now_ms` explicitly so recurring checks are
//! deterministic under test; no wall-clock reads in the core.

use crate::claims::{decode_token, Claims};

/// Idle window applied when the server policy has not been fetched yet
pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 1800;

/// Absolute session lifetime applied when the server policy is missing
pub const DEFAULT_AUTH_LIFE_SECS: i64 = 86400;

/// Point-in-time reconstruction of the client session state
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Raw bearer token, if any
    pub token: Option<String>,
    /// Epoch-millis marker of the last successful unlock; absent for
    /// account-authenticated sessions that do not re-enter a PIN
    pub unlock_time_ms: Option<i64>,
    /// Sliding idle window, seconds (server policy, cached client-side)
    pub idle_timeout_secs: i64,
    /// Absolute token lifetime, seconds (server policy, cached client-side)
    pub auth_life_secs: i64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            token: None,
            unlock_time_ms: None,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            auth_life_secs: DEFAULT_AUTH_LIFE_SECS,
        }
    }
}

impl SessionSnapshot {
    /// Decoded claims, or None when the token is absent or malformed.
    /// Decode failure is "unauthenticated", never an error to the caller.
    pub fn claims(&self) -> Option<Claims> {
        self.token.as_deref().and_then(|t| decode_token(t).ok())
    }

    /// The session validity invariant:
    ///
    /// a token exists AND (the session is account-authenticated OR an
    /// unlock timestamp exists) AND the token expiry is in the future AND
    /// (when an unlock timestamp exists) the idle window has not elapsed.
    ///
    /// Absolute expiry dominates: an expired token is invalid no matter
    /// how recent the last interaction was.
    pub fn is_valid(&self, now_ms: i64) -> bool {
        let Some(claims) = self.claims() else {
            return false;
        };
        if !claims.account_auth() && self.unlock_time_ms.is_none() {
            return false;
        }
        if claims.is_expired(now_ms) {
            return false;
        }
        if let Some(unlock_ms) = self.unlock_time_ms {
            if now_ms - unlock_ms > self.idle_timeout_secs * 1000 {
                return false;
            }
        }
        true
    }

    /// Whether the sliding idle window has elapsed
    pub fn idle_expired(&self, now_ms: i64) -> bool {
        match self.unlock_time_ms {
            Some(unlock_ms) => now_ms - unlock_ms > self.idle_timeout_secs * 1000,
            None => false,
        }
    }

    /// Slide the idle window to `now_ms`. Only applies when an unlock
    /// timestamp already exists; touching twice in one tick is idempotent.
    pub fn touch(&mut self, now_ms: i64) {
        if self.unlock_time_ms.is_some() {
            self.unlock_time_ms = Some(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(payload: serde_json::Value) -> String {
        crate::claims::encode_token(&payload)
    }

    fn pin_session(exp_secs: i64, unlock_ms: i64) -> SessionSnapshot {
        SessionSnapshot {
            token: Some(token(json!({"subjectId": "ct_1", "exp": exp_secs}))),
            unlock_time_ms: Some(unlock_ms),
            idle_timeout_secs: 600,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_token_is_invalid() {
        let session = SessionSnapshot::default();
        assert!(!session.is_valid(0));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let session = SessionSnapshot {
            token: Some("garbage".to_string()),
            unlock_time_ms: Some(0),
            ..Default::default()
        };
        assert!(!session.is_valid(0));
    }

    #[test]
    fn test_expiry_dominates_idle_window() {
        // Fresh interaction, but the token expired one tick ago
        let now_ms = 1_000_000 * 1000;
        let session = pin_session(1_000_000, now_ms);
        assert!(!session.is_valid(now_ms));
        assert!(session.is_valid(now_ms - 1));
    }

    #[test]
    fn test_pin_session_requires_unlock_timestamp() {
        let session = SessionSnapshot {
            token: Some(token(json!({"subjectId": "ct_1", "exp": 2_000_000_000}))),
            unlock_time_ms: None,
            ..Default::default()
        };
        assert!(!session.is_valid(0));
    }

    #[test]
    fn test_account_session_needs_no_unlock_timestamp() {
        let session = SessionSnapshot {
            token: Some(token(json!({
                "subjectId": "acct_1",
                "isAccountAuth": true,
                "exp": 2_000_000_000,
            }))),
            unlock_time_ms: None,
            ..Default::default()
        };
        assert!(session.is_valid(0));
    }

    #[test]
    fn test_idle_window_boundary() {
        let session = pin_session(2_000_000_000, 0);
        let window_ms = 600 * 1000;
        // Valid exactly at the boundary, invalid one millisecond past it
        assert!(session.is_valid(window_ms));
        assert!(!session.is_valid(window_ms + 1));
    }

    #[test]
    fn test_touch_slides_window_idempotently() {
        let mut session = pin_session(2_000_000_000, 0);
        let window_ms = 600 * 1000;

        session.touch(window_ms - 1);
        assert!(session.is_valid(2 * window_ms - 2));

        // Refreshing twice in the same tick is equivalent to once
        let copy = {
            let mut s = session.clone();
            s.touch(window_ms - 1);
            s
        };
        assert_eq!(copy.unlock_time_ms, session.unlock_time_ms);
    }

    #[test]
    fn test_touch_without_unlock_timestamp_is_noop() {
        let mut session = SessionSnapshot::default();
        session.touch(123);
        assert_eq!(session.unlock_time_ms, None);
    }
}
