//! Recurring session validity check
//!
//! Runs on a 1-second cadence for the lifetime of the authenticated shell
//! and decides, from the persisted token, the idle timestamp, and the
//! cached policy values, whether the session may continue and where the
//! shell should be. Decisions come back as [`MonitorAction`] values; the
//! shell (or the scheduler) applies them, which keeps every tick
//! deterministic under test.

use nestlog_auth::store::{keys, ClientStore};
use nestlog_core::api::AccountUser;
use nestlog_core::{decode_token, AuthApi, Route, DEFAULT_LANDING_PATH};
use std::sync::Arc;
use tracing::{info, warn};

/// Why a session is being destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The token's absolute expiry passed
    TokenExpired,
    /// The sliding idle window elapsed
    IdleExpired,
    /// The user asked to log out
    UserRequested,
}

/// Outcome of one monitor tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// Session is valid for this route; nothing to do
    Stay,
    /// No usable token; go to the unauthenticated entry point
    RedirectLogin { path: String },
    /// The token belongs to another tenant; follow it there rather than
    /// denying access outright
    RedirectTenant { path: String },
    /// Tenant root resolves to the default landing sub-route
    RedirectLanding { path: String },
    /// Forced logout; the logout coordinator takes it from here
    Logout(LogoutReason),
}

/// Display-only derived state, refreshed on its own tick. Never used for
/// authorization; every privileged server call re-checks independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub unlocked: bool,
    pub name: Option<String>,
    pub is_admin: bool,
}

/// The recurring check behind the authenticated shell
pub struct SessionMonitor {
    api: Arc<dyn AuthApi>,
    store: ClientStore,
}

impl SessionMonitor {
    pub fn new(api: Arc<dyn AuthApi>, store: ClientStore) -> Self {
        Self { api, store }
    }

    /// One auth-check tick. Ordering matters: a missing token redirects, an
    /// expired token logs out, tenant drift is corrected before any
    /// route defaulting, and the idle window is judged last.
    pub async fn check(&self, route: &Route, now_ms: i64) -> MonitorAction {
        let snapshot = self.store.session_snapshot().await;

        let claims = match snapshot.token.as_deref().map(decode_token) {
            Some(Ok(claims)) => claims,
            Some(Err(e)) => {
                warn!("Undecodable token, treating as unauthenticated: {}", e);
                return MonitorAction::RedirectLogin {
                    path: route.login_path(),
                };
            }
            None => {
                return MonitorAction::RedirectLogin {
                    path: route.login_path(),
                }
            }
        };

        if claims.is_expired(now_ms) {
            info!("Token expired, forcing logout");
            return MonitorAction::Logout(LogoutReason::TokenExpired);
        }

        if let (Some(token_slug), Some(route_slug)) = (
            claims.family_slug.as_deref().filter(|s| !s.is_empty()),
            route.tenant_slug.as_deref(),
        ) {
            if token_slug != route_slug {
                info!(
                    "Tenant drift: token is for {}, URL shows {}",
                    token_slug, route_slug
                );
                return MonitorAction::RedirectTenant {
                    path: route.under_tenant(token_slug),
                };
            }
        }

        if route.is_tenant_root() {
            return MonitorAction::RedirectLanding {
                path: format!("{}/{}", route.path(), DEFAULT_LANDING_PATH),
            };
        }

        if snapshot.idle_expired(now_ms) {
            info!("Idle window elapsed, forcing logout");
            return MonitorAction::Logout(LogoutReason::IdleExpired);
        }

        MonitorAction::Stay
    }

    /// Recompute the display-only session state from the latest claims.
    /// Name resolution degrades silently: claims, then the cached account
    /// user, then a best-effort caretaker lookup.
    pub async fn display_state(&self, now_ms: i64) -> DisplayState {
        let snapshot = self.store.session_snapshot().await;
        let Some(claims) = snapshot.claims() else {
            return DisplayState::default();
        };

        let mut name = claims.name.clone();
        if name.is_none() {
            name = self
                .store
                .get_json::<AccountUser>(keys::ACCOUNT_USER)
                .await
                .map(|user| user.first_name);
        }
        if name.is_none() {
            if let Some(id) = self.store.get(keys::CARETAKER_ID).await {
                name = match self.api.caretaker_name(&id).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!("Caretaker lookup failed, showing no name: {}", e);
                        None
                    }
                };
            }
        }

        DisplayState {
            unlocked: snapshot.is_valid(now_ms),
            name,
            is_admin: claims.admin_hint(),
        }
    }

    /// Any user interaction (click, keypress, pointer move, touch) slides
    /// the idle window, but only when an unlock timestamp already exists.
    /// Account sessions without one are governed by token expiry alone.
    pub async fn record_activity(&self, now_ms: i64) {
        if self.store.get(keys::UNLOCK_TIME).await.is_some() {
            if let Err(e) = self.store.set(keys::UNLOCK_TIME, now_ms.to_string()).await {
                warn!("Failed to slide idle window: {}", e);
            }
        }
    }
}
