//! Logout coordination
//!
//! The only path that destroys a session. The server call is best-effort;
//! local state is cleared no matter what, and dependent state (selected
//! baby, sleeping set) is reset through a tenant-change notification
//! rather than a full page reload.

use crate::monitor::LogoutReason;
use nestlog_auth::store::{keys, ClientStore};
use nestlog_core::{decode_token, AuthApi, Family};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Keys unconditionally cleared by every logout
const CLEARED_KEYS: &[&str] = &[
    keys::AUTH_TOKEN,
    keys::UNLOCK_TIME,
    keys::CARETAKER_ID,
    keys::ACCOUNT_USER,
    keys::ATTEMPTS,
    keys::LOCKOUT_TIME,
    keys::IDLE_TIME_SECONDS,
    keys::AUTH_LIFE_SECONDS,
    keys::SELECTED_FAMILY,
];

/// Notification that the active tenant context is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantCleared;

/// Clears all session state and routes to the correct unauthenticated
/// entry point.
pub struct LogoutCoordinator {
    api: Arc<dyn AuthApi>,
    store: ClientStore,
    tenant_tx: broadcast::Sender<TenantCleared>,
}

impl LogoutCoordinator {
    pub fn new(api: Arc<dyn AuthApi>, store: ClientStore) -> Self {
        let (tenant_tx, _) = broadcast::channel(4);
        Self {
            api,
            store,
            tenant_tx,
        }
    }

    /// Subscribe to tenant-change notifications so dependent state can
    /// reset without a reload
    pub fn subscribe(&self) -> broadcast::Receiver<TenantCleared> {
        self.tenant_tx.subscribe()
    }

    /// Destroy the session. Returns the route to land on afterwards: the
    /// application root for account-authenticated sessions, the tenant's
    /// login page for PIN sessions, the generic login page when no tenant
    /// is resolvable.
    pub async fn logout(&self, reason: LogoutReason) -> String {
        // Read what routing needs before anything is cleared
        let token = self.store.get(keys::AUTH_TOKEN).await;
        let claims = token.as_deref().and_then(|t| decode_token(t).ok());
        let account_auth = match &claims {
            Some(claims) => claims.account_auth(),
            None => self.store.get(keys::ACCOUNT_USER).await.is_some(),
        };
        let slug = claims
            .as_ref()
            .and_then(|c| c.family_slug.clone())
            .or(self
                .store
                .get_json::<Family>(keys::SELECTED_FAMILY)
                .await
                .map(|f| f.slug));

        // Best-effort server notification; a slow or failed call never
        // blocks local clearing
        if let Some(token) = token {
            if let Err(e) = self.api.logout(&token).await {
                warn!("Logout endpoint unreachable, clearing locally: {}", e);
            }
        }

        for key in CLEARED_KEYS {
            if let Err(e) = self.store.remove(key).await {
                warn!("Failed to clear {}: {}", key, e);
            }
        }

        if self.tenant_tx.send(TenantCleared).is_err() {
            debug!("No subscribers for tenant-change notification");
        }

        info!("Session destroyed ({:?})", reason);

        match (account_auth, slug) {
            (true, _) => "/".to_string(),
            (false, Some(slug)) => format!("/{slug}/login"),
            (false, None) => "/login".to_string(),
        }
    }
}
