//! Nestlog Session - session monitoring and tenancy isolation
//!
//! The authenticated shell's runtime: a 1-second session validity check
//! that redirects, corrects tenant drift, and forces logout; a
//! display-state refresh; the family-scoped selection store that prevents
//! cross-tenant data bleed; and the logout coordinator, the only path
//! that destroys a session.
//!
//! # Wiring
//!
//! ```no_run
//! use nestlog_auth::{ClientStore, LockoutTracker};
//! use nestlog_core::{AuthApi, Route};
//! use nestlog_session::{LogoutCoordinator, SessionMonitor, SessionScheduler};
//! use std::sync::Arc;
//! use tokio::sync::{Mutex, RwLock};
//!
//! async fn shell(api: Arc<dyn AuthApi>) {
//!     let store = ClientStore::new().await.unwrap();
//!     let monitor = Arc::new(SessionMonitor::new(api.clone(), store.clone()));
//!     let coordinator = Arc::new(LogoutCoordinator::new(api, store));
//!     let lockout = Arc::new(Mutex::new(LockoutTracker::new()));
//!     let route = Arc::new(RwLock::new(Route::parse("/acme/log-entry")));
//!
//!     let (scheduler, mut channels) =
//!         SessionScheduler::start(monitor, coordinator, lockout, route);
//!     while let Some(action) = channels.actions.recv().await {
//!         // apply redirects
//!     }
//!     scheduler.stop().await;
//! }
//! ```

pub mod family;
pub mod logout;
pub mod monitor;
pub mod scheduler;

#[cfg(test)]
mod testutil;

pub use family::FamilyScopeStore;
pub use logout::{LogoutCoordinator, TenantCleared};
pub use monitor::{DisplayState, LogoutReason, MonitorAction, SessionMonitor};
pub use scheduler::{SchedulerChannels, SessionScheduler, TICK_INTERVAL};
