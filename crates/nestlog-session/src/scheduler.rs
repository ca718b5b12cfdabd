//! The owning scheduler for the three recurring timers
//!
//! One place starts and stops the auth check, the display-state refresh,
//! and the lockout countdown, each on its own 1-second interval. The tick
//! bodies are the pure `check`/`display_state`/`tick` functions, so unit
//! tests drive those directly with a synthetic clock; the scheduler itself
//! only wires wall-clock time to them. The 1-second cadence is the
//! staleness bound on how quickly an externally triggered logout becomes
//! visible.

use crate::logout::LogoutCoordinator;
use crate::monitor::{DisplayState, MonitorAction, SessionMonitor};
use nestlog_auth::lockout::{LockoutTracker, LockoutView};
use nestlog_core::Route;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Cadence shared by all three timers
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Receiving ends the shell consumes
pub struct SchedulerChannels {
    /// Redirect/landing actions; logout is already coordinated by the
    /// time the resulting redirect arrives here
    pub actions: mpsc::Receiver<MonitorAction>,
    pub display: watch::Receiver<DisplayState>,
    pub lockout: watch::Receiver<LockoutView>,
}

/// Owns the recurring timers for the authenticated shell
pub struct SessionScheduler {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionScheduler {
    /// Start all three timers. The current route is shared with the shell
    /// through the `RwLock` so navigation is picked up on the next tick.
    pub fn start(
        monitor: Arc<SessionMonitor>,
        coordinator: Arc<LogoutCoordinator>,
        lockout: Arc<Mutex<LockoutTracker>>,
        route: Arc<RwLock<Route>>,
    ) -> (Self, SchedulerChannels) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (action_tx, action_rx) = mpsc::channel(16);
        let (display_tx, display_rx) = watch::channel(DisplayState::default());
        let (lockout_tx, lockout_rx) = watch::channel(LockoutView::default());

        let auth_task = {
            let monitor = monitor.clone();
            let route = route.clone();
            let mut shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(TICK_INTERVAL);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let current = route.read().await.clone();
                            match monitor.check(&current, now_ms()).await {
                                MonitorAction::Stay => {}
                                MonitorAction::Logout(reason) => {
                                    let path = coordinator.logout(reason).await;
                                    if action_tx
                                        .send(MonitorAction::RedirectLogin { path })
                                        .await
                                        .is_err()
                                    {
                                        break;
                                    }
                                }
                                action => {
                                    if action_tx.send(action).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                debug!("Auth check timer stopped");
            })
        };

        let display_task = {
            let mut shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(TICK_INTERVAL);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let state = monitor.display_state(now_ms()).await;
                            if display_tx.send(state).is_err() {
                                break;
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                debug!("Display refresh timer stopped");
            })
        };

        let lockout_task = {
            let mut shutdown = shutdown_rx;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(TICK_INTERVAL);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let view = lockout.lock().await.tick(now_ms());
                            if lockout_tx.send(view).is_err() {
                                break;
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                debug!("Lockout countdown timer stopped");
            })
        };

        info!("Session scheduler started");

        (
            Self {
                shutdown_tx,
                tasks: vec![auth_task, display_task, lockout_task],
            },
            SchedulerChannels {
                actions: action_rx,
                display: display_rx,
                lockout: lockout_rx,
            },
        )
    }

    /// Stop all timers and wait for them to wind down
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Session scheduler stopped");
    }
}
