//! Persistent client-side key-value store
//!
//! The browser-profile-equivalent store every session component reads and
//! writes. Backed by a JSON file under ~/.config/nestlog/client_store.json
//! (or a caller-supplied path; tests usually run fully in memory).
//!
//! Three recurring timers share this store with no transactional
//! guarantees, so every write is a full overwrite of one well-defined key:
//! out-of-order writes converge instead of corrupting.

use nestlog_core::SessionSnapshot;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Well-known store keys
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    /// Epoch-millis string of the last successful unlock
    pub const UNLOCK_TIME: &str = "unlockTime";
    pub const CARETAKER_ID: &str = "caretakerId";
    pub const IDLE_TIME_SECONDS: &str = "idleTimeSeconds";
    pub const AUTH_LIFE_SECONDS: &str = "authLifeSeconds";
    /// JSON of the account user returned by account login
    pub const ACCOUNT_USER: &str = "accountUser";
    /// JSON of the last resolved family
    pub const SELECTED_FAMILY: &str = "selectedFamily";
    /// Failed-attempt counter kept for display
    pub const ATTEMPTS: &str = "attempts";
    /// Epoch-millis string of the last observed lockout expiry
    pub const LOCKOUT_TIME: &str = "lockoutTime";

    /// Per-tenant selected child key
    pub fn selected_baby(family_id: &str) -> String {
        format!("selectedBaby_{family_id}")
    }

    /// Per-tenant sleeping-children key (JSON array of ids)
    pub fn sleeping_babies(family_id: &str) -> String {
        format!("sleepingBabies_{family_id}")
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration directory not found")]
    NoConfigDir,
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-value store with JSON file persistence.
///
/// Cloning is cheap and all clones share the same state, so the monitor,
/// the login flow, and the logout coordinator can each hold one.
#[derive(Clone)]
pub struct ClientStore {
    /// Backing file; None runs purely in memory (tests)
    path: Option<PathBuf>,
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl ClientStore {
    /// Open the store at the default path, loading existing data if present
    pub async fn new() -> StoreResult<Self> {
        Self::with_path(Self::default_path()?).await
    }

    /// Open the store at a specific path
    pub async fn with_path(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(data) => {
                    info!("Loaded client store from {:?}", path);
                    data
                }
                Err(e) => {
                    warn!("Failed to parse client store, starting fresh: {}", e);
                    HashMap::new()
                }
            }
        } else {
            debug!("No existing client store, creating new");
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// A store with no backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Default storage path (~/.config/nestlog/client_store.json)
    fn default_path() -> StoreResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(config_dir.join("nestlog").join("client_store.json"))
    }

    /// Persist current state to disk (no-op for in-memory stores)
    async fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = self.data.read().await;
        let json = serde_json::to_string_pretty(&*data)?;
        std::fs::write(path, json)?;
        debug!("Saved client store to {:?}", path);
        Ok(())
    }

    /// Read a key
    pub async fn get(&self, key: &str) -> Option<String> {
        let data = self.data.read().await;
        data.get(key).cloned()
    }

    /// Full overwrite of one key
    pub async fn set(&self, key: &str, value: impl Into<String>) -> StoreResult<()> {
        {
            let mut data = self.data.write().await;
            data.insert(key.to_string(), value.into());
        }
        self.save().await
    }

    /// Delete a key; deleting an absent key is not an error
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        {
            let mut data = self.data.write().await;
            data.remove(key);
        }
        self.save().await
    }

    /// Read a key as i64; unparseable values read as absent
    pub async fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).await.and_then(|v| v.parse().ok())
    }

    /// Write a value as its JSON encoding
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, json).await
    }

    /// Read and decode a JSON value; decode failure reads as absent
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unparseable value under {}: {}", key, e);
                None
            }
        }
    }

    /// Reconstruct the session state from the persisted keys.
    /// Missing policy values fall back to the defaults so a blank cache
    /// never disables idle logout.
    pub async fn session_snapshot(&self) -> SessionSnapshot {
        let defaults = SessionSnapshot::default();
        SessionSnapshot {
            token: self.get(keys::AUTH_TOKEN).await,
            unlock_time_ms: self.get_i64(keys::UNLOCK_TIME).await,
            idle_timeout_secs: self
                .get_i64(keys::IDLE_TIME_SECONDS)
                .await
                .unwrap_or(defaults.idle_timeout_secs),
            auth_life_secs: self
                .get_i64(keys::AUTH_LIFE_SECONDS)
                .await
                .unwrap_or(defaults.auth_life_secs),
        }
    }
}
