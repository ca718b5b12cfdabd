//! Credential login flows
//!
//! Two mutually exclusive first factors converge on the same
//! token-acquisition contract: the PIN flow for family tenants (shared PIN
//! or per-caretaker login id + PIN, per the server-reported auth type) and
//! the email/password flow for account tenants. Both end by writing the
//! token and unlock timestamp to the client store; nothing else in the
//! system creates sessions.

use crate::gesture::AdminGestureDetector;
use crate::lockout::LockoutState;
use crate::store::{keys, ClientStore, StoreError};
use nestlog_core::api::{
    AccountLoginRequest, ApiError, AuthApi, AuthType, FamilyConfig, PinLoginRequest,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Why a submission failed
#[derive(Debug)]
pub enum LoginFailure {
    /// Attempts are locked out; the countdown drives the form
    Lockout(LockoutState),
    /// The server rejected the credentials (message stays generic)
    InvalidCredentials,
    /// The request never got an answer; local state was left untouched
    Network(String),
    /// Input failed the client-side shape check before any network call
    Validation(String),
    /// The client store could not be written
    Storage(String),
}

impl LoginFailure {
    /// User-facing message for the failure
    pub fn message(&self) -> String {
        match self {
            LoginFailure::Lockout(_) => "Too many failed attempts. Try again later.".to_string(),
            LoginFailure::InvalidCredentials => "Invalid credentials. Please try again.".to_string(),
            LoginFailure::Network(_) => "Connection problem. Please try again.".to_string(),
            LoginFailure::Validation(msg) => msg.clone(),
            LoginFailure::Storage(_) => "Could not save your session. Please try again.".to_string(),
        }
    }
}

/// Login state machine phases
#[derive(Debug)]
pub enum LoginPhase {
    Idle,
    Submitting,
    /// Terminal: control transitions to navigation
    Success { redirect: String },
    /// Back to input with an error message (and a countdown if locked out)
    Failed(LoginFailure),
}

fn is_digits(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Fail-fast email shape check (`local@domain.tld`, no whitespace). A UX
/// optimization before the network call, not a security boundary.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn storage_failure(e: StoreError) -> LoginFailure {
    warn!("Store write failed during login: {}", e);
    LoginFailure::Storage(e.to_string())
}

/// PIN-based login for a family tenant, including the hidden
/// admin-password sub-mode behind the click gesture.
pub struct PinLoginFlow {
    api: Arc<dyn AuthApi>,
    store: ClientStore,
    family: FamilyConfig,
    phase: LoginPhase,
    gesture: AdminGestureDetector,
    admin_mode: bool,
}

impl PinLoginFlow {
    pub fn new(api: Arc<dyn AuthApi>, store: ClientStore, family: FamilyConfig) -> Self {
        Self {
            api,
            store,
            family,
            phase: LoginPhase::Idle,
            gesture: AdminGestureDetector::new(),
            admin_mode: false,
        }
    }

    pub fn phase(&self) -> &LoginPhase {
        &self.phase
    }

    /// Return to input after a failure was shown
    pub fn reset(&mut self) {
        self.phase = LoginPhase::Idle;
    }

    pub fn admin_mode(&self) -> bool {
        self.admin_mode
    }

    /// A click on the disabled submit button. Counts toward the unlock
    /// gesture; returns whether admin mode is now active.
    pub fn disabled_button_click(&mut self, now_ms: i64) -> bool {
        if self.gesture.click(now_ms) {
            info!("Admin sub-mode unlocked");
            self.admin_mode = true;
        }
        self.admin_mode
    }

    /// Leave admin mode, discarding gesture progress and any partial
    /// admin password input held by the form.
    pub fn exit_admin_mode(&mut self) {
        self.admin_mode = false;
        self.gesture.reset();
        self.phase = LoginPhase::Idle;
    }

    /// Submit PIN credentials
    pub async fn submit(
        &mut self,
        login_id: Option<&str>,
        security_pin: &str,
        now_ms: i64,
    ) -> &LoginPhase {
        self.phase = LoginPhase::Submitting;

        if self.family.auth_type == AuthType::Caretaker {
            let valid = login_id.is_some_and(|id| is_digits(id, 2, 2));
            if !valid {
                self.phase = LoginPhase::Failed(LoginFailure::Validation(
                    "A 2-digit login id is required.".to_string(),
                ));
                return &self.phase;
            }
        }
        if !is_digits(security_pin, 6, 10) {
            self.phase = LoginPhase::Failed(LoginFailure::Validation(
                "The security PIN must be 6 to 10 digits.".to_string(),
            ));
            return &self.phase;
        }

        if let Some(failure) = self.precheck_lockout(now_ms).await {
            self.phase = LoginPhase::Failed(failure);
            return &self.phase;
        }

        let request = PinLoginRequest {
            login_id: (self.family.auth_type == AuthType::Caretaker)
                .then(|| login_id.unwrap_or_default().to_string()),
            security_pin: Some(security_pin.to_string()),
            admin_password: None,
        };
        self.phase = self.post_credentials(request, now_ms).await;
        &self.phase
    }

    /// Submit the hidden admin password, bypassing the PIN/login-id flow
    pub async fn submit_admin(&mut self, admin_password: &str, now_ms: i64) -> &LoginPhase {
        self.phase = LoginPhase::Submitting;

        if admin_password.is_empty() {
            self.phase = LoginPhase::Failed(LoginFailure::Validation(
                "A password is required.".to_string(),
            ));
            return &self.phase;
        }

        if let Some(failure) = self.precheck_lockout(now_ms).await {
            self.phase = LoginPhase::Failed(failure);
            return &self.phase;
        }

        let request = PinLoginRequest {
            admin_password: Some(admin_password.to_string()),
            ..Default::default()
        };
        self.phase = self.post_credentials(request, now_ms).await;
        &self.phase
    }

    /// Abort early when the server already reports an active lockout. The
    /// check is advisory; a pre-check that cannot be reached does not
    /// block the attempt, since the server re-checks it anyway.
    async fn precheck_lockout(&self, now_ms: i64) -> Option<LoginFailure> {
        match self.api.check_ip_lockout().await {
            Ok(status) if status.locked => {
                let state = LockoutState::from_status(status, now_ms);
                self.remember_lockout(state).await;
                Some(LoginFailure::Lockout(state))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Lockout pre-check unreachable, proceeding: {}", e);
                None
            }
        }
    }

    async fn remember_lockout(&self, state: LockoutState) {
        if let Err(e) = self
            .store
            .set(keys::LOCKOUT_TIME, state.unlock_at_ms.to_string())
            .await
        {
            warn!("Failed to persist lockout marker: {}", e);
        }
    }

    async fn post_credentials(&mut self, request: PinLoginRequest, now_ms: i64) -> LoginPhase {
        match self.api.login_pin(request).await {
            Ok(grant) => {
                let writes = async {
                    self.store.set(keys::AUTH_TOKEN, grant.token).await?;
                    self.store
                        .set(keys::UNLOCK_TIME, now_ms.to_string())
                        .await?;
                    self.store.set(keys::CARETAKER_ID, grant.id).await?;
                    self.store.remove(keys::ATTEMPTS).await?;
                    self.store.remove(keys::LOCKOUT_TIME).await
                };
                if let Err(e) = writes.await {
                    return LoginPhase::Failed(storage_failure(e));
                }
                info!("Unlocked family {}", self.family.slug);
                LoginPhase::Success {
                    redirect: format!("/{}", self.family.slug),
                }
            }
            Err(ApiError::Network(e)) => LoginPhase::Failed(LoginFailure::Network(e)),
            Err(ApiError::Rejected(_)) => {
                self.bump_attempts().await;
                // The failed attempt itself may have just tripped the
                // lockout; surface the countdown rather than a generic error
                match self.api.check_ip_lockout().await {
                    Ok(status) if status.locked => {
                        let state = LockoutState::from_status(status, now_ms);
                        self.remember_lockout(state).await;
                        LoginPhase::Failed(LoginFailure::Lockout(state))
                    }
                    _ => LoginPhase::Failed(LoginFailure::InvalidCredentials),
                }
            }
        }
    }

    async fn bump_attempts(&self) {
        let attempts = self.store.get_i64(keys::ATTEMPTS).await.unwrap_or(0) + 1;
        if let Err(e) = self.store.set(keys::ATTEMPTS, attempts.to_string()).await {
            warn!("Failed to persist attempt counter: {}", e);
        }
    }
}

/// Email/password login for account tenants, with the forgot-password
/// sub-mode.
pub struct AccountLoginFlow {
    api: Arc<dyn AuthApi>,
    store: ClientStore,
    phase: LoginPhase,
}

impl AccountLoginFlow {
    pub fn new(api: Arc<dyn AuthApi>, store: ClientStore) -> Self {
        Self {
            api,
            store,
            phase: LoginPhase::Idle,
        }
    }

    pub fn phase(&self) -> &LoginPhase {
        &self.phase
    }

    pub fn reset(&mut self) {
        self.phase = LoginPhase::Idle;
    }

    /// Submit account credentials
    pub async fn submit(&mut self, email: &str, password: &str, now_ms: i64) -> &LoginPhase {
        self.phase = LoginPhase::Submitting;

        if !is_valid_email(email) {
            self.phase = LoginPhase::Failed(LoginFailure::Validation(
                "Enter a valid email address.".to_string(),
            ));
            return &self.phase;
        }
        if password.is_empty() {
            self.phase = LoginPhase::Failed(LoginFailure::Validation(
                "A password is required.".to_string(),
            ));
            return &self.phase;
        }

        let request = AccountLoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.phase = match self.api.login_account(request).await {
            Ok(response) => {
                let writes = async {
                    self.store.set(keys::AUTH_TOKEN, response.token).await?;
                    self.store
                        .set(keys::UNLOCK_TIME, now_ms.to_string())
                        .await?;
                    self.store.set_json(keys::ACCOUNT_USER, &response.user).await
                };
                match writes.await {
                    Err(e) => LoginPhase::Failed(storage_failure(e)),
                    Ok(()) => {
                        self.refresh_policy().await;
                        info!("Account {} logged in", response.user.email);
                        let redirect = match &response.user.family_slug {
                            Some(slug) => format!("/{slug}"),
                            None => "/onboarding".to_string(),
                        };
                        LoginPhase::Success { redirect }
                    }
                }
            }
            Err(ApiError::Network(e)) => LoginPhase::Failed(LoginFailure::Network(e)),
            Err(ApiError::Rejected(_)) => LoginPhase::Failed(LoginFailure::InvalidCredentials),
        };
        &self.phase
    }

    /// Fetch and cache the server-declared session policy values. Also
    /// called explicitly after onboarding. Failures keep whatever is
    /// cached; the monitor falls back to defaults.
    pub async fn refresh_policy(&self) {
        match self.api.fetch_idle_time_secs().await {
            Ok(secs) => {
                if let Err(e) = self.store.set(keys::IDLE_TIME_SECONDS, secs.to_string()).await {
                    warn!("Failed to cache idle policy: {}", e);
                }
            }
            Err(e) => warn!("Idle policy fetch failed: {}", e),
        }
        match self.api.fetch_auth_life_secs().await {
            Ok(secs) => {
                if let Err(e) = self.store.set(keys::AUTH_LIFE_SECONDS, secs.to_string()).await {
                    warn!("Failed to cache auth-life policy: {}", e);
                }
            }
            Err(e) => warn!("Auth-life policy fetch failed: {}", e),
        }
    }

    /// Request a password reset. The outcome stays generic whether or not
    /// the email exists, to avoid account enumeration; only transport
    /// failure surfaces a retry message.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), LoginFailure> {
        if !is_valid_email(email) {
            return Err(LoginFailure::Validation(
                "Enter a valid email address.".to_string(),
            ));
        }
        match self.api.forgot_password(email).await {
            Ok(()) | Err(ApiError::Rejected(_)) => Ok(()),
            Err(ApiError::Network(e)) => Err(LoginFailure::Network(e)),
        }
    }
}
