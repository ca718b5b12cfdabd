//! Shared test doubles for the session crate

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use nestlog_core::api::{
    AccountLoginRequest, AccountLoginResponse, ApiError, ApiResult, AuthApi, AuthGrant, AuthType,
    FamilyConfig, LockoutStatus, PinLoginRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a structurally valid bearer token around the given payload
pub fn test_token(payload: serde_json::Value) -> String {
    format!("hdr.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

/// Scripted server double for monitor/logout/scheduler tests
#[derive(Default)]
pub struct MockApi {
    /// Families resolvable by slug
    pub families: Vec<FamilyConfig>,
    /// Display name returned for any caretaker id
    pub caretaker_name: Option<String>,
    /// When true, every call fails with a network error
    pub network_down: bool,
    pub logout_calls: AtomicUsize,
}

impl MockApi {
    pub fn with_family(slug: &str, id: &str) -> Self {
        Self {
            families: vec![FamilyConfig {
                id: id.to_string(),
                slug: slug.to_string(),
                name: slug.to_string(),
                auth_type: AuthType::System,
            }],
            ..Default::default()
        }
    }

    fn guard(&self) -> ApiResult<()> {
        if self.network_down {
            Err(ApiError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthApi for MockApi {
    async fn check_ip_lockout(&self) -> ApiResult<LockoutStatus> {
        self.guard()?;
        Ok(LockoutStatus {
            locked: false,
            remaining_time: 0,
        })
    }

    async fn login_pin(&self, _request: PinLoginRequest) -> ApiResult<AuthGrant> {
        self.guard()?;
        Err(ApiError::Rejected("not scripted".to_string()))
    }

    async fn login_account(
        &self,
        _request: AccountLoginRequest,
    ) -> ApiResult<AccountLoginResponse> {
        self.guard()?;
        Err(ApiError::Rejected("not scripted".to_string()))
    }

    async fn forgot_password(&self, _email: &str) -> ApiResult<()> {
        self.guard()
    }

    async fn logout(&self, _token: &str) -> ApiResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.guard()
    }

    async fn fetch_idle_time_secs(&self) -> ApiResult<i64> {
        self.guard()?;
        Ok(1800)
    }

    async fn fetch_auth_life_secs(&self) -> ApiResult<i64> {
        self.guard()?;
        Ok(86_400)
    }

    async fn family_by_slug(&self, slug: &str) -> ApiResult<Option<FamilyConfig>> {
        self.guard()?;
        Ok(self.families.iter().find(|f| f.slug == slug).cloned())
    }

    async fn caretaker_name(&self, _caretaker_id: &str) -> ApiResult<Option<String>> {
        self.guard()?;
        Ok(self.caretaker_name.clone())
    }
}
