//! Server API contract
//!
//! Request/response shapes for every endpoint the session core calls, and
//! the [`AuthApi`] seam the flows and monitor talk through. The server
//! implementation is out of scope; tests inject mocks behind the trait.

use crate::tenant::Family;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the server boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: the request never got an answer. Local state is
    /// left untouched so the user can retry.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered and said no (bad credentials, unknown entity)
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Result type for server calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// How a family authenticates its caretakers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthType {
    /// Single shared security PIN
    System,
    /// Per-caretaker login id + security PIN
    Caretaker,
}

/// Body of `POST /api/auth`: either PIN credentials or the hidden
/// admin-password path, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinLoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

/// Successful `POST /api/auth` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    /// Caretaker id the token was issued to
    pub id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sys_admin: Option<bool>,
}

/// `GET /api/auth/ip-lockout` payload, scoped to the caller's IP
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutStatus {
    pub locked: bool,
    /// Remaining lockout duration in milliseconds
    pub remaining_time: i64,
}

/// Body of `POST /api/accounts/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLoginRequest {
    pub email: String,
    pub password: String,
}

/// Account identity returned alongside the token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub first_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_slug: Option<String>,
}

/// Successful `POST /api/accounts/login` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLoginResponse {
    pub token: String,
    pub user: AccountUser,
}

/// Tenant configuration as reported by `GET /api/family/by-slug/:slug`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyConfig {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub auth_type: AuthType,
}

impl FamilyConfig {
    /// The tenant identity portion of this configuration
    pub fn family(&self) -> Family {
        Family {
            id: self.id.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// The server boundary the session core calls through.
///
/// Every method maps to one endpoint in the external contract. All of them
/// are authoritative server-side; nothing here grants capability on the
/// client beyond what the UI displays.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /api/auth/ip-lockout`
    async fn check_ip_lockout(&self) -> ApiResult<LockoutStatus>;

    /// `POST /api/auth`
    async fn login_pin(&self, request: PinLoginRequest) -> ApiResult<AuthGrant>;

    /// `POST /api/accounts/login`
    async fn login_account(&self, request: AccountLoginRequest) -> ApiResult<AccountLoginResponse>;

    /// `POST /api/accounts/forgot-password`
    async fn forgot_password(&self, email: &str) -> ApiResult<()>;

    /// `POST /api/auth/logout`, bearer-authorized, best-effort
    async fn logout(&self, token: &str) -> ApiResult<()>;

    /// `GET /api/settings/idle-time`, returns a bare seconds value
    async fn fetch_idle_time_secs(&self) -> ApiResult<i64>;

    /// `GET /api/settings/auth-life`, returns a bare seconds value
    async fn fetch_auth_life_secs(&self) -> ApiResult<i64>;

    /// `GET /api/family/by-slug/:slug`
    async fn family_by_slug(&self, slug: &str) -> ApiResult<Option<FamilyConfig>>;

    /// `GET /api/caretaker/:id`, display-name lookup, non-critical
    async fn caretaker_name(&self, caretaker_id: &str) -> ApiResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pin_request_omits_absent_fields() {
        let request = PinLoginRequest {
            security_pin: Some("123456".to_string()),
            ..Default::default()
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire, json!({"securityPin": "123456"}));
    }

    #[test]
    fn test_lockout_status_wire_names() {
        let status: LockoutStatus =
            serde_json::from_value(json!({"locked": true, "remainingTime": 125000})).unwrap();
        assert!(status.locked);
        assert_eq!(status.remaining_time, 125_000);
    }

    #[test]
    fn test_auth_type_wire_names() {
        assert_eq!(
            serde_json::from_value::<AuthType>(json!("CARETAKER")).unwrap(),
            AuthType::Caretaker
        );
        assert_eq!(
            serde_json::to_value(AuthType::System).unwrap(),
            json!("SYSTEM")
        );
    }
}
