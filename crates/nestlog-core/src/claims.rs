//! Bearer token claims and the client-side token inspector
//!
//! The client decodes the payload segment of the bearer token to read
//! identity and expiry, but performs no signature verification. Trust is
//! established by HTTPS transport plus server-side verification on every
//! API call; everything derived here is a UI hint, not an enforcement
//! boundary.

use crate::error::DecodeError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Role carried in the token for account-authenticated users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Owner,
}

/// Decoded payload of a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject identifier (caretaker or account id)
    pub subject_id: String,
    /// System administrator flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sys_admin: Option<bool>,
    /// True for account-authenticated (email/password) sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_account_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Slug of the family the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_slug: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiry as epoch seconds
    pub exp: i64,
    #[serde(
        default,
        rename = "betaparticipant",
        skip_serializing_if = "Option::is_none"
    )]
    pub beta_participant: Option<bool>,
}

impl Claims {
    /// Expiry in epoch milliseconds
    pub fn expires_at_ms(&self) -> i64 {
        self.exp * 1000
    }

    /// Whether the token's absolute expiry has passed
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms() <= now_ms
    }

    /// Whether this session was established via email/password account login
    pub fn account_auth(&self) -> bool {
        self.is_account_auth.unwrap_or(false)
    }

    /// Display-only administrative capability derived from claims.
    ///
    /// Every privileged server call re-checks authorization independently;
    /// this only drives what the UI shows.
    pub fn admin_hint(&self) -> bool {
        (self.account_auth() && self.role == Some(Role::Owner))
            || self.role == Some(Role::Admin)
            || self.is_sys_admin.unwrap_or(false)
    }
}

/// Decode the claims out of a bearer token without verifying its signature.
///
/// The wire format is three `.`-joined segments with a base64url-encoded
/// JSON claim set in the middle. Any malformed input comes back as a
/// [`DecodeError`]; callers treat that as "unauthenticated".
pub fn decode_token(token: &str) -> std::result::Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Malformed);
    }

    // Tokens in the wild carry both padded and unpadded payloads
    let payload = segments[1].trim_end_matches('=');
    if payload.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let claims = serde_json::from_slice(&bytes)?;
    Ok(claims)
}

/// Build a structurally valid token around the given payload JSON.
/// Test helper only; real tokens are issued by the server.
#[cfg(test)]
pub(crate) fn encode_token(payload: &serde_json::Value) -> String {
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("hdr.{}.sig", body)
}
