//! Nestlog Core - session, tenancy, and API contract types
//!
//! The foundation of the client session layer for the Nestlog baby-activity
//! tracker: bearer-token claims and the unverifying inspector, the tenant
//! route model, the session validity law, and the trait boundary behind
//! which the server lives.
//!
//! Everything here is pure over an explicit `now_ms`, so the recurring
//! session checks built on top can be driven deterministically in tests.

pub mod api;
pub mod claims;
pub mod error;
pub mod session;
pub mod tenant;

pub use api::{
    AccountLoginRequest, AccountLoginResponse, AccountUser, ApiError, ApiResult, AuthApi,
    AuthGrant, AuthType, FamilyConfig, LockoutStatus, PinLoginRequest,
};
pub use claims::{decode_token, Claims, Role};
pub use error::{DecodeError, Error, Result};
pub use session::{SessionSnapshot, DEFAULT_AUTH_LIFE_SECS, DEFAULT_IDLE_TIMEOUT_SECS};
pub use tenant::{Baby, Family, Route, DEFAULT_LANDING_PATH};
