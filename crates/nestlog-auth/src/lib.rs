//! Nestlog Auth - credential flows and client-side session storage
//!
//! Everything that establishes a session: the PIN and account login state
//! machines, the advisory lockout countdown, the hidden admin-unlock
//! gesture, and the persistent key-value store the rest of the session
//! layer reads.
//!
//! # Login flow
//!
//! 1. The login page resolves its tenant and builds a [`PinLoginFlow`]
//!    (or an [`AccountLoginFlow`] for account tenants)
//! 2. `submit()` checks the lockout endpoint, posts credentials, and on
//!    success writes `authToken` + `unlockTime` to the [`ClientStore`]
//! 3. The session monitor takes over from there; only the logout
//!    coordinator ever clears what was written

pub mod gesture;
pub mod lockout;
pub mod login;
pub mod store;

pub use gesture::{AdminGestureDetector, RESET_WINDOW_MS, UNLOCK_CLICK_COUNT};
pub use lockout::{format_remaining, LockoutState, LockoutTracker, LockoutView};
pub use login::{is_valid_email, AccountLoginFlow, LoginFailure, LoginPhase, PinLoginFlow};
pub use store::{keys, ClientStore, StoreError, StoreResult};
