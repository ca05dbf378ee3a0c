//! Authentication state for one session.
//!
//! This module provides:
//! - `AuthStore`: the persisted user/token pair with lazy expiry and
//!   change notification
//! - `SessionStorage`: the key/value seam it persists through, with
//!   in-memory and file-backed implementations
//! - `AuthSession`: login/logout/profile actions for the UI layer
//!
//! The store writes three keys together (`auth_data`, `auth_user`,
//! `auth_token`) and removes them together.

pub mod error;
pub mod session;
pub mod storage;
pub mod store;

pub use error::AuthError;
pub use session::AuthSession;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{AuthState, AuthStore};
