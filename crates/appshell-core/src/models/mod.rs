//! Data models shared by the auth store, guard and API client.
//!
//! - `User`: the signed-in account as returned by the backend
//! - `Token`: the API credential issued at login
//! - `AuthData`: the persisted user/token pair with an optional expiry
//!
//! All three keep unknown backend fields in an `extra` map so that a
//! round trip through session storage never drops data.

pub mod auth_data;
pub mod token;
pub mod user;

pub use auth_data::AuthData;
pub use token::Token;
pub use user::{User, UserId};
