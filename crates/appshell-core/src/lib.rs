//! Core library for appshell: the session-scoped auth store, the route
//! table and navigation guard, and the authenticated API client.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routing;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthSession, AuthState, AuthStore, FileStorage, MemoryStorage, SessionStorage};
pub use config::{ClientConfig, Config};
pub use models::{AuthData, Token, User, UserId};
pub use routing::{
    GuardDecision, HistoryNavigator, Navigation, NavigationGuard, Navigator, RouteTable,
    RouteTableBuilder, Router,
};
