//! Routing: page discovery, the route table, the navigation guard and the
//! navigator that performs transitions.
//!
//! `Router` ties them together the way the front end's router does: every
//! transition runs the guard first, then resolves against the table,
//! following redirects from either.

pub mod error;
pub mod guard;
pub mod navigator;
pub mod router;
pub mod table;

pub use error::RouteError;
pub use guard::{GuardDecision, NavigationGuard, DEFAULT_PUBLIC_ROUTES, HOME_PATH, LOGIN_PATH};
pub use navigator::{HistoryNavigator, Navigator};
pub use router::{Navigation, Router};
pub use table::{RouteEntry, RouteMatch, RouteTable, RouteTableBuilder, RouteTarget};
