//! docuhub file access server.
//!
//! Translates HTTP calls into object storage operations scoped to the
//! caller's owner identity.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
