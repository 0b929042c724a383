//! HTTP server for the Shelf catalog.
//!
//! Serves the catalog services from `shelf-sdk` as a JSON API. Callers sign
//! in with `POST /v1/login` and present the returned token as a bearer
//! credential; requests without one act anonymously.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, Credentials, SessionTable};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::ShelfServer;
pub use state::{AppState, Caller};
