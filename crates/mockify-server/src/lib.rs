//! Mockify mock-data API server
//!
//! Session tokens, federated login and per-owner access control for
//! organizations, projects, schemas and mock records.

pub mod auth;
pub mod config;
mod constants;
pub mod directory;
mod error;
pub mod observability;
pub mod server;
pub mod store;
pub mod transport;
pub mod types;

pub use config::{Config, ConfigBuilder, HttpConfig, PublicAccessConfig, TelemetryConfig};
pub use error::{Error, ErrorBody, Result};
pub use server::AppState;
pub use types::*;
