//! Transport layer
//!
//! The API is served over HTTP only.

mod http;

pub use http::{router, run_http};
