//! # Middleware Modules
//!
//! Request pipeline, outermost first:
//!
//! TraceLayer → metrics → rate limit → CORS → panic recovery → client
//! identification → routes

pub mod client;
pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod recovery;
