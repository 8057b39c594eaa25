//! # Route Modules
//!
//! - [`restaurants`]: restaurant registration and lookup, mounted through
//!   the [`RouteModule`](crate::registry::RouteModule) protocol.
//! - [`health`]: probes and metrics, mounted at the root.

pub mod health;
pub mod restaurants;
