//! HTTP front end for the script gateway.
//!
//! Exposes config, state, error handling and routes so integration tests
//! and the `scriptgate` binary share the same building blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
