//! Scriptgate core: the transport-neutral execution gateway.
//!
//! Holds the four-step contract shared by every front end:
//! authenticate, evaluate in an isolated namespace, extract the result
//! binding, and report a typed outcome. The gRPC and HTTP crates only
//! translate wire requests into calls on [`gateway::Gateway`] and its
//! errors back into transport statuses.

pub mod audit;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod scripting;
