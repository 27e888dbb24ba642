//! gRPC binding for the script gateway.
//!
//! Exposes `scriptgate.v1.ScriptService/SendCode` over `tonic`. Credentials
//! are read from call metadata, the shared [`Gateway`](scriptgate_core::gateway::Gateway)
//! does the work, and gateway errors are translated into gRPC statuses.

pub mod metadata;
pub mod server;
pub mod service;
pub mod status;

pub mod pb {
    tonic::include_proto!("scriptgate.v1");
}

pub use service::ScriptGatewayService;

/// Transport tag recorded in audit lines.
pub const TRANSPORT: &str = "grpc";
