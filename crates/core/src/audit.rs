//! Per-call audit trail, gated by `logging_enabled`.
//!
//! One line per lifecycle event under the `scriptgate::audit` target. Lines
//! carry the caller's peer address and transport, the script length and the
//! outcome. Credential values and script text are never recorded.

use std::fmt;

use crate::auth::RejectReason;

/// Tracing target for audit lines.
pub const AUDIT_TARGET: &str = "scriptgate::audit";

/// Lifecycle events recorded for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Received,
    Rejected,
    Completed,
    Failed,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is calling and over which transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Peer address, or `"unknown"` when the transport cannot provide one.
    pub peer: String,
    /// `"grpc"` or `"http"`.
    pub transport: &'static str,
}

impl Caller {
    pub fn new(peer: Option<impl ToString>, transport: &'static str) -> Self {
        Self {
            peer: peer.map_or_else(|| "unknown".to_string(), |p| p.to_string()),
            transport,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuditLogger {
    enabled: bool,
}

impl AuditLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn received(&self, caller: &Caller) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            event = %AuditEvent::Received,
            peer = %caller.peer,
            transport = caller.transport,
            "Client wants to execute a script"
        );
    }

    pub fn rejected(&self, caller: &Caller, reason: RejectReason) {
        if !self.enabled {
            return;
        }
        tracing::warn!(
            target: AUDIT_TARGET,
            event = %AuditEvent::Rejected,
            peer = %caller.peer,
            transport = caller.transport,
            reason = reason.as_str(),
            "Client failed authentication"
        );
    }

    pub fn completed(
        &self,
        caller: &Caller,
        script_len: usize,
        elapsed_ms: u64,
        result_bound: bool,
    ) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            event = %AuditEvent::Completed,
            peer = %caller.peer,
            transport = caller.transport,
            script_len,
            elapsed_ms,
            result_bound,
            "Client executed the script"
        );
    }

    pub fn failed(
        &self,
        caller: &Caller,
        script_len: usize,
        elapsed_ms: u64,
        error: &dyn fmt::Display,
    ) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            event = %AuditEvent::Failed,
            peer = %caller.peer,
            transport = caller.transport,
            script_len,
            elapsed_ms,
            error = %error,
            "Client failed to execute the script"
        );
    }
}
