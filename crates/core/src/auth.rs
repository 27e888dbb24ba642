//! Auth gate: locate caller credentials in request metadata and admit or reject.
//!
//! Transports expose their header / metadata maps through [`CredentialSource`].
//! The gate performs constant work and never touches the evaluator; a
//! successful check yields an [`Admission`], which is the only way to reach
//! script execution on the [`Gateway`](crate::gateway::Gateway).

use std::collections::HashMap;

use crate::credentials::{Credential, CredentialStore, Presented};

/// Default metadata key carrying a token.
pub const DEFAULT_TOKEN_HEADER: &str = "x-token";
/// Default metadata key carrying a username.
pub const DEFAULT_USERNAME_HEADER: &str = "x-username";
/// Default metadata key carrying a password.
pub const DEFAULT_PASSWORD_HEADER: &str = "x-password";

/// Read-only view over a transport's request metadata.
pub trait CredentialSource {
    /// Return the value stored under `key`, or `None` if absent or not valid text.
    fn value(&self, key: &str) -> Option<&str>;
}

impl CredentialSource for HashMap<String, String> {
    fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Metadata key names under which credentials are expected.
///
/// Names are stored lowercase; both HTTP headers and gRPC metadata keys are
/// lowercase on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHeaders {
    pub token: String,
    pub username: String,
    pub password: String,
}

impl Default for CredentialHeaders {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN_HEADER.to_string(),
            username: DEFAULT_USERNAME_HEADER.to_string(),
            password: DEFAULT_PASSWORD_HEADER.to_string(),
        }
    }
}

/// Why a request was rejected. Logged, never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredentials,
    InvalidCredentials,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

/// Result of the auth check. Computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Admitted,
    Rejected(RejectReason),
}

/// Proof that a request passed the auth gate.
///
/// Cannot be constructed outside this module.
#[derive(Debug)]
pub struct Admission {
    _private: (),
}

/// Compares request metadata against the configured credential.
#[derive(Debug, Clone)]
pub struct AuthGate {
    store: CredentialStore,
    headers: CredentialHeaders,
}

impl AuthGate {
    pub fn new(store: CredentialStore, headers: CredentialHeaders) -> Self {
        Self { store, headers }
    }

    /// Decide whether the request carrying `source` is admitted.
    pub fn decide(&self, source: &impl CredentialSource) -> AuthDecision {
        let presented = match self.store.credential() {
            Credential::Token(_) => source.value(&self.headers.token).map(Presented::Token),
            Credential::UsernamePassword { .. } => source
                .value(&self.headers.username)
                .zip(source.value(&self.headers.password))
                .map(|(username, password)| Presented::UsernamePassword { username, password }),
        };

        match presented {
            None => AuthDecision::Rejected(RejectReason::MissingCredentials),
            Some(presented) if self.store.matches(&presented) => AuthDecision::Admitted,
            Some(_) => AuthDecision::Rejected(RejectReason::InvalidCredentials),
        }
    }

    /// Run [`decide`](Self::decide) and turn an admitted decision into an [`Admission`].
    pub fn admit(&self, source: &impl CredentialSource) -> Result<Admission, RejectReason> {
        match self.decide(source) {
            AuthDecision::Admitted => Ok(Admission { _private: () }),
            AuthDecision::Rejected(reason) => Err(reason),
        }
    }
}
