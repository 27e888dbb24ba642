//! Configured credential and the single comparison the gateway performs on it.
//!
//! Values are compared through SHA-256 digests with a constant-time fold so
//! the comparison time does not depend on how many leading bytes match.

use std::fmt;

use sha2::{Digest, Sha256};

/// The secret a caller must present to be admitted.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A single bearer-style token.
    Token(String),
    /// A username/password pair; both halves must match.
    UsernamePassword { username: String, password: String },
}

impl Credential {
    /// Short name of the credential mode, safe to log.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::UsernamePassword { .. } => "username_password",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::UsernamePassword { .. } => f.write_str("UsernamePassword(<redacted>)"),
        }
    }
}

/// Credential values as presented by a caller, borrowed from request metadata.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Presented<'a> {
    Token(&'a str),
    UsernamePassword { username: &'a str, password: &'a str },
}

impl fmt::Debug for Presented<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::UsernamePassword { .. } => f.write_str("UsernamePassword(<redacted>)"),
        }
    }
}

/// Holds the one configured credential for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credential: Credential,
}

impl CredentialStore {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Compare presented values against the configured credential.
    ///
    /// A presented shape that differs from the configured mode never matches.
    pub fn matches(&self, presented: &Presented<'_>) -> bool {
        match (&self.credential, presented) {
            (Credential::Token(expected), Presented::Token(given)) => {
                digest_eq(expected.as_bytes(), given.as_bytes())
            }
            (
                Credential::UsernamePassword { username, password },
                Presented::UsernamePassword {
                    username: given_user,
                    password: given_pass,
                },
            ) => {
                // Evaluate both halves unconditionally.
                let user_ok = digest_eq(username.as_bytes(), given_user.as_bytes());
                let pass_ok = digest_eq(password.as_bytes(), given_pass.as_bytes());
                user_ok & pass_ok
            }
            _ => false,
        }
    }
}

fn digest_eq(expected: &[u8], given: &[u8]) -> bool {
    let a = Sha256::digest(expected);
    let b = Sha256::digest(given);
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
