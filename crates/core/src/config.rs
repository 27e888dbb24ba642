//! Gateway configuration, read once at startup and shared read-only.
//!
//! Loading never falls back to a default credential or result name: any
//! missing required value is a [`ConfigError`] and the process must not start.

use std::str::FromStr;
use std::time::Duration;

use crate::auth::{
    CredentialHeaders, DEFAULT_PASSWORD_HEADER, DEFAULT_TOKEN_HEADER, DEFAULT_USERNAME_HEADER,
};
use crate::credentials::Credential;
use crate::scripting::evaluator::EvaluatorLimits;

/// Default number of concurrent evaluations.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default maximum accepted script size in bytes (1 MiB).
pub const DEFAULT_MAX_SCRIPT_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Either SCRIPTGATE_TOKEN or SCRIPTGATE_USERNAME/SCRIPTGATE_PASSWORD must be set")]
    NoCredential,

    #[error("SCRIPTGATE_TOKEN and SCRIPTGATE_USERNAME/SCRIPTGATE_PASSWORD are mutually exclusive")]
    AmbiguousCredential,

    #[error("SCRIPTGATE_USERNAME and SCRIPTGATE_PASSWORD must be set together")]
    IncompleteCredential,
}

/// Settings consumed by the transport-neutral gateway.
///
/// | Env Var                          | Default       |
/// |----------------------------------|---------------|
/// | `SCRIPTGATE_TOKEN`               | --            |
/// | `SCRIPTGATE_USERNAME`            | --            |
/// | `SCRIPTGATE_PASSWORD`            | --            |
/// | `SCRIPTGATE_TOKEN_HEADER`        | `x-token`     |
/// | `SCRIPTGATE_USERNAME_HEADER`     | `x-username`  |
/// | `SCRIPTGATE_PASSWORD_HEADER`     | `x-password`  |
/// | `SCRIPTGATE_RESULT_NAME`         | -- (required) |
/// | `SCRIPTGATE_MAX_WORKERS`         | `10`          |
/// | `SCRIPTGATE_LOGGING_ENABLED`     | `false`       |
/// | `SCRIPTGATE_EXECUTION_TIMEOUT_MS`| `10000`       |
/// | `SCRIPTGATE_MAX_OPERATIONS`      | `100000000`   |
/// | `SCRIPTGATE_MAX_SCRIPT_BYTES`    | `1048576`     |
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The credential callers must present.
    pub credential: Credential,
    /// Metadata key names carrying the credential.
    pub credential_headers: CredentialHeaders,
    /// Name of the binding returned to the caller.
    pub result_name: String,
    /// Maximum number of evaluations running at once.
    pub max_workers: usize,
    /// Whether per-call audit lines are emitted.
    pub logging_enabled: bool,
    /// Scripts longer than this are rejected before evaluation.
    pub max_script_bytes: usize,
    /// Engine resource limits.
    pub limits: EvaluatorLimits,
}

impl GatewayConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let credential = read_credential(&lookup)?;

        let credential_headers = CredentialHeaders {
            token: header_name(&lookup, "SCRIPTGATE_TOKEN_HEADER", DEFAULT_TOKEN_HEADER)?,
            username: header_name(&lookup, "SCRIPTGATE_USERNAME_HEADER", DEFAULT_USERNAME_HEADER)?,
            password: header_name(&lookup, "SCRIPTGATE_PASSWORD_HEADER", DEFAULT_PASSWORD_HEADER)?,
        };

        let result_name = required(&lookup, "SCRIPTGATE_RESULT_NAME")?;
        if !is_identifier(&result_name) {
            return Err(ConfigError::Invalid {
                key: "SCRIPTGATE_RESULT_NAME",
                message: format!("'{result_name}' is not a valid variable name"),
            });
        }

        let max_workers: usize = parse_or(&lookup, "SCRIPTGATE_MAX_WORKERS", DEFAULT_MAX_WORKERS)?;
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "SCRIPTGATE_MAX_WORKERS",
                message: "must be greater than zero".into(),
            });
        }

        let logging_enabled = parse_bool(&lookup, "SCRIPTGATE_LOGGING_ENABLED", false)?;
        let max_script_bytes =
            parse_or(&lookup, "SCRIPTGATE_MAX_SCRIPT_BYTES", DEFAULT_MAX_SCRIPT_BYTES)?;

        let defaults = EvaluatorLimits::default();
        let timeout_ms: u64 = parse_or(
            &lookup,
            "SCRIPTGATE_EXECUTION_TIMEOUT_MS",
            defaults.timeout.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "SCRIPTGATE_EXECUTION_TIMEOUT_MS",
                message: "must be greater than zero".into(),
            });
        }
        let limits = EvaluatorLimits {
            timeout: Duration::from_millis(timeout_ms),
            max_operations: parse_or(
                &lookup,
                "SCRIPTGATE_MAX_OPERATIONS",
                defaults.max_operations,
            )?,
            ..defaults
        };

        Ok(Self {
            credential,
            credential_headers,
            result_name,
            max_workers,
            logging_enabled,
            max_script_bytes,
            limits,
        })
    }
}

fn read_credential(lookup: &impl Fn(&str) -> Option<String>) -> Result<Credential, ConfigError> {
    let token = optional(lookup, "SCRIPTGATE_TOKEN");
    let username = optional(lookup, "SCRIPTGATE_USERNAME");
    let password = optional(lookup, "SCRIPTGATE_PASSWORD");

    match (token, username, password) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigError::AmbiguousCredential),
        (Some(token), None, None) => Ok(Credential::Token(token)),
        (None, Some(username), Some(password)) => {
            Ok(Credential::UsernamePassword { username, password })
        }
        (None, Some(_), None) | (None, None, Some(_)) => Err(ConfigError::IncompleteCredential),
        (None, None, None) => Err(ConfigError::NoCredential),
    }
}

/// Read `key`, treating an empty value as unset.
pub fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.is_empty())
}

/// Read `key`, failing if it is unset or empty.
pub fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

/// Parse `key` as `T`, using `default` when unset.
pub fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`, case-insensitive).
pub fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match optional(lookup, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid {
                key,
                message: format!("'{other}' is not a boolean"),
            }),
        },
    }
}

/// Read a metadata key name, lowercased and validated for both HTTP and gRPC.
fn header_name(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    let name = optional(lookup, key)
        .unwrap_or_else(|| default.to_string())
        .to_ascii_lowercase();

    let valid_chars = name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if name.is_empty() || !valid_chars || name.ends_with("-bin") {
        return Err(ConfigError::Invalid {
            key,
            message: format!("'{name}' is not a valid header / metadata name"),
        });
    }
    Ok(name)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
