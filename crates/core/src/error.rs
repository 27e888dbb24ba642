/// Message returned to callers whose credentials were rejected.
///
/// Deliberately identical for missing and wrong credentials.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or incorrect credentials. Never carries detail.
    #[error("Invalid credentials")]
    Unauthorized,

    /// The script failed to parse, raised, or hit an execution limit.
    #[error("{0}")]
    Evaluation(String),

    /// The result binding holds a value with no JSON representation.
    #[error("{0}")]
    Serialization(String),

    /// The worker pool has been shut down.
    #[error("Execution workers unavailable")]
    Unavailable,

    /// The evaluation task died without producing an outcome.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_has_fixed_message() {
        assert_eq!(GatewayError::Unauthorized.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn evaluation_passes_detail_through() {
        let err = GatewayError::Evaluation("Runtime error: bad".into());
        assert_eq!(err.to_string(), "Runtime error: bad");
    }

    #[test]
    fn unavailable_has_fixed_message() {
        assert_eq!(
            GatewayError::Unavailable.to_string(),
            "Execution workers unavailable"
        );
    }
}
