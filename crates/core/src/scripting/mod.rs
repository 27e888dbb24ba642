//! Isolated script evaluation and result extraction.
//!
//! [`evaluator::ScriptEvaluator`] is the seam between the gateway and a
//! concrete engine; [`engine::RhaiEvaluator`] is the production
//! implementation. [`extract::extract`] reads the configured result binding
//! from a completed evaluation.

pub mod engine;
pub mod evaluator;
pub mod extract;

/// Shared test helpers for evaluator tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::time::Duration;

    use super::evaluator::EvaluatorLimits;

    /// Default limits with a short deadline so runaway-script tests stay fast.
    pub fn short_limits() -> EvaluatorLimits {
        EvaluatorLimits {
            timeout: Duration::from_millis(200),
            ..EvaluatorLimits::default()
        }
    }
}
