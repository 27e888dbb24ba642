//! Result extraction: pull the configured binding out of a finished evaluation.

use serde_json::Value;

use super::evaluator::{BindingValue, Bindings};
use crate::error::GatewayError;

/// Take the binding named `name` from `bindings`.
///
/// - bound to a JSON-representable value: `Ok(Some(value))`
/// - never bound: `Ok(None)`
/// - bound to an opaque value: [`GatewayError::Serialization`]
pub fn extract(mut bindings: Bindings, name: &str) -> Result<Option<Value>, GatewayError> {
    match bindings.take(name) {
        None => Ok(None),
        Some(BindingValue::Data(value)) => Ok(Some(value)),
        Some(BindingValue::Opaque { type_name }) => Err(GatewayError::Serialization(format!(
            "Value bound to '{name}' cannot be serialized: unsupported type '{type_name}'"
        ))),
    }
}
