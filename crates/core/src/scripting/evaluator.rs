//! Evaluation interface and shared types.
//!
//! Defines [`ScriptEvaluator`], the trait every engine implements, along with
//! [`EvaluationOutcome`], [`Bindings`], [`BindingValue`] and the per-call
//! [`CancelFlag`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Default wall-clock budget for one evaluation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default operation budget for one evaluation.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000_000;

// Nesting limits track the engine's own defaults. Unoptimized frames are much
// larger, so debug builds must stay shallow to fit a 2 MiB worker stack.
#[cfg(debug_assertions)]
const DEFAULT_MAX_CALL_LEVELS: usize = 8;
#[cfg(debug_assertions)]
const DEFAULT_MAX_EXPR_DEPTH: usize = 32;
#[cfg(debug_assertions)]
const DEFAULT_MAX_FUNCTION_EXPR_DEPTH: usize = 16;

#[cfg(not(debug_assertions))]
const DEFAULT_MAX_CALL_LEVELS: usize = 64;
#[cfg(not(debug_assertions))]
const DEFAULT_MAX_EXPR_DEPTH: usize = 64;
#[cfg(not(debug_assertions))]
const DEFAULT_MAX_FUNCTION_EXPR_DEPTH: usize = 32;

/// Resource limits applied to every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorLimits {
    /// Deadline after which the script is terminated.
    pub timeout: Duration,
    /// Maximum engine operations (`0` = unlimited).
    pub max_operations: u64,
    /// Maximum function call nesting.
    pub max_call_levels: usize,
    /// Maximum expression nesting depth at parse time (top level).
    pub max_expr_depth: usize,
    /// Maximum expression nesting depth at parse time inside function bodies.
    pub max_function_expr_depth: usize,
    /// Maximum length of any string value, in bytes.
    pub max_string_size: usize,
    /// Maximum number of elements in any array.
    pub max_array_size: usize,
    /// Maximum number of entries in any object map.
    pub max_map_size: usize,
}

impl Default for EvaluatorLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_call_levels: DEFAULT_MAX_CALL_LEVELS,
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
            max_function_expr_depth: DEFAULT_MAX_FUNCTION_EXPR_DEPTH,
            max_string_size: 16 * 1024 * 1024,
            max_array_size: 1_000_000,
            max_map_size: 1_000_000,
        }
    }
}

/// Cooperative cancellation signal for one evaluation.
///
/// Cloned into the engine's progress callback; raised by the caller when the
/// request that owns the evaluation goes away.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A value bound by a script, already converted out of the engine's types.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    /// Representable as JSON.
    Data(Value),
    /// No JSON representation (function pointer, timestamp, custom type, ...).
    Opaque {
        /// Engine type name of the offending value.
        type_name: String,
    },
}

/// Name-to-value associations produced by one evaluation.
///
/// Owned by a single request and dropped with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, BindingValue>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: BindingValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&BindingValue> {
        self.0.get(name)
    }

    /// Remove and return the binding for `name`.
    pub fn take(&mut self, name: &str) -> Option<BindingValue> {
        self.0.remove(name)
    }
}

/// Result of running one script.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// The script ran to completion; these are its top-level bindings.
    Completed(Bindings),
    /// The script failed; human-readable description of the failure.
    Failed(String),
}

/// Trait implemented by every script engine backend.
///
/// `evaluate` is synchronous and may run for up to the configured deadline;
/// callers run it on a blocking worker. Implementations must start from an
/// empty namespace, keep nothing after returning, and convert every failure
/// into [`EvaluationOutcome::Failed`] instead of panicking.
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, script: &str, cancel: &CancelFlag) -> EvaluationOutcome;
}
