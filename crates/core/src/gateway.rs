//! The execution pipeline shared by every transport.
//!
//! Coordinates the four steps of a call:
//! 1. Authenticate against the credential store (no script work on rejection).
//! 2. Wait for a worker permit and evaluate on a blocking thread.
//! 3. Extract the configured result binding.
//! 4. Hand back a typed result or [`GatewayError`] for the transport to translate.
//!
//! Held by both front ends as an `Arc<Gateway>`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::audit::{AuditLogger, Caller};
use crate::auth::{Admission, AuthGate, CredentialSource};
use crate::config::GatewayConfig;
use crate::credentials::CredentialStore;
use crate::error::GatewayError;
use crate::scripting::engine::RhaiEvaluator;
use crate::scripting::evaluator::{CancelFlag, EvaluationOutcome, ScriptEvaluator};
use crate::scripting::extract::extract;

/// The value extracted for the caller; absent when the script never bound it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    value: Option<Value>,
}

impl ExecutionResult {
    pub fn new(value: Option<Value>) -> Self {
        Self { value }
    }

    /// Whether the script bound the result name at all.
    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The value, with absence represented as JSON `null`.
    pub fn into_value(self) -> Value {
        self.value.unwrap_or(Value::Null)
    }

    /// Compact JSON text of the value (`"null"` when absent).
    pub fn to_json_string(&self) -> String {
        self.value.as_ref().unwrap_or(&Value::Null).to_string()
    }
}

/// Raises the cancel flag when the owning request future is dropped.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Authenticates, evaluates and extracts for one call at a time per permit.
pub struct Gateway {
    auth: AuthGate,
    evaluator: Arc<dyn ScriptEvaluator>,
    workers: Arc<Semaphore>,
    audit: AuditLogger,
    result_name: String,
    max_script_bytes: usize,
}

impl Gateway {
    /// Build a gateway backed by the Rhai evaluator.
    pub fn new(config: &GatewayConfig) -> Self {
        let evaluator = Arc::new(RhaiEvaluator::new(config.limits.clone()));
        Self::with_evaluator(config, evaluator)
    }

    /// Build a gateway around an arbitrary evaluator.
    pub fn with_evaluator(config: &GatewayConfig, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self {
            auth: AuthGate::new(
                CredentialStore::new(config.credential.clone()),
                config.credential_headers.clone(),
            ),
            evaluator,
            workers: Arc::new(Semaphore::new(config.max_workers)),
            audit: AuditLogger::new(config.logging_enabled),
            result_name: config.result_name.clone(),
            max_script_bytes: config.max_script_bytes,
        }
    }

    pub fn result_name(&self) -> &str {
        &self.result_name
    }

    /// Number of worker permits currently free.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Stop handing out worker permits; queued and future calls fail with
    /// [`GatewayError::Unavailable`]. Running evaluations finish normally.
    pub fn close(&self) {
        self.workers.close();
    }

    /// Record receipt of a call and run the auth gate.
    pub fn authenticate(
        &self,
        source: &impl CredentialSource,
        caller: &Caller,
    ) -> Result<Admission, GatewayError> {
        self.audit.received(caller);
        self.auth.admit(source).map_err(|reason| {
            self.audit.rejected(caller, reason);
            GatewayError::Unauthorized
        })
    }

    /// Evaluate `script` for an admitted caller and extract the result binding.
    ///
    /// Dropping the returned future cancels the evaluation.
    pub async fn execute(
        &self,
        _admission: Admission,
        script: String,
        caller: &Caller,
    ) -> Result<ExecutionResult, GatewayError> {
        let script_len = script.len();
        let started = Instant::now();

        let result = self.evaluate(script).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(value) => self
                .audit
                .completed(caller, script_len, elapsed_ms, value.is_bound()),
            Err(err) => self.audit.failed(caller, script_len, elapsed_ms, err),
        }
        result
    }

    /// Full pipeline: authenticate, then execute.
    pub async fn handle(
        &self,
        script: String,
        source: &impl CredentialSource,
        caller: &Caller,
    ) -> Result<ExecutionResult, GatewayError> {
        let admission = self.authenticate(source, caller)?;
        self.execute(admission, script, caller).await
    }

    /// End an admitted call whose request could not be read, so it still
    /// records a terminal `failed` event.
    pub fn discard(&self, _admission: Admission, caller: &Caller, reason: &str) {
        self.audit.failed(caller, 0, 0, &reason);
    }

    async fn evaluate(&self, script: String) -> Result<ExecutionResult, GatewayError> {
        if script.len() > self.max_script_bytes {
            return Err(GatewayError::Evaluation(format!(
                "Script exceeds the maximum size of {} bytes",
                self.max_script_bytes
            )));
        }

        // Queue here when every worker is busy.
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::Unavailable)?;

        let cancel = CancelFlag::new();
        let _cancel_guard = CancelOnDrop(cancel.clone());
        let evaluator = Arc::clone(&self.evaluator);

        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            evaluator.evaluate(&script, &cancel)
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Evaluation task failed");
            GatewayError::Internal(e.to_string())
        })?;

        match outcome {
            EvaluationOutcome::Failed(message) => Err(GatewayError::Evaluation(message)),
            EvaluationOutcome::Completed(bindings) => {
                extract(bindings, &self.result_name).map(ExecutionResult::new)
            }
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("result_name", &self.result_name)
            .field("available_workers", &self.available_workers())
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
