//! Rhai-backed evaluator.
//!
//! Every call builds its own [`Engine`] and [`Scope`], so nothing a script
//! binds can leak into another call. The engine carries only Rhai's standard
//! packages (no filesystem, network or process access); `eval` and module
//! imports are disabled, and `print` / `debug` go to the tracing log.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde_json::{Map, Number, Value};

use super::evaluator::{
    BindingValue, Bindings, CancelFlag, EvaluationOutcome, EvaluatorLimits, ScriptEvaluator,
};

/// Number of engine operations between wall-clock checks.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Evaluator running scripts in a fresh, capability-restricted Rhai engine.
#[derive(Debug, Clone, Default)]
pub struct RhaiEvaluator {
    limits: EvaluatorLimits,
}

impl RhaiEvaluator {
    pub fn new(limits: EvaluatorLimits) -> Self {
        Self { limits }
    }

    fn build_engine(&self, cancel: &CancelFlag, started: Instant) -> Engine {
        let limits = &self.limits;
        let mut engine = Engine::new();

        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.on_print(|text| tracing::debug!(target: "scriptgate::script", text, "print"));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(
                target: "scriptgate::script",
                text,
                source = source.unwrap_or_default(),
                position = %pos,
                "debug"
            );
        });

        let cancel = cancel.clone();
        let deadline = started + limits.timeout;
        engine.on_progress(move |ops| {
            if cancel.is_cancelled() {
                return Some(Dynamic::UNIT);
            }
            if ops % CLOCK_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Some(Dynamic::UNIT);
            }
            None
        });

        engine
    }

    fn run(&self, script: &str, cancel: &CancelFlag) -> EvaluationOutcome {
        let started = Instant::now();
        let engine = self.build_engine(cancel, started);
        let mut scope = Scope::new();

        match engine.run_with_scope(&mut scope, script) {
            Ok(()) => EvaluationOutcome::Completed(collect_bindings(&scope)),
            Err(err) => EvaluationOutcome::Failed(self.describe_failure(&err, cancel, started)),
        }
    }

    fn describe_failure(&self, err: &EvalAltResult, cancel: &CancelFlag, started: Instant) -> String {
        match err {
            EvalAltResult::ErrorTerminated(..) if cancel.is_cancelled() => {
                "Script execution cancelled".to_string()
            }
            EvalAltResult::ErrorTerminated(..) => format!(
                "Script timed out after {}ms",
                started.elapsed().as_millis()
            ),
            other => other.to_string(),
        }
    }
}

impl ScriptEvaluator for RhaiEvaluator {
    fn evaluate(&self, script: &str, cancel: &CancelFlag) -> EvaluationOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(script, cancel))) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!("Script engine panicked during evaluation");
                EvaluationOutcome::Failed("Script evaluation aborted unexpectedly".to_string())
            }
        }
    }
}

/// Convert every top-level binding in `scope`; later declarations shadow earlier ones.
fn collect_bindings(scope: &Scope<'_>) -> Bindings {
    let mut bindings = Bindings::new();
    for (name, _is_constant, value) in scope.iter() {
        bindings.insert(name, to_binding(&value));
    }
    bindings
}

fn to_binding(value: &Dynamic) -> BindingValue {
    match to_json(value) {
        Ok(json) => BindingValue::Data(json),
        Err(type_name) => BindingValue::Opaque { type_name },
    }
}

/// Convert a Rhai value to JSON, or return the type name of the first
/// value (possibly nested) that has no JSON form.
fn to_json(value: &Dynamic) -> Result<Value, String> {
    let value = value.flatten_clone();

    if value.is_unit() {
        return Ok(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(Value::from(i));
    }
    if let Ok(f) = value.as_float() {
        return Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("non-finite float ({f})"));
    }
    if let Ok(c) = value.as_char() {
        return Ok(Value::String(c.to_string()));
    }
    if value.is_string() {
        return value
            .into_string()
            .map(Value::String)
            .map_err(str::to_string);
    }
    if value.is_blob() {
        let blob = value.into_blob().map_err(str::to_string)?;
        return Ok(Value::Array(blob.into_iter().map(Value::from).collect()));
    }
    if value.is_array() {
        let array = value.into_array().map_err(str::to_string)?;
        return array
            .iter()
            .map(to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    if value.is_map() {
        let type_name = value.type_name().to_string();
        let map = value.try_cast::<rhai::Map>().ok_or(type_name)?;
        let mut object = Map::with_capacity(map.len());
        for (key, item) in &map {
            object.insert(key.to_string(), to_json(item)?);
        }
        return Ok(Value::Object(object));
    }

    Err(value.type_name().to_string())
}
