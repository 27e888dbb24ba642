#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use scriptgate_api::config::{ServerConfig, Transport};
use scriptgate_api::router::build_app_router;
use scriptgate_api::state::AppState;
use scriptgate_core::auth::CredentialHeaders;
use scriptgate_core::config::GatewayConfig;
use scriptgate_core::credentials::Credential;
use scriptgate_core::gateway::Gateway;
use scriptgate_core::scripting::evaluator::{
    BindingValue, Bindings, CancelFlag, EvaluationOutcome, EvaluatorLimits, ScriptEvaluator,
};

pub const TOKEN: &str = "test-token";

/// Build a test `ServerConfig`: token credential, result name `result`,
/// four workers and a short execution deadline.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".parse().unwrap(),
        http_port: 0,
        grpc_port: 0,
        transport: Transport::Http,
        request_timeout_secs: 30,
        gateway: GatewayConfig {
            credential: Credential::Token(TOKEN.into()),
            credential_headers: CredentialHeaders::default(),
            result_name: "result".into(),
            max_workers: 4,
            logging_enabled: true,
            max_script_bytes: 64 * 1024,
            limits: EvaluatorLimits {
                timeout: Duration::from_secs(2),
                ..EvaluatorLimits::default()
            },
        },
    }
}

/// Build the full application router with all middleware layers, backed by
/// the real evaluator.
pub fn build_test_app() -> Router {
    build_test_app_with_config(test_config())
}

pub fn build_test_app_with_config(config: ServerConfig) -> Router {
    let gateway = Arc::new(Gateway::new(&config.gateway));
    build_app_router(AppState::new(Arc::new(config), gateway))
}

/// Same router, with `evaluator` standing in for the script engine.
pub fn build_test_app_with_evaluator(evaluator: Arc<dyn ScriptEvaluator>) -> Router {
    let config = test_config();
    let gateway = Arc::new(Gateway::with_evaluator(&config.gateway, evaluator));
    build_app_router(AppState::new(Arc::new(config), gateway))
}

/// Counts invocations; every script "binds" `result = 1`.
#[derive(Default)]
pub struct CountingEvaluator {
    calls: AtomicUsize,
}

impl CountingEvaluator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScriptEvaluator for CountingEvaluator {
    fn evaluate(&self, _script: &str, _cancel: &CancelFlag) -> EvaluationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut bindings = Bindings::new();
        bindings.insert("result", BindingValue::Data(serde_json::json!(1)));
        EvaluationOutcome::Completed(bindings)
    }
}

/// In-memory sink for formatted tracing output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's INFO-and-above events here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST a raw body to `/script` with the given headers.
pub async fn post_raw(
    app: Router,
    body: impl Into<Body>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/script");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(body.into()).unwrap())
        .await
        .unwrap()
}

/// POST `{"script": script}` to `/script` with the given credential headers.
pub async fn post_script(app: Router, script: &str, headers: &[(&str, &str)]) -> Response<Body> {
    let body = serde_json::json!({ "script": script }).to_string();
    let mut all = vec![("content-type", "application/json")];
    all.extend_from_slice(headers);
    post_raw(app, body, &all).await
}

/// POST with the valid test token.
pub async fn post_script_authed(app: Router, script: &str) -> Response<Body> {
    post_script(app, script, &[("x-token", TOKEN)]).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
