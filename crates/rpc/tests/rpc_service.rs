//! End-to-end tests against a real gRPC server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use scriptgate_core::auth::CredentialHeaders;
use scriptgate_core::config::GatewayConfig;
use scriptgate_core::credentials::Credential;
use scriptgate_core::gateway::Gateway;
use scriptgate_core::scripting::evaluator::EvaluatorLimits;
use scriptgate_rpc::pb::script_service_client::ScriptServiceClient;
use scriptgate_rpc::pb::ScriptRequest;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::{Code, Request};

const TOKEN: &str = "test-token";

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl TestServer {
    async fn start(credential: Credential) -> Self {
        let config = GatewayConfig {
            credential,
            credential_headers: CredentialHeaders::default(),
            result_name: "result".into(),
            max_workers: 4,
            logging_enabled: true,
            max_script_bytes: 64 * 1024,
            limits: EvaluatorLimits {
                timeout: Duration::from_secs(2),
                ..EvaluatorLimits::default()
            },
        };
        let gateway = Arc::new(Gateway::new(&config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scriptgate_rpc::server::serve(
            listener,
            gateway,
            Duration::from_secs(30),
            shutdown.clone(),
        ));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn client(&self) -> ScriptServiceClient<Channel> {
        ScriptServiceClient::connect(format!("http://{}", self.addr))
            .await
            .unwrap()
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

fn request(script: &str, metadata: &[(&'static str, &str)]) -> Request<ScriptRequest> {
    let mut request = Request::new(ScriptRequest {
        script: script.to_string(),
    });
    for (key, value) in metadata {
        request
            .metadata_mut()
            .insert(*key, value.parse().unwrap());
    }
    request
}

// ---------------------------------------------------------------------------
// Token mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_token_returns_result() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let response = client
        .send_code(request("let result = 2 + 2;", &[("x-token", TOKEN)]))
        .await
        .unwrap();
    assert_eq!(response.into_inner().result, "4");

    server.stop().await;
}

#[tokio::test]
async fn structured_result_is_json_text() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let response = client
        .send_code(request(
            r#"let result = #{ name: "x", items: [1, 2] };"#,
            &[("x-token", TOKEN)],
        ))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&response.into_inner().result).unwrap();
    assert_eq!(value, serde_json::json!({ "name": "x", "items": [1, 2] }));

    server.stop().await;
}

#[tokio::test]
async fn wrong_token_is_permission_denied() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let status = client
        .send_code(request("let result = 1;", &[("x-token", "nope")]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(status.message(), "Invalid credentials");

    server.stop().await;
}

#[tokio::test]
async fn missing_token_is_permission_denied() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let status = client
        .send_code(request("let result = 1;", &[]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);

    server.stop().await;
}

#[tokio::test]
async fn thrown_error_is_internal_with_message() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let status = client
        .send_code(request(r#"throw "bad";"#, &[("x-token", TOKEN)]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("bad"), "{}", status.message());

    server.stop().await;
}

#[tokio::test]
async fn unbound_result_is_null() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let mut client = server.client().await;

    let response = client
        .send_code(request("let x = 1;", &[("x-token", TOKEN)]))
        .await
        .unwrap();
    assert_eq!(response.into_inner().result, "null");

    server.stop().await;
}

#[tokio::test]
async fn concurrent_calls_get_their_own_results() {
    let server = TestServer::start(Credential::Token(TOKEN.into())).await;
    let client = server.client().await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..50 {
        let mut client = client.clone();
        tasks.spawn(async move {
            let script = format!("let n = {i}; let result = n * 10;");
            let response = client
                .send_code(request(&script, &[("x-token", TOKEN)]))
                .await
                .unwrap();
            (i, response.into_inner().result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, result) = joined.unwrap();
        assert_eq!(result, (i * 10).to_string());
    }

    server.stop().await;
}

// ---------------------------------------------------------------------------
// Username/password mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn username_password_pair_is_accepted() {
    let server = TestServer::start(Credential::UsernamePassword {
        username: "admin".into(),
        password: "hunter2".into(),
    })
    .await;
    let mut client = server.client().await;

    let response = client
        .send_code(request(
            r#"let result = "ok";"#,
            &[("x-username", "admin"), ("x-password", "hunter2")],
        ))
        .await
        .unwrap();
    assert_eq!(response.into_inner().result, "\"ok\"");

    let status = client
        .send_code(request(
            r#"let result = "ok";"#,
            &[("x-username", "admin"), ("x-password", "wrong")],
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);

    server.stop().await;
}
