use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriptgate_api::config::ServerConfig;
use scriptgate_api::router::build_app_router;
use scriptgate_api::state::AppState;
use scriptgate_core::gateway::Gateway;

#[derive(Debug, thiserror::Error)]
enum ServeError {
    #[error("HTTP server error: {0}")]
    Http(#[from] std::io::Error),

    #[error("gRPC server error: {0}")]
    Grpc(#[from] scriptgate_rpc::server::ServeError),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // SCRIPTGATE_LOG_FORMAT=json switches to one JSON object per line.
    let json_logs = std::env::var("SCRIPTGATE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scriptgate_api=debug,scriptgate_core=info,scriptgate_rpc=info,tower_http=debug"
                    .into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        transport = %config.transport,
        host = %config.host,
        http_port = config.http_port,
        grpc_port = config.grpc_port,
        result_name = %config.gateway.result_name,
        credential_mode = config.gateway.credential.mode(),
        max_workers = config.gateway.max_workers,
        logging_enabled = config.gateway.logging_enabled,
        "Loaded server configuration"
    );

    // --- Gateway ---
    let gateway = Arc::new(Gateway::new(&config.gateway));
    let shutdown = CancellationToken::new();
    let mut servers: JoinSet<Result<(), ServeError>> = JoinSet::new();

    // --- HTTP ---
    if config.transport.serves_http() {
        let listener = bind(config.http_addr(), "HTTP").await;
        let app = build_app_router(AppState::new(Arc::clone(&config), Arc::clone(&gateway)));
        let token = shutdown.clone();
        tracing::info!(addr = %config.http_addr(), "HTTP server listening");

        servers.spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;
            Ok(())
        });
    }

    // --- gRPC ---
    if config.transport.serves_grpc() {
        let listener = bind(config.grpc_addr(), "gRPC").await;
        let gateway = Arc::clone(&gateway);
        let timeout = config.request_timeout();
        let token = shutdown.clone();

        servers.spawn(async move {
            scriptgate_rpc::server::serve(listener, gateway, timeout, token).await?;
            Ok(())
        });
    }

    // --- Run until signalled or a server stops on its own ---
    let mut failed = false;
    tokio::select! {
        () = shutdown_signal() => {}
        Some(joined) = servers.join_next() => {
            failed |= report(joined);
            tracing::warn!("A server stopped unexpectedly, shutting down");
        }
    }

    shutdown.cancel();
    while let Some(joined) = servers.join_next().await {
        failed |= report(joined);
    }

    // Anything still queued for a worker is refused from here on.
    gateway.close();
    tracing::info!("Graceful shutdown complete");

    if failed {
        std::process::exit(1);
    }
}

/// Bind `addr` or exit; nothing is served with a partial listener set.
async fn bind(addr: SocketAddr, label: &str) -> TcpListener {
    match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind {label} listener");
            std::process::exit(1);
        }
    }
}

/// Log a finished server task. Returns `true` if it failed.
fn report(joined: Result<Result<(), ServeError>, tokio::task::JoinError>) -> bool {
    match joined {
        Ok(Ok(())) => false,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Server exited with an error");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Server task panicked");
            true
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
