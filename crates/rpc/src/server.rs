//! gRPC listener lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use scriptgate_core::gateway::Gateway;

use crate::pb::script_service_server::ScriptServiceServer;
use crate::ScriptGatewayService;

pub use tonic::transport::Error as ServeError;

/// Serve `ScriptService` on `listener` until `shutdown` is cancelled.
///
/// Calls still running after `request_timeout` are dropped, which cancels
/// their evaluation. In-flight calls are drained on shutdown.
pub async fn serve(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    request_timeout: Duration,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gRPC server listening");
    }

    Server::builder()
        .timeout(request_timeout)
        .add_service(ScriptServiceServer::new(ScriptGatewayService::new(gateway)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.cancelled().await;
            tracing::info!("gRPC server shutting down");
        })
        .await
}
