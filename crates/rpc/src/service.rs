use std::sync::Arc;

use tonic::{Request, Response, Status};

use scriptgate_core::audit::Caller;
use scriptgate_core::gateway::Gateway;

use crate::metadata::MetadataCredentials;
use crate::pb::script_service_server::ScriptService;
use crate::pb::{ScriptRequest, ScriptResponse};
use crate::status::into_status;
use crate::TRANSPORT;

/// `ScriptService` implementation backed by the shared gateway.
#[derive(Debug, Clone)]
pub struct ScriptGatewayService {
    gateway: Arc<Gateway>,
}

impl ScriptGatewayService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[tonic::async_trait]
impl ScriptService for ScriptGatewayService {
    async fn send_code(
        &self,
        request: Request<ScriptRequest>,
    ) -> Result<Response<ScriptResponse>, Status> {
        let caller = Caller::new(request.remote_addr(), TRANSPORT);
        let (metadata, _extensions, message) = request.into_parts();

        let result = self
            .gateway
            .handle(message.script, &MetadataCredentials(&metadata), &caller)
            .await
            .map_err(into_status)?;

        Ok(Response::new(ScriptResponse {
            result: result.to_json_string(),
        }))
    }
}
