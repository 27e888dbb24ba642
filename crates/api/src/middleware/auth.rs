//! Credential extractor for the script endpoint.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use scriptgate_core::audit::Caller;
use scriptgate_core::auth::{Admission, CredentialSource};

use crate::error::AppError;
use crate::state::AppState;

/// Transport tag recorded in audit lines.
pub const TRANSPORT: &str = "http";

/// Exposes request headers to the auth gate. Header names are matched
/// case-insensitively; non-visible-ASCII values read as absent.
#[derive(Debug, Clone, Copy)]
pub struct HeaderCredentials<'a>(pub &'a HeaderMap);

impl CredentialSource for HeaderCredentials<'_> {
    fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }
}

/// A caller that passed the auth gate.
///
/// Extracting this runs authentication before the request body is read, so a
/// rejected caller never reaches the evaluator:
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, caller: AdmittedCaller) -> AppResult<Json<Value>> {
///     let result = state.gateway.execute(caller.admission, script, &caller.caller).await?;
///     Ok(Json(result.into_value()))
/// }
/// ```
#[derive(Debug)]
pub struct AdmittedCaller {
    pub admission: Admission,
    pub caller: Caller,
}

impl FromRequestParts<AppState> for AdmittedCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Absent when the router is driven without a socket (tests).
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let caller = Caller::new(peer, TRANSPORT);

        let admission = state
            .gateway
            .authenticate(&HeaderCredentials(&parts.headers), &caller)?;

        Ok(AdmittedCaller { admission, caller })
    }
}
