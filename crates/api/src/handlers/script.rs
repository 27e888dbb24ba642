//! Script execution over HTTP.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AdmittedCaller;
use crate::state::AppState;

/// Request body for `POST /script`.
#[derive(Debug, Deserialize)]
pub struct ScriptRequest {
    /// Source text to evaluate.
    pub script: String,
}

/// POST /script
///
/// Authenticates from headers, evaluates the body's script, and returns the
/// configured result binding as JSON (`null` when the script never bound it).
pub async fn execute_script(
    State(state): State<AppState>,
    admitted: AdmittedCaller,
    body: Result<Json<ScriptRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => {
            let message = rejection.body_text();
            state
                .gateway
                .discard(admitted.admission, &admitted.caller, &message);
            return Err(AppError::BadRequest(message));
        }
    };

    let result = state
        .gateway
        .execute(admitted.admission, input.script, &admitted.caller)
        .await?;

    Ok(Json(result.into_value()))
}
