pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Script execution routes.
///
/// ```text
/// POST /script    evaluate a script (credential headers required)
/// ```
pub fn script_routes() -> Router<AppState> {
    Router::new().route("/script", post(handlers::script::execute_script))
}
