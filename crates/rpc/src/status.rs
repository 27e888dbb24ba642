//! Gateway error → gRPC status translation.
//!
//! | Error            | Code                | Message                     |
//! |------------------|---------------------|-----------------------------|
//! | `Unauthorized`   | `PERMISSION_DENIED` | fixed, no detail            |
//! | `Evaluation`     | `INTERNAL`          | evaluation failure text     |
//! | `Serialization`  | `INTERNAL`          | conversion failure text     |
//! | `Unavailable`    | `UNAVAILABLE`       | fixed                       |
//! | `Internal`       | `INTERNAL`          | sanitized                   |

use tonic::Status;

use scriptgate_core::error::{GatewayError, INVALID_CREDENTIALS};

pub fn into_status(err: GatewayError) -> Status {
    match err {
        GatewayError::Unauthorized => Status::permission_denied(INVALID_CREDENTIALS),
        GatewayError::Evaluation(message) | GatewayError::Serialization(message) => {
            Status::internal(message)
        }
        GatewayError::Unavailable => Status::unavailable(GatewayError::Unavailable.to_string()),
        GatewayError::Internal(detail) => {
            tracing::error!(error = %detail, "Internal gateway error");
            Status::internal("An internal error occurred")
        }
    }
}
