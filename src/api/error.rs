//! Mapping of crate errors onto HTTP responses.
//!
//! Client errors carry a useful body. Server errors are logged in full and
//! answered with a generic message.

use crate::errors::{Error, SideEffect};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation { errors } => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
            Self::InvalidAmount { .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Amount must be a positive, finite number." }),
            ),
            Self::AlreadyValidated { .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Payment already validated" }),
            ),
            Self::NotValidated { .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Payment is not validated" }),
            ),
            Self::Unauthenticated { reason } => {
                warn!("Rejected request: {reason}");
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "message": "Authentication credentials were not provided or are invalid."
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            Self::Forbidden { reason } => {
                warn!("Forbidden: {reason}");
                (
                    StatusCode::FORBIDDEN,
                    json!({ "message": "You do not have permission to perform this action." }),
                )
            }
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, json!({ "message": self.to_string() })),
            Self::Conflict { message } => (StatusCode::CONFLICT, json!({ "message": message })),
            Self::SideEffectFailed { stage, .. } => {
                error!("{self}");
                let message = match stage {
                    SideEffect::Receipt => "The receipt could not be generated.",
                    SideEffect::Notification => {
                        "Payment validated, but the receipt notification could not be sent."
                    }
                };
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": message }))
            }
            Self::Config { .. } | Self::Crypto(_) | Self::Database(_) | Self::Io(_) => {
                error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "An internal server error occurred." }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
