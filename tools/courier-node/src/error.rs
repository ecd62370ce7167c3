use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_common::{Role, ShipmentError, ShipmentStatus, TrackingCode};
use serde::Serialize;

/// Everything the service layer can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    #[error("shipment '{tracking_code}' not found")]
    NotFound { tracking_code: TrackingCode },

    #[error("tracking code '{tracking_code}' is already in use")]
    DuplicateKey { tracking_code: TrackingCode },

    /// The request itself is unacceptable; retrying it unchanged will fail again.
    #[error(transparent)]
    Rejected(#[from] ShipmentError),

    /// The store did not answer in time or is unreachable. Safe to retry.
    #[error("shipment store unavailable: {reason}")]
    TransientStoreFailure { reason: String },

    #[error("missing or malformed caller identity: {reason}")]
    Unauthenticated { reason: String },

    #[error("a {role} may not {action}")]
    Forbidden { role: Role, action: &'static str },
}

impl CourierError {
    pub fn not_found(tracking_code: &TrackingCode) -> Self {
        CourierError::NotFound {
            tracking_code: tracking_code.clone(),
        }
    }

    pub fn transient(reason: impl fmt::Display) -> Self {
        CourierError::TransientStoreFailure {
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CourierError::NotFound { .. } => "not_found",
            CourierError::DuplicateKey { .. } => "duplicate_key",
            CourierError::Rejected(e) => e.kind(),
            CourierError::TransientStoreFailure { .. } => "transient_store_failure",
            CourierError::Unauthenticated { .. } => "unauthenticated",
            CourierError::Forbidden { .. } => "forbidden",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CourierError::TransientStoreFailure { .. })
    }

    /// The transition that was refused, if this is an invalid-transition error.
    pub fn invalid_transition(&self) -> Option<(ShipmentStatus, ShipmentStatus)> {
        match self {
            CourierError::Rejected(ShipmentError::InvalidTransition { from, to }) => {
                Some((*from, *to))
            }
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CourierError::NotFound { .. } => StatusCode::NOT_FOUND,
            CourierError::DuplicateKey { .. } => StatusCode::CONFLICT,
            CourierError::Rejected(ShipmentError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            CourierError::Rejected(_) => StatusCode::BAD_REQUEST,
            CourierError::TransientStoreFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CourierError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            CourierError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    retryable: bool,
}

impl IntoResponse for CourierError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
            retryable: self.is_retryable(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
