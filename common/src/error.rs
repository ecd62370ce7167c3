use thiserror::Error;

use crate::status::ShipmentStatus;

/// Domain-level rejections raised while booking or transitioning a shipment.
///
/// None of these are retryable: the caller has to change the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShipmentError {
    /// The requested status is not an adjacent successor of the current one.
    #[error("cannot move shipment from '{from}' to '{to}'")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// `Delivered` was requested without a proof-of-delivery reference.
    #[error("a delivery proof is required to mark a shipment as delivered")]
    MissingProof,

    /// Malformed input, e.g. a negative weight or an unknown status name.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl ShipmentError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ShipmentError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for API payloads and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ShipmentError::InvalidTransition { .. } => "invalid_transition",
            ShipmentError::MissingProof => "missing_proof",
            ShipmentError::Validation { .. } => "validation",
        }
    }
}
