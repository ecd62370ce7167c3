use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ShipmentError;
use crate::identity::UserId;
use crate::package::{PackageDetails, Party};
use crate::status::ShipmentStatus;

/// Where every shipment starts out.
pub const ORIGIN: &str = "Origin";

/// Externally visible shipment identifier, e.g. `TRK482913`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(pub String);

impl TrackingCode {
    pub const PREFIX: &'static str = "TRK";

    /// Draw a fresh `TRK` + six digit code. Collisions are possible; the store
    /// rejects them and booking draws again.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        TrackingCode(format!("{}{}", Self::PREFIX, rng.gen_range(100_000..1_000_000)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackingCode {
    fn from(s: &str) -> Self {
        TrackingCode(s.trim().to_string())
    }
}

/// One step of a shipment's journey. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: ShipmentStatus,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a customer supplies when booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub sender: Party,
    pub receiver: Party,
    pub package: PackageDetails,
    pub owner: UserId,
}

impl Booking {
    pub fn validate(&self) -> Result<(), ShipmentError> {
        self.sender.validate("sender")?;
        self.receiver.validate("receiver")?;
        self.package.validate()
    }
}

/// A requested move along the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub delivery_proof: Option<String>,
}

impl TransitionRequest {
    pub fn to(status: ShipmentStatus) -> Self {
        Self {
            status,
            location: None,
            delivery_proof: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.delivery_proof = Some(proof.into());
        self
    }
}

/// A courier shipment and its full audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub tracking_code: TrackingCode,
    pub sender: Party,
    pub receiver: Party,
    pub package_details: PackageDetails,
    pub status: ShipmentStatus,
    pub current_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_proof: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl Shipment {
    /// Create a freshly booked shipment with its seed history entry.
    pub fn book(
        booking: Booking,
        tracking_code: TrackingCode,
        now: DateTime<Utc>,
    ) -> Result<Shipment, ShipmentError> {
        booking.validate()?;
        let estimated_delivery = Some(now + booking.package.package_type.promised_transit());
        Ok(Shipment {
            tracking_code,
            sender: booking.sender,
            receiver: booking.receiver,
            package_details: booking.package,
            status: ShipmentStatus::Booked,
            current_location: ORIGIN.to_string(),
            delivery_proof: None,
            history: vec![HistoryEntry {
                status: ShipmentStatus::Booked,
                location: ORIGIN.to_string(),
                timestamp: now,
            }],
            created_by: booking.owner,
            created_at: now,
            estimated_delivery,
        })
    }

    /// Validate `request` against the current state and, only if it is
    /// acceptable, apply it and append exactly one history entry.
    ///
    /// On error `self` is left untouched.
    pub fn apply_transition(
        &mut self,
        request: &TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<HistoryEntry, ShipmentError> {
        let target = request.status;
        if !self.status.can_transition_to(target) {
            return Err(ShipmentError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        let proof = non_blank(request.delivery_proof.as_deref());
        match (target, proof) {
            (ShipmentStatus::Delivered, None) => return Err(ShipmentError::MissingProof),
            (ShipmentStatus::Delivered, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(ShipmentError::validation(
                    "deliveryProof",
                    format!("only accepted when marking a shipment delivered, not '{target}'"),
                ));
            }
        }

        if let Some(location) = non_blank(request.location.as_deref()) {
            self.current_location = location.to_string();
        }
        if let Some(proof) = proof {
            self.delivery_proof = Some(proof.to_string());
        }
        self.status = target;

        // The log must stay ordered even if the wall clock steps backwards.
        let timestamp = self
            .history
            .last()
            .map_or(now, |last| now.max(last.timestamp));
        let entry = HistoryEntry {
            status: target,
            location: self.current_location.clone(),
            timestamp,
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    /// Last history entry recorded for `status`, if the shipment ever had it.
    pub fn last_entry_for(&self, status: ShipmentStatus) -> Option<&HistoryEntry> {
        self.history.iter().rev().find(|entry| entry.status == status)
    }

    /// Not yet delivered and booked more than `threshold` ago. Cancelled
    /// shipments count too. A negative threshold is treated as zero, and a
    /// cutoff before the earliest representable time flags nothing.
    pub fn is_delayed(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        if self.status == ShipmentStatus::Delivered {
            return false;
        }
        now.checked_sub_signed(threshold.max(Duration::zero()))
            .is_some_and(|cutoff| self.created_at < cutoff)
    }

    /// Check the audit-trail invariants. Returns a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let first = self.history.first().ok_or("history is empty")?;
        if first.status != ShipmentStatus::Booked {
            return Err(format!("history starts at '{}', not 'Booked'", first.status));
        }
        let last = self.history.last().ok_or("history is empty")?;
        if last.status != self.status {
            return Err(format!(
                "last history status '{}' differs from current status '{}'",
                last.status, self.status
            ));
        }
        for pair in self.history.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err("history timestamps go backwards".to_string());
            }
            if !pair[0].status.can_transition_to(pair[1].status) {
                return Err(format!(
                    "history contains illegal step '{}' -> '{}'",
                    pair[0].status, pair[1].status
                ));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
