//! Read-side projection of a shipment for the public tracking page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::package::{PackageType, Party};
use crate::shipment::{Shipment, TrackingCode};
use crate::status::ShipmentStatus;

/// How a timeline stage renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStage {
    pub status: ShipmentStatus,
    pub state: StageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Snapshot plus timeline, as returned by `track`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub tracking_code: TrackingCode,
    pub status: ShipmentStatus,
    pub current_location: String,
    pub receiver: Party,
    pub package_type: PackageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_proof: Option<String>,
    pub cancelled: bool,
    pub timeline: Vec<TimelineStage>,
}

impl TrackingView {
    /// Map the fixed delivery path onto the shipment's history.
    ///
    /// A stage is `Current` when it is the live status, `Completed` when the
    /// history holds an entry for it, `Pending` otherwise. If a status appears
    /// more than once in the history, the last occurrence supplies the stage's
    /// location and time.
    pub fn from_shipment(shipment: &Shipment) -> Self {
        let timeline = ShipmentStatus::TIMELINE
            .into_iter()
            .map(|stage| {
                let entry = shipment.last_entry_for(stage);
                let state = if stage == shipment.status {
                    StageState::Current
                } else if entry.is_some() {
                    StageState::Completed
                } else {
                    StageState::Pending
                };
                TimelineStage {
                    status: stage,
                    state,
                    location: entry.map(|e| e.location.clone()),
                    timestamp: entry.map(|e| e.timestamp),
                }
            })
            .collect();

        TrackingView {
            tracking_code: shipment.tracking_code.clone(),
            status: shipment.status,
            current_location: shipment.current_location.clone(),
            receiver: shipment.receiver.clone(),
            package_type: shipment.package_details.package_type,
            estimated_delivery: shipment.estimated_delivery,
            delivery_proof: shipment.delivery_proof.clone(),
            cancelled: shipment.status == ShipmentStatus::Cancelled,
            timeline,
        }
    }

    pub fn stage(&self, status: ShipmentStatus) -> Option<&TimelineStage> {
        self.timeline.iter().find(|s| s.status == status)
    }
}
