use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShipmentError;

/// Lifecycle stage of a shipment.
///
/// Serialized with the human-readable names the API has always used
/// (`"Picked Up"`, `"Out for Delivery"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Booked,
    #[serde(rename = "Picked Up")]
    PickedUp,
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    /// The delivery path shown on the tracking timeline. `Cancelled` is an
    /// exit, not a stage.
    pub const TIMELINE: [ShipmentStatus; 5] = [
        ShipmentStatus::Booked,
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ];

    pub const ALL: [ShipmentStatus; 6] = [
        ShipmentStatus::Booked,
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Booked => "Booked",
            ShipmentStatus::PickedUp => "Picked Up",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn successors(self) -> &'static [ShipmentStatus] {
        match self {
            ShipmentStatus::Booked => &[ShipmentStatus::PickedUp, ShipmentStatus::Cancelled],
            ShipmentStatus::PickedUp => &[ShipmentStatus::InTransit],
            ShipmentStatus::InTransit => &[ShipmentStatus::OutForDelivery],
            ShipmentStatus::OutForDelivery => &[ShipmentStatus::Delivered],
            ShipmentStatus::Delivered | ShipmentStatus::Cancelled => &[],
        }
    }

    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        matches!(
            (self, next),
            (ShipmentStatus::Booked, ShipmentStatus::PickedUp)
                | (ShipmentStatus::Booked, ShipmentStatus::Cancelled)
                | (ShipmentStatus::PickedUp, ShipmentStatus::InTransit)
                | (ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery)
                | (ShipmentStatus::OutForDelivery, ShipmentStatus::Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Picked up but not yet delivered.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ShipmentStatus::PickedUp | ShipmentStatus::InTransit | ShipmentStatus::OutForDelivery
        )
    }

    /// Buttons offered to staff for a shipment in this status, one per
    /// permitted successor, delivery path first. A booked shipment can be
    /// accepted for pickup or rejected.
    pub fn staff_actions(self) -> impl Iterator<Item = (ShipmentStatus, &'static str)> {
        self.successors().iter().map(|&to| (to, to.action_label()))
    }

    fn action_label(self) -> &'static str {
        match self {
            ShipmentStatus::Booked => "Book",
            ShipmentStatus::PickedUp => "Accept Pickup",
            ShipmentStatus::InTransit => "Start Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Complete",
            ShipmentStatus::Cancelled => "Reject",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = ShipmentError;

    /// Accepts the display names, ignoring case, surrounding whitespace and
    /// `-`/`_` separators (`"out_for_delivery"` parses).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        ShipmentStatus::ALL
            .into_iter()
            .find(|status| normalize(status.as_str()) == wanted)
            .ok_or_else(|| ShipmentError::validation("status", format!("unknown status '{s}'")))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
