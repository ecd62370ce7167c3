//! Role-specific summaries computed by scanning the shipment collection.
//!
//! Everything here is a pure function of its inputs: callers pass the
//! shipments (newest first, as the store returns them) and the current time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, Role, UserId};
use crate::money::Money;
use crate::package::Party;
use crate::shipment::{Shipment, TrackingCode};
use crate::status::ShipmentStatus;

/// Shipments older than this that are still moving count as delayed.
pub const DEFAULT_DELAY_THRESHOLD_DAYS: i64 = 3;

pub fn default_delay_threshold() -> Duration {
    Duration::days(DEFAULT_DELAY_THRESHOLD_DAYS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub total: usize,
    pub active: usize,
    pub delivered: usize,
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    pub status: ShipmentStatus,
    pub label: String,
}

/// A shipment as it appears on a courier's work list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffJob {
    pub tracking_code: TrackingCode,
    pub status: ShipmentStatus,
    pub sender: Party,
    pub receiver: Party,
    pub current_location: String,
    pub created_at: DateTime<Utc>,
    /// What staff may do next, delivery path first.
    #[serde(default)]
    pub next_actions: Vec<NextAction>,
}

impl StaffJob {
    fn from_shipment(shipment: &Shipment) -> Self {
        StaffJob {
            tracking_code: shipment.tracking_code.clone(),
            status: shipment.status,
            sender: shipment.sender.clone(),
            receiver: shipment.receiver.clone(),
            current_location: shipment.current_location.clone(),
            created_at: shipment.created_at,
            next_actions: shipment
                .status
                .staff_actions()
                .map(|(status, label)| NextAction {
                    status,
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffQueues {
    /// Booked and waiting for a courier to accept.
    pub pickup_queue: Vec<StaffJob>,
    /// Picked up, in transit or out for delivery.
    pub active_jobs: Vec<StaffJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total: usize,
    pub active: usize,
    pub revenue: Money,
    pub delayed: usize,
    pub shipments: Vec<Shipment>,
}

/// The dashboard a given role gets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardView {
    Customer(CustomerSummary),
    Staff(StaffQueues),
    Admin(AdminSummary),
}

impl DashboardView {
    pub fn role(&self) -> Role {
        match self {
            DashboardView::Customer(_) => Role::Customer,
            DashboardView::Staff(_) => Role::Staff,
            DashboardView::Admin(_) => Role::Admin,
        }
    }
}

pub fn customer_summary(owner: &UserId, shipments: &[Shipment]) -> CustomerSummary {
    let own: Vec<Shipment> = shipments
        .iter()
        .filter(|s| &s.created_by == owner)
        .cloned()
        .collect();
    CustomerSummary {
        total: own.len(),
        active: own.iter().filter(|s| s.status.is_active()).count(),
        delivered: own
            .iter()
            .filter(|s| s.status == ShipmentStatus::Delivered)
            .count(),
        shipments: own,
    }
}

fn jobs(shipments: &[Shipment], pred: impl Fn(ShipmentStatus) -> bool) -> Vec<StaffJob> {
    shipments
        .iter()
        .filter(|s| pred(s.status))
        .map(StaffJob::from_shipment)
        .collect()
}

pub fn staff_queues(shipments: &[Shipment]) -> StaffQueues {
    StaffQueues {
        pickup_queue: jobs(shipments, |status| status == ShipmentStatus::Booked),
        active_jobs: jobs(shipments, ShipmentStatus::is_active),
    }
}

pub fn total_revenue(shipments: &[Shipment]) -> Money {
    shipments.iter().map(|s| s.package_details.price).sum()
}

pub fn admin_summary(
    shipments: &[Shipment],
    now: DateTime<Utc>,
    delay_threshold: Duration,
) -> AdminSummary {
    AdminSummary {
        total: shipments.len(),
        active: shipments.iter().filter(|s| s.status.is_active()).count(),
        revenue: total_revenue(shipments),
        delayed: shipments
            .iter()
            .filter(|s| s.is_delayed(now, delay_threshold))
            .count(),
        shipments: shipments.to_vec(),
    }
}

/// Pick and compute the view for `identity`'s role.
pub fn for_identity(
    identity: &Identity,
    shipments: &[Shipment],
    now: DateTime<Utc>,
    delay_threshold: Duration,
) -> DashboardView {
    match identity.role {
        Role::Customer => DashboardView::Customer(customer_summary(&identity.user_id, shipments)),
        Role::Staff => DashboardView::Staff(staff_queues(shipments)),
        Role::Admin => DashboardView::Admin(admin_summary(shipments, now, delay_threshold)),
    }
}
