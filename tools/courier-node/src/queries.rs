//! Read paths: lookups, the tracking timeline and role dashboards.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use courier_common::dashboard::{self, DashboardView};
use courier_common::tracking::TrackingView;
use courier_common::{Identity, Role, Shipment, TrackingCode, UserId};

use crate::error::CourierError;
use crate::store::ShipmentStore;

pub struct QueryService {
    store: Arc<dyn ShipmentStore>,
    delay_threshold: Duration,
}

impl QueryService {
    pub fn new(store: Arc<dyn ShipmentStore>) -> Self {
        Self {
            store,
            delay_threshold: dashboard::default_delay_threshold(),
        }
    }

    pub fn with_delay_threshold(mut self, threshold: Duration) -> Self {
        self.delay_threshold = threshold;
        self
    }

    /// Public lookup; anyone holding the code may read the shipment.
    pub async fn get_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> Result<Shipment, CourierError> {
        self.store.find_by_tracking_code(code).await
    }

    pub async fn track(&self, code: &TrackingCode) -> Result<TrackingView, CourierError> {
        let shipment = self.store.find_by_tracking_code(code).await?;
        Ok(TrackingView::from_shipment(&shipment))
    }

    /// Shipments booked by `owner`, newest first. Customers may only list
    /// their own.
    pub async fn get_by_owner(
        &self,
        caller: &Identity,
        owner: &UserId,
    ) -> Result<Vec<Shipment>, CourierError> {
        if !caller.can_view_owner(owner) {
            tracing::warn!(user = %caller.user_id, owner = %owner, "owner listing refused");
            return Err(CourierError::Forbidden {
                role: caller.role,
                action: "list another user's shipments",
            });
        }
        self.store.find_by_owner(owner).await
    }

    pub async fn get_all(&self, caller: &Identity) -> Result<Vec<Shipment>, CourierError> {
        if !caller.role.is_privileged() {
            return Err(CourierError::Forbidden {
                role: caller.role,
                action: "list all shipments",
            });
        }
        self.store.find_all().await
    }

    pub async fn dashboard(&self, caller: &Identity) -> Result<DashboardView, CourierError> {
        let shipments = match caller.role {
            Role::Customer => self.store.find_by_owner(&caller.user_id).await?,
            Role::Staff | Role::Admin => self.store.find_all().await?,
        };
        let view = dashboard::for_identity(caller, &shipments, Utc::now(), self.delay_threshold);
        if let DashboardView::Admin(summary) = &view {
            tracing::debug!(
                total = summary.total,
                active = summary.active,
                delayed = summary.delayed,
                revenue = %summary.revenue,
                "admin dashboard computed"
            );
        }
        Ok(view)
    }
}

/// Anything that can produce a caller's dashboard. The poller refreshes from
/// one of these.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn dashboard(&self, caller: &Identity) -> Result<DashboardView, CourierError>;
}

#[async_trait]
impl DashboardSource for QueryService {
    async fn dashboard(&self, caller: &Identity) -> Result<DashboardView, CourierError> {
        QueryService::dashboard(self, caller).await
    }
}
