//! Booking and status transitions: the only code paths that write shipments.

use std::sync::Arc;

use chrono::Utc;
use courier_common::{
    Booking, Identity, Money, PackageDetails, PackageType, Party, Shipment, ShipmentError,
    ShipmentStatus, Tariff, TrackingCode, TransitionRequest,
};
use serde::Deserialize;

use crate::error::CourierError;
use crate::store::ShipmentStore;

pub const DEFAULT_BOOKING_ATTEMPTS: u32 = 5;

type CodeSource = Box<dyn Fn() -> TrackingCode + Send + Sync>;

/// Body of a booking request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub sender: Party,
    pub receiver: Party,
    pub package_details: PackageRequest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRequest {
    pub weight: f64,
    #[serde(default)]
    pub package_type: PackageType,
    #[serde(default)]
    pub description: String,
    /// Quoted by the tariff when absent.
    #[serde(default)]
    pub price: Option<Money>,
}

/// Body of a status update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub delivery_proof: Option<String>,
}

impl StatusUpdateRequest {
    pub fn parse(self) -> Result<TransitionRequest, ShipmentError> {
        Ok(TransitionRequest {
            status: self.status.parse::<ShipmentStatus>()?,
            location: self.location,
            delivery_proof: self.delivery_proof,
        })
    }
}

pub struct StatusEngine {
    store: Arc<dyn ShipmentStore>,
    tariff: Arc<dyn Tariff>,
    booking_attempts: u32,
    codes: CodeSource,
}

impl StatusEngine {
    pub fn new(store: Arc<dyn ShipmentStore>, tariff: Arc<dyn Tariff>) -> Self {
        Self {
            store,
            tariff,
            booking_attempts: DEFAULT_BOOKING_ATTEMPTS,
            codes: Box::new(|| TrackingCode::generate(&mut rand::thread_rng())),
        }
    }

    pub fn with_booking_attempts(mut self, attempts: u32) -> Self {
        self.booking_attempts = attempts.max(1);
        self
    }

    /// Replace the random tracking-code generator.
    pub fn with_code_source(
        mut self,
        codes: impl Fn() -> TrackingCode + Send + Sync + 'static,
    ) -> Self {
        self.codes = Box::new(codes);
        self
    }

    /// Book a shipment owned by `caller`.
    ///
    /// A tracking-code collision draws a fresh code, up to the configured
    /// number of attempts; after that the `DuplicateKey` is returned.
    pub async fn create_shipment(
        &self,
        caller: &Identity,
        request: BookingRequest,
    ) -> Result<Shipment, CourierError> {
        let package = request.package_details;
        let price = package
            .price
            .unwrap_or_else(|| self.tariff.quote(package.weight, package.package_type));
        let booking = Booking {
            sender: request.sender,
            receiver: request.receiver,
            package: PackageDetails {
                weight: package.weight,
                package_type: package.package_type,
                description: package.description,
                price,
            },
            owner: caller.user_id.clone(),
        };
        booking.validate()?;

        let now = Utc::now();
        let mut attempt = 1;
        loop {
            let shipment = Shipment::book(booking.clone(), (self.codes)(), now)?;
            match self.store.create(shipment).await {
                Ok(created) => {
                    tracing::info!(
                        tracking_code = %created.tracking_code,
                        owner = %created.created_by,
                        package_type = ?created.package_details.package_type,
                        price = %created.package_details.price,
                        "shipment booked"
                    );
                    return Ok(created);
                }
                Err(CourierError::DuplicateKey { tracking_code })
                    if attempt < self.booking_attempts =>
                {
                    tracing::warn!(
                        %tracking_code,
                        attempt,
                        "tracking code collision, drawing another"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "booking failed");
                    return Err(e);
                }
            }
        }
    }

    /// Move a shipment along its lifecycle. Staff and admins only.
    pub async fn update_status(
        &self,
        caller: &Identity,
        code: &TrackingCode,
        request: TransitionRequest,
    ) -> Result<Shipment, CourierError> {
        if !caller.role.is_privileged() {
            tracing::warn!(
                tracking_code = %code,
                user = %caller.user_id,
                role = %caller.role,
                "status update refused"
            );
            return Err(CourierError::Forbidden {
                role: caller.role,
                action: "update shipment status",
            });
        }

        let to = request.status;
        let now = Utc::now();
        let result = self
            .store
            .update(
                code,
                Box::new(move |shipment: &mut Shipment| {
                    shipment.apply_transition(&request, now).map(|_| ())
                }),
            )
            .await;

        match &result {
            Ok(shipment) => tracing::info!(
                tracking_code = %code,
                to = %to,
                location = %shipment.current_location,
                by = %caller.user_id,
                "status updated"
            ),
            Err(CourierError::Rejected(e)) => tracing::warn!(
                tracking_code = %code,
                to = %to,
                reason = %e,
                "status update rejected"
            ),
            Err(e) => tracing::warn!(
                tracking_code = %code,
                to = %to,
                error = %e,
                "status update failed"
            ),
        }
        result
    }
}
