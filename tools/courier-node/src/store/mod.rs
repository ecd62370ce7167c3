//! Keyed shipment storage.
//!
//! Every backend provides the same contract: unique tracking codes, listings
//! newest first, and an `update` that runs the mutator against the current
//! record with at most one writer per tracking code. If the mutator fails the
//! stored record is left exactly as it was.

mod bounded;
mod memory;
mod postgres;

use async_trait::async_trait;
use courier_common::{Shipment, ShipmentError, TrackingCode, UserId};

use crate::error::CourierError;

pub use bounded::TimeoutStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Change applied to a shipment inside the store's per-record critical section.
pub type Mutator = Box<dyn FnOnce(&mut Shipment) -> Result<(), ShipmentError> + Send>;

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Short name used in logs (`memory`, `postgres`).
    fn backend_tag(&self) -> &'static str;

    /// Persist a new shipment. Fails with `DuplicateKey` if the tracking code
    /// is taken.
    async fn create(&self, shipment: Shipment) -> Result<Shipment, CourierError>;

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> Result<Shipment, CourierError>;

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Shipment>, CourierError>;

    async fn find_all(&self) -> Result<Vec<Shipment>, CourierError>;

    /// Atomically read, mutate and write back one shipment.
    async fn update(
        &self,
        code: &TrackingCode,
        mutate: Mutator,
    ) -> Result<Shipment, CourierError>;
}

/// Newest first; equal timestamps fall back to the tracking code so listings
/// are stable.
pub(crate) fn sort_newest_first(shipments: &mut [Shipment]) {
    shipments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.tracking_code.cmp(&a.tracking_code))
    });
}
