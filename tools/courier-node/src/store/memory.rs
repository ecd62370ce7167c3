use async_trait::async_trait;
use courier_common::{Shipment, TrackingCode, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{sort_newest_first, Mutator, ShipmentStore};
use crate::error::CourierError;

/// Process-local backend. Writers to the same tracking code are serialized by
/// the map's exclusive entry guard; other codes proceed in parallel.
#[derive(Default)]
pub struct MemoryStore {
    shipments: DashMap<TrackingCode, Shipment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, shipment: Shipment) -> Result<Shipment, CourierError> {
        match self.shipments.entry(shipment.tracking_code.clone()) {
            Entry::Occupied(existing) => Err(CourierError::DuplicateKey {
                tracking_code: existing.key().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(shipment.clone());
                Ok(shipment)
            }
        }
    }

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> Result<Shipment, CourierError> {
        self.shipments
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CourierError::not_found(code))
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Shipment>, CourierError> {
        let mut found: Vec<Shipment> = self
            .shipments
            .iter()
            .filter(|entry| &entry.created_by == owner)
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn find_all(&self) -> Result<Vec<Shipment>, CourierError> {
        let mut all: Vec<Shipment> = self
            .shipments
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut all);
        Ok(all)
    }

    async fn update(&self, code: &TrackingCode, mutate: Mutator) -> Result<Shipment, CourierError> {
        let mut entry = self
            .shipments
            .get_mut(code)
            .ok_or_else(|| CourierError::not_found(code))?;
        // Mutate a copy so a rejected change never touches the stored record.
        let mut draft = entry.value().clone();
        mutate(&mut draft)?;
        *entry.value_mut() = draft.clone();
        Ok(draft)
    }
}
