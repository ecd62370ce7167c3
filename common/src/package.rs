use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ShipmentError;
use crate::money::Money;

/// Service level chosen at booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageType {
    #[default]
    Standard,
    Express,
}

impl PackageType {
    /// Promised door-to-door time, used to stamp `estimatedDelivery`.
    pub fn promised_transit(self) -> Duration {
        match self {
            PackageType::Standard => Duration::days(5),
            PackageType::Express => Duration::days(2),
        }
    }
}

/// One end of a shipment: who sends or receives it and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl Party {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            contact: None,
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// `field` names the party in the error (`"sender"` / `"receiver"`).
    pub fn validate(&self, field: &'static str) -> Result<(), ShipmentError> {
        if self.name.trim().is_empty() {
            return Err(ShipmentError::validation(field, "name must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(ShipmentError::validation(field, "address must not be empty"));
        }
        Ok(())
    }
}

/// What is being shipped and what it cost. `price` is fixed at booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetails {
    /// Kilograms.
    pub weight: f64,
    pub package_type: PackageType,
    #[serde(default)]
    pub description: String,
    pub price: Money,
}

impl PackageDetails {
    pub fn validate(&self) -> Result<(), ShipmentError> {
        validate_weight(self.weight)
    }
}

pub fn validate_weight(weight: f64) -> Result<(), ShipmentError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(ShipmentError::validation(
            "weight",
            format!("must be a positive number of kilograms, got {weight}"),
        ));
    }
    Ok(())
}

/// Price calculation, kept behind a trait so the formula can change without
/// touching booking.
pub trait Tariff: Send + Sync {
    fn quote(&self, weight_kg: f64, package_type: PackageType) -> Money;
}

/// `base + per_kg × weight`, plus a surcharge for express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateTariff {
    pub base: Money,
    pub per_kg: Money,
    pub express_surcharge: Money,
}

impl Default for FlatRateTariff {
    fn default() -> Self {
        Self {
            base: Money::from_dollars(10),
            per_kg: Money::from_dollars(5),
            express_surcharge: Money::from_dollars(20),
        }
    }
}

impl Tariff for FlatRateTariff {
    fn quote(&self, weight_kg: f64, package_type: PackageType) -> Money {
        let weight_cents = (self.per_kg.cents() as f64 * weight_kg.max(0.0)).round() as u64;
        let surcharge = match package_type {
            PackageType::Standard => Money::ZERO,
            PackageType::Express => self.express_surcharge,
        };
        self.base + Money::from_cents(weight_cents) + surcharge
    }
}
