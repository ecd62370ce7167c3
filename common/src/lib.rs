//! Shared domain model for the courier service: shipments, their lifecycle,
//! and the read-side projections built from them.

pub mod dashboard;
pub mod error;
pub mod identity;
pub mod money;
pub mod package;
pub mod shipment;
pub mod status;
pub mod tracking;

pub use error::ShipmentError;
pub use identity::{Identity, Role, UserId};
pub use money::Money;
pub use package::{FlatRateTariff, PackageDetails, PackageType, Party, Tariff};
pub use shipment::{Booking, HistoryEntry, Shipment, TrackingCode, TransitionRequest};
pub use status::ShipmentStatus;
