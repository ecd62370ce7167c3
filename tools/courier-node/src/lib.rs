//! Courier shipment tracking service: storage backends, the status engine,
//! read-side queries, the dashboard poller and the HTTP API.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod poller;
pub mod queries;
pub mod store;

pub use api::{router, AppState};
pub use error::CourierError;
