use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_common::{Shipment, TrackingCode, UserId};
use tokio::time::timeout;

use super::{Mutator, ShipmentStore};
use crate::error::CourierError;

/// Puts a deadline on every call to the wrapped backend. A call that runs
/// past it is dropped and reported as `TransientStoreFailure`.
///
/// For `create` and `update` a timeout means the outcome is unknown: the
/// backend may have committed just before the deadline fired. Callers that
/// retry should re-read the shipment first, since replaying a transition that
/// already landed is rejected as `InvalidTransition`.
pub struct TimeoutStore {
    inner: Arc<dyn ShipmentStore>,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn ShipmentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CourierError>
    where
        F: Future<Output = Result<T, CourierError>> + Send,
    {
        match timeout(self.limit, fut).await {
            Ok(result) => {
                if let Err(e) = &result {
                    if e.is_retryable() {
                        tracing::error!(
                            backend = self.inner.backend_tag(),
                            op,
                            error = %e,
                            "store operation failed"
                        );
                    }
                }
                result
            }
            Err(_) => {
                tracing::error!(
                    backend = self.inner.backend_tag(),
                    op,
                    limit_ms = self.limit.as_millis() as u64,
                    "store operation timed out"
                );
                let outcome = if writes(op) { "; it may still have been applied" } else { "" };
                Err(CourierError::transient(format!(
                    "{op} timed out after {}ms{outcome}",
                    self.limit.as_millis()
                )))
            }
        }
    }
}

fn writes(op: &str) -> bool {
    matches!(op, "create" | "update")
}

#[async_trait]
impl ShipmentStore for TimeoutStore {
    fn backend_tag(&self) -> &'static str {
        self.inner.backend_tag()
    }

    async fn create(&self, shipment: Shipment) -> Result<Shipment, CourierError> {
        self.bounded("create", self.inner.create(shipment)).await
    }

    async fn find_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> Result<Shipment, CourierError> {
        self.bounded("find_by_tracking_code", self.inner.find_by_tracking_code(code))
            .await
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Shipment>, CourierError> {
        self.bounded("find_by_owner", self.inner.find_by_owner(owner)).await
    }

    async fn find_all(&self) -> Result<Vec<Shipment>, CourierError> {
        self.bounded("find_all", self.inner.find_all()).await
    }

    async fn update(
        &self,
        code: &TrackingCode,
        mutate: Mutator,
    ) -> Result<Shipment, CourierError> {
        self.bounded("update", self.inner.update(code, mutate)).await
    }
}
