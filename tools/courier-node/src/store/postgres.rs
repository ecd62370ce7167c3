use async_trait::async_trait;
use courier_common::{Shipment, TrackingCode, UserId};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::types::Json;
use tokio_postgres::{NoTls, Row};

use super::{Mutator, ShipmentStore};
use crate::error::CourierError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS shipments (
    tracking_code TEXT PRIMARY KEY,
    created_by    TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL,
    document      JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS shipments_owner_created_idx
    ON shipments (created_by, created_at DESC);
";

/// PostgreSQL backend. Each shipment is one row holding the full document as
/// JSONB; `update` takes a row lock for the duration of the mutation.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self, CourierError> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(CourierError::transient)?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        client
            .batch_execute(SCHEMA)
            .await
            .map_err(CourierError::transient)?;
        Ok(())
    }

    /// Remove every row. Test fixtures only; the service never deletes.
    pub async fn truncate(&self) -> Result<(), CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        client
            .batch_execute("TRUNCATE shipments")
            .await
            .map_err(CourierError::transient)?;
        Ok(())
    }
}

fn decode(row: &Row) -> Result<Shipment, CourierError> {
    let Json(shipment) = row
        .try_get::<_, Json<Shipment>>("document")
        .map_err(|e| CourierError::transient(format!("undecodable shipment row: {e}")))?;
    Ok(shipment)
}

#[async_trait]
impl ShipmentStore for PostgresStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, shipment: Shipment) -> Result<Shipment, CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        let inserted = client
            .execute(
                "INSERT INTO shipments (tracking_code, created_by, created_at, document)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (tracking_code) DO NOTHING",
                &[
                    &shipment.tracking_code.as_str(),
                    &shipment.created_by.0,
                    &shipment.created_at,
                    &Json(&shipment),
                ],
            )
            .await
            .map_err(CourierError::transient)?;
        if inserted == 0 {
            return Err(CourierError::DuplicateKey {
                tracking_code: shipment.tracking_code,
            });
        }
        Ok(shipment)
    }

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> Result<Shipment, CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        let row = client
            .query_opt(
                "SELECT document FROM shipments WHERE tracking_code = $1",
                &[&code.as_str()],
            )
            .await
            .map_err(CourierError::transient)?
            .ok_or_else(|| CourierError::not_found(code))?;
        decode(&row)
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Shipment>, CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        let rows = client
            .query(
                "SELECT document FROM shipments WHERE created_by = $1
                 ORDER BY created_at DESC, tracking_code DESC",
                &[&owner.0],
            )
            .await
            .map_err(CourierError::transient)?;
        rows.iter().map(decode).collect()
    }

    async fn find_all(&self) -> Result<Vec<Shipment>, CourierError> {
        let client = self.pool.get().await.map_err(CourierError::transient)?;
        let rows = client
            .query(
                "SELECT document FROM shipments ORDER BY created_at DESC, tracking_code DESC",
                &[],
            )
            .await
            .map_err(CourierError::transient)?;
        rows.iter().map(decode).collect()
    }

    async fn update(&self, code: &TrackingCode, mutate: Mutator) -> Result<Shipment, CourierError> {
        let mut client = self.pool.get().await.map_err(CourierError::transient)?;
        let tx = client.transaction().await.map_err(CourierError::transient)?;

        // Dropping `tx` on any early return rolls back and releases the lock.
        let row = tx
            .query_opt(
                "SELECT document FROM shipments WHERE tracking_code = $1 FOR UPDATE",
                &[&code.as_str()],
            )
            .await
            .map_err(CourierError::transient)?
            .ok_or_else(|| CourierError::not_found(code))?;
        let mut shipment = decode(&row)?;
        mutate(&mut shipment)?;

        tx.execute(
            "UPDATE shipments SET document = $2 WHERE tracking_code = $1",
            &[&code.as_str(), &Json(&shipment)],
        )
        .await
        .map_err(CourierError::transient)?;
        tx.commit().await.map_err(CourierError::transient)?;
        Ok(shipment)
    }
}
