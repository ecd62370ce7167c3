#![cfg(feature = "postgres-tests")]

//! The same guarantees against a real PostgreSQL backend. Needs
//! `DATABASE_URL` pointing at a scratch database; the table is truncated.
//! Run one at a time: `cargo test --features postgres-tests -- --test-threads=1`.

use std::sync::Arc;

use courier_common::{Shipment, ShipmentStatus};
use courier_node::config::ServiceConfig;
use courier_node::store::{PostgresStore, ShipmentStore};
use courier_node_integration::harness::TestHarness;
use courier_node_integration::{error_of, spawn_node_with, status_body};

async fn postgres_harness() -> TestHarness {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    let store = PostgresStore::connect(&url).await.expect("connect to PostgreSQL");
    store.truncate().await.expect("truncate shipments");
    let store: Arc<dyn ShipmentStore> = Arc::new(store);
    TestHarness::on(spawn_node_with(store, ServiceConfig::default()).await)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lifecycle_round_trips_through_postgres() {
    let h = postgres_harness().await;
    assert_eq!(h.health().await["backend"], "postgres");

    let booked = h.alice.book_parcel("Rob", 19.99).await;
    let fetched: Shipment = h.lookup(booked.tracking_code.as_str()).await.json().await.unwrap();
    assert_eq!(fetched.tracking_code, booked.tracking_code);
    assert_eq!(fetched.package_details.price, booked.package_details.price);

    let code = booked.tracking_code;
    h.sam.advance(&code, ShipmentStatus::PickedUp, Some("Depot"), None).await;
    let resp = h
        .sam
        .update_status(&code, &status_body("Delivered", None, Some("sig")))
        .await;
    assert_eq!(error_of(resp).await, (409, "invalid_transition".to_string()));

    let stored: Shipment = h.lookup(code.as_str()).await.json().await.unwrap();
    assert_eq!(stored.history.len(), 2);
    assert_eq!(stored.current_location, "Depot");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn row_lock_serializes_racing_updates() {
    let h = postgres_harness().await;
    let code = h.alice.book_parcel("Rob", 5.0).await.tracking_code;

    let pickup = status_body("Picked Up", None, None);
    let cancel = status_body("Cancelled", None, None);
    let (a, b) = tokio::join!(
        h.sam.update_status(&code, &pickup),
        h.root.update_status(&code, &cancel),
    );
    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409]);

    let stored: Shipment = h.lookup(code.as_str()).await.json().await.unwrap();
    assert_eq!(stored.history.len(), 2);
    stored.check_invariants().unwrap();
}

#[tokio::test]
async fn listings_are_newest_first() {
    let h = postgres_harness().await;
    h.alice.book_parcel("First", 1.0).await;
    h.alice.book_parcel("Second", 1.0).await;

    let own: Vec<Shipment> = h.alice.list_user("alice").await.json().await.unwrap();
    assert_eq!(own.len(), 2);
    assert_eq!(own[0].receiver.name, "Second");
}
