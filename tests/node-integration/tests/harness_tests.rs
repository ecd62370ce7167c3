//! Role-scoped listings and dashboards through the harness participants.

use std::sync::Arc;
use std::time::Duration;

use courier_common::dashboard::DashboardView;
use courier_common::{Money, Shipment, ShipmentStatus};
use courier_node::config::ServiceConfig;
use courier_node::poller::{DashboardPoller, Session};
use courier_node::queries::QueryService;
use courier_node::store::{MemoryStore, ShipmentStore};
use courier_node_integration::harness::TestHarness;
use courier_node_integration::{error_of, spawn_node_with};

#[tokio::test]
async fn customers_list_only_their_own_shipments() {
    let h = TestHarness::setup().await;
    let first = h.alice.book_parcel("Rob", 10.0).await;
    let second = h.alice.book_parcel("Ria", 10.0).await;
    h.bob.book_parcel("Sue", 10.0).await;

    let resp = h.alice.list_user("alice").await;
    assert_eq!(resp.status().as_u16(), 200);
    let own: Vec<Shipment> = resp.json().await.unwrap();
    let codes: Vec<_> = own.iter().map(|s| s.tracking_code.clone()).collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.contains(&first.tracking_code));
    assert!(codes.contains(&second.tracking_code));
    assert!(own[0].created_at >= own[1].created_at, "newest first");

    let resp = h.alice.list_user("bob").await;
    assert_eq!(error_of(resp).await, (403, "forbidden".to_string()));

    let resp = h.sam.list_user("bob").await;
    let bobs: Vec<Shipment> = resp.json().await.unwrap();
    assert_eq!(bobs.len(), 1);
}

#[tokio::test]
async fn only_staff_and_admin_see_everything() {
    let h = TestHarness::setup().await;
    h.alice.book_parcel("Rob", 10.0).await;
    h.bob.book_parcel("Sue", 10.0).await;

    let resp = h.alice.list_all().await;
    assert_eq!(error_of(resp).await, (403, "forbidden".to_string()));

    for participant in [&h.sam, &h.root] {
        let all: Vec<Shipment> = participant.list_all().await.json().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}

#[tokio::test]
async fn customers_cannot_move_shipments() {
    let h = TestHarness::setup().await;
    let code = h.alice.book_parcel("Rob", 10.0).await.tracking_code;

    let resp = h
        .alice
        .update_status(&code, &serde_json::json!({ "status": "Cancelled" }))
        .await;
    assert_eq!(error_of(resp).await, (403, "forbidden".to_string()));
}

#[tokio::test]
async fn requests_without_identity_are_refused() {
    let h = TestHarness::setup().await;
    let resp = reqwest::Client::new()
        .get(h.node.url("/api/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(error_of(resp).await, (401, "unauthenticated".to_string()));
}

#[tokio::test]
async fn dashboards_match_role() {
    let h = TestHarness::setup().await;
    h.alice.book_parcel("Rob", 10.00).await;
    h.alice.book_parcel("Ria", 25.50).await;
    let moving = h.bob.book_parcel("Sue", 0.00).await.tracking_code;
    h.sam.advance(&moving, ShipmentStatus::PickedUp, Some("Depot"), None).await;

    match h.alice.dashboard().await {
        DashboardView::Customer(summary) => {
            assert_eq!(summary.total, 2);
            assert_eq!(summary.active, 0);
            assert_eq!(summary.delivered, 0);
        }
        other => panic!("expected customer dashboard, got {other:?}"),
    }

    match h.sam.dashboard().await {
        DashboardView::Staff(queues) => {
            assert_eq!(queues.pickup_queue.len(), 2);
            assert_eq!(queues.active_jobs.len(), 1);
            assert_eq!(queues.active_jobs[0].tracking_code, moving);
            let labels: Vec<_> = queues.pickup_queue[0]
                .next_actions
                .iter()
                .map(|a| a.label.as_str())
                .collect();
            assert_eq!(labels, ["Accept Pickup", "Reject"]);
        }
        other => panic!("expected staff dashboard, got {other:?}"),
    }

    match h.root.dashboard().await {
        DashboardView::Admin(summary) => {
            assert_eq!(summary.total, 3);
            assert_eq!(summary.active, 1);
            assert_eq!(summary.revenue, Money::from_cents(3550));
            assert_eq!(summary.delayed, 0);
        }
        other => panic!("expected admin dashboard, got {other:?}"),
    }
}

#[tokio::test]
async fn poller_follows_bookings_made_over_http() {
    let store: Arc<dyn ShipmentStore> = Arc::new(MemoryStore::new());
    let h = TestHarness::on(spawn_node_with(store.clone(), ServiceConfig::default()).await);

    let queries = Arc::new(QueryService::new(store));
    let mut poller = DashboardPoller::new(queries, Session::new(h.root.identity.clone()))
        .with_interval(Duration::from_millis(25));
    let mut rx = poller.subscribe();
    poller.start();

    h.alice.book_parcel("Rob", 7.25).await;

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| matches!(&s.view, Some(DashboardView::Admin(a)) if a.total == 1)),
    )
    .await
    .expect("poller should see the booking")
    .expect("poller alive")
    .clone();
    assert!(!snapshot.degraded);

    poller.stop().await;
    assert!(!poller.is_running());
}
