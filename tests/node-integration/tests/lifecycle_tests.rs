//! A shipment's life over HTTP, from booking to proof of delivery.

use courier_common::tracking::StageState;
use courier_common::{Money, Shipment, ShipmentStatus};
use courier_node_integration::harness::TestHarness;
use courier_node_integration::{error_of, make_dummy_booking, make_unpriced_booking, status_body};

#[tokio::test]
async fn health_reports_ok() {
    let h = TestHarness::setup().await;
    let health = h.health().await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["backend"], "memory");
}

#[tokio::test]
async fn booking_then_lookup_starts_at_origin() {
    let h = TestHarness::setup().await;
    let booked = h.alice.book_parcel("Rob", 12.5).await;

    let resp = h.lookup(booked.tracking_code.as_str()).await;
    assert_eq!(resp.status().as_u16(), 200);
    let fetched: Shipment = resp.json().await.unwrap();

    assert_eq!(fetched.status, ShipmentStatus::Booked);
    assert_eq!(fetched.history.len(), 1);
    assert_eq!(fetched.current_location, "Origin");
    assert_eq!(fetched.created_by.0, "alice");
    assert_eq!(fetched.package_details.price, Money::from_cents(1250));
    assert!(fetched.estimated_delivery.is_some());
}

#[tokio::test]
async fn booking_response_uses_camel_case() {
    let h = TestHarness::setup().await;
    let resp = h
        .alice
        .book(&make_dummy_booking("Rob", 2.0, "Express", 40.0))
        .await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();

    let code = body["trackingCode"].as_str().unwrap();
    assert!(code.starts_with("TRK") && code.len() == 9);
    assert_eq!(body["status"], "Booked");
    assert_eq!(body["currentLocation"], "Origin");
    assert_eq!(body["packageDetails"]["packageType"], "Express");
    assert_eq!(body["history"][0]["status"], "Booked");
}

#[tokio::test]
async fn unpriced_booking_is_quoted() {
    let h = TestHarness::setup().await;
    let resp = h.bob.book(&make_unpriced_booking("Rob", 3.0, "Express")).await;
    assert_eq!(resp.status().as_u16(), 201);
    let shipment: Shipment = resp.json().await.unwrap();
    // 10 base + 5 per kg + 20 express
    assert_eq!(shipment.package_details.price, Money::from_dollars(45));
}

#[tokio::test]
async fn malformed_bookings_are_rejected() {
    let h = TestHarness::setup().await;

    let resp = h
        .alice
        .book(&make_dummy_booking("Rob", -1.0, "Standard", 10.0))
        .await;
    assert_eq!(error_of(resp).await, (400, "validation".to_string()));

    let resp = h
        .alice
        .book(&make_dummy_booking("Rob", 1.0, "Standard", -5.0))
        .await;
    assert_eq!(error_of(resp).await, (400, "validation".to_string()));

    let resp = h.alice.book(&serde_json::json!({ "sender": "nobody" })).await;
    assert_eq!(error_of(resp).await, (400, "validation".to_string()));
}

#[tokio::test]
async fn full_delivery_path_and_timeline() {
    let h = TestHarness::setup().await;
    let code = h.alice.book_parcel("Rob", 20.0).await.tracking_code;

    h.sam
        .advance(&code, ShipmentStatus::PickedUp, Some("Depot North"), None)
        .await;
    let view = h.timeline(&code).await;
    assert_eq!(view.stage(ShipmentStatus::Booked).unwrap().state, StageState::Completed);
    assert_eq!(view.stage(ShipmentStatus::PickedUp).unwrap().state, StageState::Current);
    assert_eq!(view.stage(ShipmentStatus::InTransit).unwrap().state, StageState::Pending);

    h.sam.advance(&code, ShipmentStatus::InTransit, None, None).await;
    h.root
        .advance(&code, ShipmentStatus::OutForDelivery, Some("Van 12"), None)
        .await;
    let delivered = h
        .sam
        .advance(
            &code,
            ShipmentStatus::Delivered,
            Some("Front porch"),
            Some("https://proofs.example/TRK.jpg"),
        )
        .await;

    assert_eq!(delivered.status, ShipmentStatus::Delivered);
    assert_eq!(delivered.history.len(), 5);
    assert_eq!(delivered.history[2].location, "Depot North");
    assert_eq!(
        delivered.delivery_proof.as_deref(),
        Some("https://proofs.example/TRK.jpg")
    );
    delivered.check_invariants().unwrap();

    let view = h.timeline(&code).await;
    assert!(view
        .timeline
        .iter()
        .take(4)
        .all(|stage| stage.state == StageState::Completed));
    assert_eq!(view.stage(ShipmentStatus::Delivered).unwrap().state, StageState::Current);
    assert_eq!(
        view.stage(ShipmentStatus::Delivered).unwrap().location.as_deref(),
        Some("Front porch")
    );
}

#[tokio::test]
async fn illegal_moves_leave_shipment_untouched() {
    let h = TestHarness::setup().await;
    let booked = h.alice.book_parcel("Rob", 10.0).await;
    let code = &booked.tracking_code;

    let resp = h
        .sam
        .update_status(code, &status_body("Delivered", None, Some("sig")))
        .await;
    assert_eq!(error_of(resp).await, (409, "invalid_transition".to_string()));

    let resp = h
        .sam
        .update_status(code, &status_body("Teleported", None, None))
        .await;
    assert_eq!(error_of(resp).await, (400, "validation".to_string()));

    let resp = h
        .sam
        .update_status(code, &status_body("Picked Up", None, Some("too early")))
        .await;
    assert_eq!(error_of(resp).await, (400, "validation".to_string()));

    let current: Shipment = h.lookup(code.as_str()).await.json().await.unwrap();
    assert_eq!(current, booked);
}

#[tokio::test]
async fn delivery_requires_proof() {
    let h = TestHarness::setup().await;
    let code = h.alice.book_parcel("Rob", 10.0).await.tracking_code;
    for status in [
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
    ] {
        h.sam.advance(&code, status, None, None).await;
    }

    let resp = h
        .sam
        .update_status(&code, &status_body("Delivered", Some("Door"), None))
        .await;
    assert_eq!(error_of(resp).await, (400, "missing_proof".to_string()));

    let current: Shipment = h.lookup(code.as_str()).await.json().await.unwrap();
    assert_eq!(current.status, ShipmentStatus::OutForDelivery);
    assert_eq!(current.history.len(), 4);
}

#[tokio::test]
async fn cancelled_shipment_is_terminal() {
    let h = TestHarness::setup().await;
    let code = h.alice.book_parcel("Rob", 10.0).await.tracking_code;

    h.root.advance(&code, ShipmentStatus::Cancelled, None, None).await;
    let resp = h
        .sam
        .update_status(&code, &status_body("Picked Up", None, None))
        .await;
    assert_eq!(error_of(resp).await, (409, "invalid_transition".to_string()));

    let view = h.timeline(&code).await;
    assert!(view.cancelled);
    assert_eq!(view.stage(ShipmentStatus::Booked).unwrap().state, StageState::Completed);
    assert!(view.timeline[1..]
        .iter()
        .all(|stage| stage.state == StageState::Pending));
}

#[tokio::test]
async fn unknown_codes_are_not_found() {
    let h = TestHarness::setup().await;

    let resp = h.lookup("TRK000000").await;
    assert_eq!(error_of(resp).await, (404, "not_found".to_string()));

    let resp = h
        .sam
        .update_status(&"TRK000000".into(), &status_body("Picked Up", None, None))
        .await;
    assert_eq!(error_of(resp).await, (404, "not_found".to_string()));
}
