use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use courier_node::config::ServiceConfig;
use courier_node::store::{MemoryStore, ShipmentStore};
use courier_node::{router, AppState};


/// A courier node serving on an ephemeral localhost port for the lifetime of
/// the value.
pub struct TestNode {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestNode {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Boot the HTTP API over an in-memory store.
pub async fn spawn_node() -> TestNode {
    spawn_node_with(Arc::new(MemoryStore::new()), ServiceConfig::default()).await
}

/// Boot the HTTP API over an arbitrary store.
pub async fn spawn_node_with(store: Arc<dyn ShipmentStore>, config: ServiceConfig) -> TestNode {
    tracing_subscriber::fmt::try_init().ok();

    let app = router(AppState::new(store, &config));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("test node stopped: {e}");
        }
    });
    tracing::debug!("test node listening on {addr}");
    TestNode { addr, task }
}

/// Booking body with a caller-supplied price.
pub fn make_dummy_booking(receiver: &str, weight: f64, package_type: &str, price: f64) -> Value {
    json!({
        "sender": { "name": "Alice Sender", "address": "1 High St", "contact": "555-0100" },
        "receiver": { "name": receiver, "address": "9 Low Rd" },
        "packageDetails": {
            "weight": weight,
            "packageType": package_type,
            "description": format!("Parcel for {receiver}"),
            "price": price,
        }
    })
}

/// Booking body without a price, so the service quotes one.
pub fn make_unpriced_booking(receiver: &str, weight: f64, package_type: &str) -> Value {
    let mut body = make_dummy_booking(receiver, weight, package_type, 0.0);
    if let Some(details) = body["packageDetails"].as_object_mut() {
        details.remove("price");
    }
    body
}

/// Status update body.
pub fn status_body(status: &str, location: Option<&str>, proof: Option<&str>) -> Value {
    let mut body = json!({ "status": status });
    if let Some(location) = location {
        body["location"] = json!(location);
    }
    if let Some(proof) = proof {
        body["deliveryProof"] = json!(proof);
    }
    body
}

/// Read an error response as `(status, kind)`.
pub async fn error_of(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("error body is JSON");
    let kind = body["kind"].as_str().unwrap_or_default().to_string();
    (status, kind)
}
