//! HTTP surface. JSON in and out, camelCase field names.
//!
//! Callers identify themselves with the `x-user-id` and `x-user-role` headers,
//! which an upstream auth layer sets after verifying the session. Tracking
//! lookups and the health check are public.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use courier_common::dashboard::DashboardView;
use courier_common::tracking::TrackingView;
use courier_common::{FlatRateTariff, Identity, Role, Shipment, ShipmentError, TrackingCode, UserId};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServiceConfig;
use crate::engine::{BookingRequest, StatusEngine, StatusUpdateRequest};
use crate::error::CourierError;
use crate::queries::QueryService;
use crate::store::{ShipmentStore, TimeoutStore};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StatusEngine>,
    pub queries: Arc<QueryService>,
    backend: &'static str,
}

impl AppState {
    /// Wire the services over `store`, bounding every store call by the
    /// configured timeout.
    pub fn new(store: Arc<dyn ShipmentStore>, config: &ServiceConfig) -> Self {
        let backend = store.backend_tag();
        let store: Arc<dyn ShipmentStore> =
            Arc::new(TimeoutStore::new(store, config.store_timeout));
        let engine = StatusEngine::new(store.clone(), Arc::new(FlatRateTariff::default()))
            .with_booking_attempts(config.booking_attempts);
        let queries = QueryService::new(store).with_delay_threshold(config.delay_threshold);
        Self {
            engine: Arc::new(engine),
            queries: Arc::new(queries),
            backend,
        }
    }
}

/// The authenticated caller, taken from the identity headers.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = CourierError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER).ok_or_else(|| CourierError::Unauthenticated {
            reason: format!("missing {USER_ID_HEADER} header"),
        })?;
        let role = header(parts, USER_ROLE_HEADER)
            .ok_or_else(|| CourierError::Unauthenticated {
                reason: format!("missing {USER_ROLE_HEADER} header"),
            })?
            .parse::<Role>()
            .map_err(|e| CourierError::Unauthenticated {
                reason: e.to_string(),
            })?;
        Ok(Caller(Identity::new(user_id, role)))
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, CourierError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ShipmentError::validation("body", rejection.body_text()).into())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    backend: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Courier tracking service is running",
        backend: state.backend,
    })
}

async fn create_shipment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Shipment>), CourierError> {
    let request = body(payload)?;
    let shipment = state.engine.create_shipment(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn get_by_tracking_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Shipment>, CourierError> {
    let shipment = state
        .queries
        .get_by_tracking_code(&TrackingCode::from(code.as_str()))
        .await?;
    Ok(Json(shipment))
}

async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TrackingView>, CourierError> {
    let view = state.queries.track(&TrackingCode::from(code.as_str())).await?;
    Ok(Json(view))
}

async fn get_by_owner(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Shipment>>, CourierError> {
    let shipments = state
        .queries
        .get_by_owner(&caller, &UserId(user_id))
        .await?;
    Ok(Json(shipments))
}

async fn get_all(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Shipment>>, CourierError> {
    Ok(Json(state.queries.get_all(&caller).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(code): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Shipment>, CourierError> {
    let request = body(payload)?.parse()?;
    let shipment = state
        .engine
        .update_status(&caller, &TrackingCode::from(code.as_str()), request)
        .await?;
    Ok(Json(shipment))
}

async fn dashboard(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<DashboardView>, CourierError> {
    Ok(Json(state.queries.dashboard(&caller).await?))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/shipments", post(create_shipment).get(get_all))
        .route("/api/shipments/track/{code}", get(get_by_tracking_code))
        .route("/api/shipments/track/{code}/timeline", get(track))
        .route("/api/shipments/user/{user_id}", get(get_by_owner))
        .route("/api/shipments/{code}/status", put(update_status))
        .route("/api/dashboard", get(dashboard))
        .layer(cors)
        .with_state(state)
}
