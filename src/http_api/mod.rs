use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::{
    AmendmentReceipt, AvailabilityReport, BookingReceipt, BookingRequest, CancellationReceipt,
    DaySummary, DeliveryCalendar, EngineError, IntegrityIssue, Ledger, LedgerStore, UnitPool,
};

pub type SharedStore = Arc<dyn LedgerStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    ledger: Arc<RwLock<Ledger>>,
    store: Option<SharedStore>,
}

impl AppState {
    /// State that only lives in memory.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store: None,
        }
    }

    /// State that writes the ledger back to `store` after every mutation.
    pub fn with_store(ledger: Ledger, store: SharedStore) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store: Some(store),
        }
    }

    pub fn ledger(&self) -> Arc<RwLock<Ledger>> {
        self.ledger.clone()
    }

    /// Runs `op` on a copy of the ledger, persists the copy, and only then
    /// swaps it in. The write lock is held throughout, so load-mutate-save
    /// is serialised within this process.
    fn commit<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Ledger) -> Result<T, ApiError>,
    {
        let mut guard = self.ledger.write();
        let mut draft = guard.clone();
        let value = op(&mut draft)?;
        if let Some(store) = &self.store {
            store.save_ledger(&draft).map_err(|err| {
                error!(%err, "failed to persist ledger");
                ApiError::Internal(err.to_string())
            })?;
        }
        *guard = draft;
        Ok(value)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        let message = value.to_string();
        match value {
            EngineError::NotFound { .. } => ApiError::NotFound(message),
            EngineError::PoolExhausted { .. } => ApiError::Conflict(message),
            EngineError::UnknownUnit { .. }
            | EngineError::InvalidReturnDays { .. }
            | EngineError::ReturnDateOutOfRange { .. } => ApiError::Invalid(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "unavailable", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Body returned by every successful mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Committed<T> {
    pub success: bool,
    pub message: String,
    pub receipt: T,
}

impl<T: std::fmt::Display> Committed<T> {
    fn new(receipt: T) -> Self {
        Self {
            success: true,
            message: receipt.to_string(),
            receipt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnitCountPayload {
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ReturnDaysPayload {
    requested_return_days: u32,
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    date: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/units", get(get_units))
        .route("/units/:unit", put(set_unit_count))
        .route("/calendar", get(get_calendar))
        .route("/days", get(get_days))
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", delete(cancel_booking))
        .route("/bookings/:id/return_days", put(amend_booking))
        .route("/availability", get(get_availability))
        .route("/integrity", get(get_integrity))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_units(State(state): State<AppState>) -> Json<UnitPool> {
    let pool = state.ledger().read().pool.clone();
    Json(pool)
}

async fn set_unit_count(
    State(state): State<AppState>,
    Path(unit): Path<String>,
    Json(payload): Json<UnitCountPayload>,
) -> Result<Json<UnitPool>, ApiError> {
    let pool = state.commit(|ledger| {
        ledger.set_unit_count(unit, payload.count);
        Ok(ledger.pool.clone())
    })?;
    Ok(Json(pool))
}

async fn get_calendar(State(state): State<AppState>) -> Json<DeliveryCalendar> {
    let calendar = state.ledger().read().calendar.clone();
    Json(calendar)
}

async fn get_days(State(state): State<AppState>) -> Json<Vec<DaySummary>> {
    let days = state.ledger().read().day_summaries();
    Json(days)
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Committed<BookingReceipt>>), ApiError> {
    let receipt = state.commit(|ledger| Ok(ledger.book(&request)?))?;
    Ok((StatusCode::CREATED, Json(Committed::new(receipt))))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<Json<Committed<CancellationReceipt>>, ApiError> {
    let receipt = state.commit(|ledger| Ok(ledger.cancel(&delivery_id)?))?;
    Ok(Json(Committed::new(receipt)))
}

async fn amend_booking(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
    Json(payload): Json<ReturnDaysPayload>,
) -> Result<Json<Committed<AmendmentReceipt>>, ApiError> {
    let receipt = state
        .commit(|ledger| Ok(ledger.amend(&delivery_id, payload.requested_return_days)?))?;
    Ok(Json(Committed::new(receipt)))
}

async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<AvailabilityReport> {
    let as_of = query.date.unwrap_or_else(|| Local::now().date_naive());
    let report = state.ledger().read().availability(as_of);
    Json(report)
}

async fn get_integrity(State(state): State<AppState>) -> Json<Vec<IntegrityIssue>> {
    let issues = state.ledger().read().check_integrity();
    Json(issues)
}
