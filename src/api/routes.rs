use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::balance::BalanceEngine;
use crate::ledger::{LedgerError, LedgerStore};
use crate::models::{
    Counterparty, CounterpartyEntry, Fund, Movement, NewCounterparty, NewFund, NewMovement,
    PeriodReport,
};
use crate::roster::{NewStaffMember, NewStudent, RosterStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub roster: Arc<RosterStore>,
}

/// Create the protected API router (auth middleware is layered on by main)
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/finances/balance/monthly", get(get_monthly_report))
        .route("/api/finances/balance/annual", get(get_annual_report))
        .route(
            "/api/finances/balance/counterparties",
            get(get_counterparty_report),
        )
        .route(
            "/api/finances/movements",
            get(get_movements).post(post_movement),
        )
        .route("/api/finances/movements/:id", delete(delete_movement))
        .route("/api/finances/funds", get(get_funds).post(post_fund))
        .route(
            "/api/finances/counterparties",
            get(get_counterparties).post(post_counterparty),
        )
        .route(
            "/api/finances/counterparties/:id",
            delete(delete_counterparty),
        )
        .route("/api/roster/students", get(get_students).post(post_student))
        .route("/api/roster/staff", get(get_staff).post(post_staff))
        .route("/api/roster/departments", get(get_departments))
        .with_state(state)
}

/// Health check endpoint (mounted unprotected by main)
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ===== Report Handlers =====

#[derive(Deserialize)]
struct MonthlyQuery {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct AnnualQuery {
    year: i32,
}

#[derive(Deserialize)]
struct CounterpartyQuery {
    year: i32,
    month: Option<u32>,
}

/// Balance for one month, with per-fund detail
async fn get_monthly_report(
    State(state): State<AppState>,
    Query(params): Query<MonthlyQuery>,
) -> Result<Json<PeriodReport>, ApiError> {
    let engine = BalanceEngine::new(&state.ledger);
    let report = engine.monthly_report(params.year, params.month).await?;
    Ok(Json(report))
}

/// Balance for a whole year, with per-fund detail
async fn get_annual_report(
    State(state): State<AppState>,
    Query(params): Query<AnnualQuery>,
) -> Result<Json<PeriodReport>, ApiError> {
    let engine = BalanceEngine::new(&state.ledger);
    let report = engine.annual_report(params.year).await?;
    Ok(Json(report))
}

/// Income/expense totals per counterparty active in the window
async fn get_counterparty_report(
    State(state): State<AppState>,
    Query(params): Query<CounterpartyQuery>,
) -> Result<Json<Vec<CounterpartyEntry>>, ApiError> {
    let engine = BalanceEngine::new(&state.ledger);
    let entries = engine
        .counterparty_report(params.year, params.month)
        .await?;
    Ok(Json(entries))
}

// ===== Movement Handlers =====

#[derive(Deserialize)]
struct MovementListQuery {
    limit: Option<usize>,
}

async fn get_movements(
    State(state): State<AppState>,
    Query(params): Query<MovementListQuery>,
) -> Result<Json<Vec<Movement>>, ApiError> {
    let movements = state
        .ledger
        .list_movements(params.limit.unwrap_or(50))
        .await?;
    Ok(Json(movements))
}

async fn post_movement(
    State(state): State<AppState>,
    Json(payload): Json<NewMovement>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.ledger.record(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn delete_movement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.ledger.delete_movement(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Movement {} not found", id)))
    }
}

// ===== Fund / Counterparty Handlers =====

async fn get_funds(State(state): State<AppState>) -> Result<Json<Vec<Fund>>, ApiError> {
    Ok(Json(state.ledger.all_funds().await?))
}

async fn post_fund(
    State(state): State<AppState>,
    Json(payload): Json<NewFund>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.ledger.insert_fund(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_counterparties(
    State(state): State<AppState>,
) -> Result<Json<Vec<Counterparty>>, ApiError> {
    Ok(Json(state.ledger.list_counterparties().await?))
}

async fn post_counterparty(
    State(state): State<AppState>,
    Json(payload): Json<NewCounterparty>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.ledger.insert_counterparty(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn delete_counterparty(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.ledger.delete_counterparty(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Counterparty {} not found", id)))
    }
}

// ===== Roster Handlers =====

async fn get_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::roster::Student>>, ApiError> {
    Ok(Json(state.roster.list_students().await?))
}

async fn post_student(
    State(state): State<AppState>,
    Json(payload): Json<NewStudent>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.roster.insert_student(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_staff(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::roster::StaffMember>>, ApiError> {
    Ok(Json(state.roster.list_staff().await?))
}

async fn post_staff(
    State(state): State<AppState>,
    Json(payload): Json<NewStaffMember>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.roster.insert_staff(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::roster::Department>>, ApiError> {
    Ok(Json(state.roster.list_departments().await?))
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Database(LedgerError),
    NotFound(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => ApiError::Validation(msg),
            e @ LedgerError::DataAccess(_) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let err: ApiError = LedgerError::Validation("month out of range".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_data_access_error_maps_to_internal() {
        let err: ApiError = LedgerError::DataAccess(rusqlite::Error::QueryReturnedNoRows).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_response() {
        let response = ApiError::NotFound("Movement 7 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
