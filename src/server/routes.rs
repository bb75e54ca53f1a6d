use crate::core::booking::{ConfirmationPayload, DepositPayload};
use crate::domain::model::AvailabilityQuery;
use crate::server::state::AppState;
use crate::utils::error::BookingError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// API Response wrapper for simple status payloads
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub days: Option<u32>,
    pub service: Option<String>,
}

#[derive(Serialize)]
struct DepositInfo {
    amount: i64,
    currency: String,
    display: String,
}

#[derive(Serialize)]
struct SquareInfo {
    application_id: Option<String>,
    location_id: String,
    environment: &'static str,
}

#[derive(Serialize)]
struct Features {
    payments: bool,
    availability: bool,
    email: bool,
}

#[derive(Serialize)]
struct PublicConfig {
    site_name: String,
    timezone: String,
    deposit: Option<DepositInfo>,
    square: Option<SquareInfo>,
    features: Features,
}

fn rejection_to_error(rejection: JsonRejection) -> BookingError {
    BookingError::validation(rejection.body_text())
}

fn query_rejection_to_error(rejection: QueryRejection) -> BookingError {
    BookingError::validation(rejection.body_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Landing page
pub async fn landing(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.landing_html.as_str().to_owned())
}

/// GET /api/health - Health check
pub async fn health() -> impl IntoResponse {
    Json(StatusResponse { status: "ok" })
}

/// GET /api/services - Catalog grouped by category
pub async fn services(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.as_ref().clone())
}

/// GET /api/config - Settings the browser needs to render the booking form
pub async fn public_config(State(state): State<AppState>) -> impl IntoResponse {
    let deposit = state.engine.deposit().map(|money| DepositInfo {
        amount: money.amount,
        currency: money.currency.clone(),
        display: money.to_string(),
    });

    let square = state
        .config
        .payments()
        .filter(|_| state.engine.payments_enabled())
        .map(|payments| SquareInfo {
            application_id: payments.application_id.clone(),
            location_id: payments.location_id.clone(),
            environment: if payments.base_url().contains("sandbox") {
                "sandbox"
            } else {
                "production"
            },
        });

    Json(PublicConfig {
        site_name: state.config.site.name.clone(),
        timezone: state.timezone.name().to_string(),
        deposit,
        square,
        features: Features {
            payments: state.engine.payments_enabled(),
            availability: state.availability.is_some(),
            email: state.engine.email_enabled(),
        },
    })
}

/// GET /api/availability?days=N&service=NAME
pub async fn availability(
    State(state): State<AppState>,
    params: Result<Query<AvailabilityParams>, QueryRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Query(params) = params.map_err(query_rejection_to_error)?;
    let source = state
        .availability
        .as_ref()
        .ok_or(BookingError::FeatureDisabled {
            feature: "availability",
        })?;

    let service = params.service.filter(|s| !s.trim().is_empty());
    let query = AvailabilityQuery::new(params.days.unwrap_or(14), service, Utc::now());
    let days = source.availability(&query).await?;

    Ok(Json(serde_json::json!({
        "timezone": state.timezone.name(),
        "days": days,
    })))
}

/// POST /api/payments - Charge the booking deposit
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<DepositPayload>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Json(payload) = payload.map_err(rejection_to_error)?;
    let outcome = state.engine.book_deposit(payload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/confirmation - Send a confirmation email on its own
pub async fn send_confirmation(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmationPayload>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Json(payload) = payload.map_err(rejection_to_error)?;
    let outcome = state.engine.send_confirmation(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}
