use crate::config::Config;
use crate::errors::AppError;
use crate::models::LeadResponse;
use crate::services::LeadService;
use crate::validation::{validate_lead_data, validate_lead_patch};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Lead business rules over the configured store.
    pub leads: LeadService,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeadResponse>>, AppError> {
    let leads = state.leads.find_all().await?;
    tracing::debug!("GET /leads - {} lead(s)", leads.len());

    Ok(Json(leads.into_iter().map(LeadResponse::from).collect()))
}

/// GET /api/v1/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LeadResponse>, AppError> {
    let id = lead_id(id)?;
    tracing::info!("GET /leads/{}", id);

    let lead = state.leads.find_by_id(id).await?;
    Ok(Json(lead.into()))
}

/// POST /api/v1/leads
///
/// Validates the body as lead data and creates the lead when its email is
/// not held by another live lead.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<LeadResponse>), AppError> {
    let payload = json_body(body)?;
    let data = validate_lead_data(&payload)?;

    let lead = state.leads.create(data).await?;
    tracing::info!("Lead created: {}", lead.id);

    Ok((StatusCode::CREATED, Json(lead.into())))
}

/// PATCH /api/v1/leads/:id/data
///
/// Fills in missing fields of the stored lead data from the body. Fields the
/// lead already has are left untouched.
pub async fn update_lead_data(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LeadResponse>, AppError> {
    let id = lead_id(id)?;
    let payload = json_body(body)?;
    let patch = validate_lead_patch(&payload)?;

    let lead = state.leads.update_lead_data(id, patch).await?;
    Ok(Json(lead.into()))
}

/// DELETE /api/v1/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = lead_id(id)?;
    state.leads.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn lead_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("Request body over limit: {}", rejection.body_text());
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })
}
