use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::*;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service banner
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.app.name.clone(),
        version: state.app.version.clone(),
        status: "running".to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        application: ApplicationInfo {
            name: state.app.name.clone(),
            version: state.app.version.clone(),
            status: "running".to_string(),
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub application: ApplicationInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        crate::metrics::gather_metrics(),
    )
}

/// Create an incident
pub async fn create_incident(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateIncident>, JsonRejection>,
) -> Result<(StatusCode, Json<Incident>)> {
    let Json(input) = payload?;

    let created = state.service().await?.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct ListIncidentsQuery {
    pub status: Option<IncidentStatus>,
}

/// List incidents, optionally filtered by status
pub async fn list_incidents(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListIncidentsQuery>, QueryRejection>,
) -> Result<Json<Vec<Incident>>> {
    let Query(query) = query?;
    let service = state.service().await?;

    let incidents = match query.status {
        Some(status) => service.list_by_status(status).await?,
        None => service.list_all().await?,
    };

    Ok(Json(incidents))
}

/// Get an incident by ID
pub async fn get_incident(
    State(state): State<AppState>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Incident>> {
    let Path(id) = id?;

    let incident = state.service().await?.get_by_id(id).await?;
    Ok(Json(incident))
}

/// Move an incident to a new status
pub async fn update_status(
    State(state): State<AppState>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Incident>> {
    let Path(id) = id?;
    let Json(update) = payload?;

    let incident = state
        .service()
        .await?
        .update_status(id, update.status)
        .await?;
    Ok(Json(incident))
}

/// Rewrite an incident's description
pub async fn update_description(
    State(state): State<AppState>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<DescriptionUpdate>, JsonRejection>,
) -> Result<Json<Incident>> {
    let Path(id) = id?;
    let Json(update) = payload?;

    let incident = state
        .service()
        .await?
        .update_description(id, update.new_description)
        .await?;
    Ok(Json(incident))
}

/// Delete a resolved or cancelled incident
pub async fn delete_incident(
    State(state): State<AppState>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteResponse>> {
    let Path(id) = id?;

    if !state.service().await?.delete(id).await? {
        return Err(AppError::Internal("Failed to delete incident".to_string()));
    }

    Ok(Json(DeleteResponse {
        detail: "Incident deleted successfully".to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub detail: String,
}
