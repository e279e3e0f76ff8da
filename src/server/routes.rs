use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::extract::{ApiJson, ApiPath};
use crate::models::{Document, DocumentPatch, NewDocument};
use crate::service::{DocumentService, ServiceError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<DocumentService>,
}

impl AppState {
    pub fn new(service: DocumentService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Builds the full router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/documents", get(list_documents).post(create_document))
        .route("/api/documents/by-slug/{slug}", get(get_document_by_slug))
        .route(
            "/api/documents/{id}",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document>>, ServiceError> {
    Ok(Json(state.service.list().await?))
}

async fn get_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Document>, ServiceError> {
    Ok(Json(state.service.get(id).await?))
}

async fn get_document_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Document>, ServiceError> {
    Ok(Json(state.service.get_by_slug(&slug).await?))
}

async fn create_document(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewDocument>,
) -> Result<(StatusCode, Json<Document>), ServiceError> {
    let created = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created.value)))
}

async fn update_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<DocumentPatch>,
) -> Result<Json<Document>, ServiceError> {
    let updated = state.service.update(id, patch).await?;
    Ok(Json(updated.value))
}

#[derive(Serialize)]
struct DeleteResponse {
    message: &'static str,
    id: i64,
}

async fn delete_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    let deleted = state.service.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "Document deleted",
        id: deleted.value,
    }))
}
