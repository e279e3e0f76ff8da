//! HTTP surface for the document admin UI.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /api/documents`: All documents, ordered by sidebar position
//! - `GET /api/documents/by-slug/{slug}`: One document by slug
//! - `GET /api/documents/{id}`: One document by id
//! - `POST /api/documents`: Create (201)
//! - `PUT /api/documents/{id}`: Partial update
//! - `DELETE /api/documents/{id}`: Delete
//!
//! Errors are returned as `{"error": "<message>"}`.

mod errors;
mod extract;
mod routes;

pub use routes::{router, AppState};
