//! Projection of the document store onto a directory of markdown files.
//!
//! Layout produced under the docs directory:
//! ```text
//! <DOCS_DIR>/
//!   base-de-datos-demo/
//!     _category_.json
//!     <slug>.md
//!     ...
//! ```
//!
//! [`Reconciler`] keeps the directory in sync incrementally while the service
//! runs; [`Generator`] wipes and rebuilds it from a read-only snapshot at
//! build time.

mod generator;
mod reconciler;

pub use generator::{GeneratedContent, Generator};
pub use reconciler::{ReconcileReport, Reconciler};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{is_valid_slug, Category, Document, DESCRIPTOR_FILENAME};

/// Errors that abort a reconciliation or generation pass.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Refusing to write document with unsafe slug: {0:?}")]
    UnsafeSlug(String),

    #[error("Failed to serialize category descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
}

/// Writes `_category_.json` into `dir`.
fn write_descriptor(dir: &Path, category: &Category) -> Result<(), ProjectionError> {
    let path = dir.join(DESCRIPTOR_FILENAME);
    let json = category.descriptor_json()?;
    std::fs::write(&path, json).map_err(|e| ProjectionError::Io(path, e))
}

/// Path of a document's rendered file, rejecting slugs that would escape
/// the category directory.
fn document_path(dir: &Path, doc: &Document) -> Result<PathBuf, ProjectionError> {
    if !is_valid_slug(&doc.slug) {
        return Err(ProjectionError::UnsafeSlug(doc.slug.clone()));
    }
    Ok(dir.join(doc.filename()))
}
