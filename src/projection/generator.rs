use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{document_path, write_descriptor, ProjectionError};
use crate::db::{open_snapshot, DocumentRepository};
use crate::frontmatter;
use crate::models::{Category, Document, CATEGORY};

/// What a build-time generation produced, handed back to the site build.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    pub category: Category,
    pub documents: Vec<Document>,
}

/// Full wipe-and-regenerate of the category directory from a database
/// snapshot. Meant to run once per static-site build.
#[derive(Debug, Clone)]
pub struct Generator {
    category_dir: PathBuf,
    category: Category,
}

impl Generator {
    pub fn new(docs_dir: impl AsRef<Path>) -> Self {
        Self {
            category_dir: docs_dir.as_ref().join(CATEGORY.slug),
            category: CATEGORY,
        }
    }

    pub fn category_dir(&self) -> &Path {
        &self.category_dir
    }

    /// Reads every document from the database at `db_path` and regenerates
    /// the category directory.
    ///
    /// A missing, unreadable or empty database yields `Ok(None)` and leaves
    /// the docs directory untouched, so the site still builds without any
    /// database-sourced pages.
    pub async fn generate(
        &self,
        db_path: &Path,
    ) -> Result<Option<GeneratedContent>, ProjectionError> {
        let documents = match load_snapshot(db_path).await {
            Some(docs) if !docs.is_empty() => docs,
            _ => {
                tracing::info!("No documents found in {}", db_path.display());
                return Ok(None);
            }
        };

        self.write_all(&documents)?;

        tracing::info!(
            "Generated {} documents from {} in {}",
            documents.len(),
            db_path.display(),
            self.category_dir.display()
        );

        Ok(Some(GeneratedContent {
            category: self.category,
            documents,
        }))
    }

    /// Replaces the category directory with the descriptor and one file per
    /// document, written unconditionally.
    pub fn write_all(&self, documents: &[Document]) -> Result<(), ProjectionError> {
        let dir = &self.category_dir;

        // Resolve every path up front so a bad slug leaves the old tree in place
        let paths = documents
            .iter()
            .map(|doc| document_path(dir, doc))
            .collect::<Result<Vec<_>, _>>()?;

        match fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ProjectionError::Io(dir.clone(), e)),
        }
        fs::create_dir_all(dir).map_err(|e| ProjectionError::Io(dir.clone(), e))?;

        write_descriptor(dir, &self.category)?;

        for (doc, path) in documents.iter().zip(paths) {
            fs::write(&path, frontmatter::render(doc))
                .map_err(|e| ProjectionError::Io(path, e))?;
        }

        Ok(())
    }
}

/// Loads all documents from a read-only snapshot, or `None` if the database
/// cannot be read.
async fn load_snapshot(db_path: &Path) -> Option<Vec<Document>> {
    if !db_path.exists() {
        return None;
    }

    let pool = match open_snapshot(db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("Failed to open {}: {}", db_path.display(), e);
            return None;
        }
    };

    let repo = DocumentRepository::new(pool.clone());
    let result = repo.list().await;
    pool.close().await;

    match result {
        Ok(docs) => Some(docs),
        Err(e) => {
            tracing::warn!("Failed to read documents from {}: {}", db_path.display(), e);
            None
        }
    }
}
