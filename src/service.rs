//! Document CRUD with post-commit regeneration of the docs directory.
//!
//! Every mutation is two-phase: the store write is authoritative and its
//! outcome is what the caller gets back as `Ok`/`Err`; the reconciliation
//! pass that follows is advisory and only reported through
//! [`ProjectionStatus`].

use thiserror::Error;

use crate::db::{is_unique_violation, DocumentRepository};
use crate::models::{is_valid_slug, Document, DocumentPatch, NewDocument, DEFAULT_CATEGORY};
use crate::projection::{ProjectionError, ReconcileReport, Reconciler};

/// Errors reported to callers of [`DocumentService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The slug is already taken by another document.
    #[error("A document with slug '{0}' already exists")]
    Conflict(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    /// Only returned by [`DocumentService::reconcile`]; mutations never fail
    /// because of the projection.
    #[error("Failed to regenerate docs: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Database error: {0}")]
    Internal(#[source] sqlx::Error),
}

/// State of the docs directory after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionStatus {
    Refreshed(ReconcileReport),
    /// The pass failed; files stay stale until the next successful pass.
    Stale(String),
}

impl ProjectionStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, ProjectionStatus::Stale(_))
    }
}

/// A committed mutation plus what happened to the projection afterwards.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub value: T,
    pub projection: ProjectionStatus,
}

#[derive(Debug, Clone)]
pub struct DocumentService {
    repo: DocumentRepository,
    reconciler: Reconciler,
}

impl DocumentService {
    pub fn new(repo: DocumentRepository, reconciler: Reconciler) -> Self {
        Self { repo, reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub async fn list(&self) -> Result<Vec<Document>, ServiceError> {
        self.repo.list().await.map_err(ServiceError::Internal)
    }

    pub async fn get(&self, id: i64) -> Result<Document, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Document, ServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or_else(|| ServiceError::NotFound(slug.to_string()))
    }

    pub async fn create(&self, input: NewDocument) -> Result<Mutation<Document>, ServiceError> {
        let doc = validate_new(input)?;

        let created = self
            .repo
            .create(&doc)
            .await
            .map_err(|e| write_error(e, &doc.slug, None))?;
        tracing::info!("Created document {} ({})", created.id, created.slug);

        let projection = self.refresh().await;
        Ok(Mutation {
            value: created,
            projection,
        })
    }

    pub async fn update(
        &self,
        id: i64,
        patch: DocumentPatch,
    ) -> Result<Mutation<Document>, ServiceError> {
        validate_patch(&patch)?;

        let mut doc = self.get(id).await?;
        patch.apply_to(&mut doc);
        doc.title = doc.title.trim().to_string();
        doc.slug = doc.slug.trim().to_string();

        let updated = self
            .repo
            .update(&doc)
            .await
            .map_err(|e| write_error(e, &doc.slug, Some(id)))?;
        tracing::info!("Updated document {} ({})", updated.id, updated.slug);

        let projection = self.refresh().await;
        Ok(Mutation {
            value: updated,
            projection,
        })
    }

    /// Deletes a document and returns its id. A missing id leaves both the
    /// store and the docs directory untouched.
    pub async fn delete(&self, id: i64) -> Result<Mutation<i64>, ServiceError> {
        let deleted = self.repo.delete(id).await.map_err(ServiceError::Internal)?;
        if !deleted {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted document {}", id);

        let projection = self.refresh().await;
        Ok(Mutation {
            value: id,
            projection,
        })
    }

    /// Runs a reconciliation pass and reports failures as errors.
    pub async fn reconcile(&self) -> Result<ReconcileReport, ServiceError> {
        let docs = self.list().await?;
        Ok(self.reconciler.reconcile(&docs)?)
    }

    /// Best-effort pass after a committed mutation. Failures are logged and
    /// returned as a stale status, never as an error.
    async fn refresh(&self) -> ProjectionStatus {
        match self.reconcile().await {
            Ok(report) => ProjectionStatus::Refreshed(report),
            Err(e) => {
                tracing::error!("Error regenerating docs: {}", e);
                ProjectionStatus::Stale(e.to_string())
            }
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn check_slug(slug: &str) -> Result<(), ServiceError> {
    if !is_valid_slug(slug) {
        return Err(ServiceError::Validation(format!(
            "Invalid slug '{}': must not contain whitespace, path separators or '..', \
             nor start with '.'",
            slug
        )));
    }
    Ok(())
}

fn validate_new(input: NewDocument) -> Result<Document, ServiceError> {
    let missing: Vec<&str> = [
        ("title", &input.title),
        ("slug", &input.slug),
        ("content", &input.content),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(ServiceError::Validation(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )));
    }

    let title = input.title.unwrap_or_default().trim().to_string();
    let slug = input.slug.unwrap_or_default().trim().to_string();
    check_slug(&slug)?;

    let category = input
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut doc = Document::new(title, slug, input.content.unwrap_or_default())
        .with_category(category)
        .with_sidebar_position(input.sidebar_position.unwrap_or(0));
    if let Some(author) = input.author {
        doc = doc.with_author(author);
    }
    Ok(doc)
}

fn validate_patch(patch: &DocumentPatch) -> Result<(), ServiceError> {
    let blank: Vec<&str> = [
        ("title", &patch.title),
        ("slug", &patch.slug),
        ("content", &patch.content),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_some() && is_blank(value))
    .map(|(name, _)| name)
    .collect();

    if !blank.is_empty() {
        return Err(ServiceError::Validation(format!(
            "Field(s) cannot be empty: {}",
            blank.join(", ")
        )));
    }

    if let Some(slug) = &patch.slug {
        check_slug(slug.trim())?;
    }
    Ok(())
}

/// Maps a store write failure onto the service taxonomy.
fn write_error(err: sqlx::Error, slug: &str, id: Option<i64>) -> ServiceError {
    if is_unique_violation(&err) {
        return ServiceError::Conflict(slug.to_string());
    }
    match (err, id) {
        (sqlx::Error::RowNotFound, Some(id)) => ServiceError::NotFound(id.to_string()),
        (err, _) => ServiceError::Internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::frontmatter;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct TestContext {
        service: DocumentService,
        docs_dir: std::path::PathBuf,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("db.sqlite")).await.unwrap();
        let docs_dir = temp_dir.path().join("docs");
        TestContext {
            service: DocumentService::new(
                DocumentRepository::new(pool),
                Reconciler::new(&docs_dir),
            ),
            docs_dir,
            _temp_dir: temp_dir,
        }
    }

    fn file_names(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_intro_scenario() {
        let ctx = setup().await;

        let created = ctx
            .service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap();

        assert!(!created.projection.is_stale());
        let doc = created.value;
        assert!(doc.id > 0);
        assert_eq!(doc.last_updated, Utc::now().date_naive());
        assert_eq!(doc.category, "base-de-datos-demo");
        assert_eq!(ctx.service.list().await.unwrap().len(), 1);

        let dir = ctx.docs_dir.join("base-de-datos-demo");
        assert_eq!(file_names(&dir), names(&["_category_.json", "intro.md"]));

        let intro = fs::read_to_string(dir.join("intro.md")).unwrap();
        assert!(intro.starts_with("---\ntitle: \"Intro\"\n"));
        assert!(intro.contains("\nslug: intro\n"));
        assert!(intro.ends_with("---\n\n# Hi"));
    }

    #[tokio::test]
    async fn test_update_content_only() {
        let ctx = setup().await;
        let created = ctx
            .service
            .create(NewDocument::new("Intro", "intro", "# Hi").with_author("ana"))
            .await
            .unwrap()
            .value;

        sqlx::query("UPDATE documents SET last_updated = '2000-01-01' WHERE id = ?")
            .bind(created.id)
            .execute(ctx.service.repo.pool())
            .await
            .unwrap();

        let patch = DocumentPatch {
            content: Some("# Hola".into()),
            ..DocumentPatch::default()
        };
        let updated = ctx.service.update(created.id, patch).await.unwrap();

        let doc = &updated.value;
        assert_eq!(doc.title, "Intro");
        assert_eq!(doc.slug, "intro");
        assert_eq!(doc.author, "ana");
        assert_eq!(doc.content, "# Hola");
        assert_eq!(doc.last_updated, Utc::now().date_naive());

        match &updated.projection {
            ProjectionStatus::Refreshed(report) => {
                assert_eq!(report.written, vec!["intro.md"]);
            }
            other => panic!("unexpected projection status: {:?}", other),
        }

        let on_disk =
            fs::read_to_string(ctx.docs_dir.join("base-de-datos-demo").join("intro.md")).unwrap();
        assert_eq!(on_disk, frontmatter::render(doc));
    }

    #[tokio::test]
    async fn test_rename_slug_moves_file() {
        let ctx = setup().await;
        let created = ctx
            .service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap()
            .value;
        let dir = ctx.docs_dir.join("base-de-datos-demo");
        let descriptor_before = fs::read_to_string(dir.join("_category_.json")).unwrap();

        let patch = DocumentPatch {
            slug: Some("introduccion".into()),
            ..DocumentPatch::default()
        };
        ctx.service.update(created.id, patch).await.unwrap();

        assert_eq!(
            file_names(&dir),
            names(&["_category_.json", "introduccion.md"])
        );
        assert_eq!(
            fs::read_to_string(dir.join("_category_.json")).unwrap(),
            descriptor_before
        );
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let ctx = setup().await;

        let input = NewDocument {
            title: Some("Intro".into()),
            slug: Some("   ".into()),
            ..NewDocument::default()
        };
        let err = ctx.service.create(input).await.unwrap_err();

        match err {
            ServiceError::Validation(msg) => {
                assert!(msg.contains("slug"));
                assert!(msg.contains("content"));
                assert!(!msg.contains("title"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(ctx.service.list().await.unwrap().is_empty());
        assert!(!ctx.docs_dir.exists());
    }

    #[tokio::test]
    async fn test_create_rejects_unsafe_slug() {
        let ctx = setup().await;
        let err = ctx
            .service
            .create(NewDocument::new("Evil", "../evil", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_conflict() {
        let ctx = setup().await;
        ctx.service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap();

        let err = ctx
            .service
            .create(NewDocument::new("Other", "intro", "other"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref slug) if slug == "intro"));
        let docs = ctx.service.list().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Intro");
    }

    #[tokio::test]
    async fn test_update_to_taken_slug_conflict() {
        let ctx = setup().await;
        ctx.service
            .create(NewDocument::new("A", "a", "a"))
            .await
            .unwrap();
        let b = ctx
            .service
            .create(NewDocument::new("B", "b", "b"))
            .await
            .unwrap()
            .value;

        let patch = DocumentPatch {
            slug: Some("a".into()),
            ..DocumentPatch::default()
        };
        let err = ctx.service.update(b.id, patch).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(ctx.service.get(b.id).await.unwrap().slug, "b");
    }

    #[tokio::test]
    async fn test_update_rejects_blank_fields() {
        let ctx = setup().await;
        let doc = ctx
            .service
            .create(NewDocument::new("A", "a", "a"))
            .await
            .unwrap()
            .value;

        let patch = DocumentPatch {
            title: Some("".into()),
            ..DocumentPatch::default()
        };
        let err = ctx.service.update(doc.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_id() {
        let ctx = setup().await;
        let err = ctx
            .service
            .update(404, DocumentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let ctx = setup().await;
        let doc = ctx
            .service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap()
            .value;

        let deleted = ctx.service.delete(doc.id).await.unwrap();
        assert_eq!(deleted.value, doc.id);

        let dir = ctx.docs_dir.join("base-de-datos-demo");
        assert_eq!(file_names(&dir), names(&["_category_.json"]));
        assert!(matches!(
            ctx.service.get(doc.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_id_leaves_directory() {
        let ctx = setup().await;
        ctx.service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap();
        let dir = ctx.docs_dir.join("base-de-datos-demo");
        // Untracked file a reconciliation pass would delete
        fs::write(dir.join("stray.md"), "stray").unwrap();

        let err = ctx.service.delete(9999).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(ref id) if id == "9999"));
        assert_eq!(
            file_names(&dir),
            names(&["_category_.json", "intro.md", "stray.md"])
        );
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let ctx = setup().await;
        let err = ctx.service.get_by_slug("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_projection_does_not_fail_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("db.sqlite")).await.unwrap();
        // A regular file where the docs directory should be
        let blocker = temp_dir.path().join("docs");
        fs::write(&blocker, "not a directory").unwrap();
        let service =
            DocumentService::new(DocumentRepository::new(pool), Reconciler::new(&blocker));

        let created = service
            .create(NewDocument::new("Intro", "intro", "# Hi"))
            .await
            .unwrap();

        assert!(created.projection.is_stale());
        assert_eq!(service.get(created.value.id).await.unwrap().slug, "intro");
        assert!(matches!(
            service.reconcile().await,
            Err(ServiceError::Projection(_))
        ));
    }

    #[tokio::test]
    async fn test_mutation_sequence_converges() {
        let ctx = setup().await;
        let a = ctx
            .service
            .create(NewDocument::new("A", "a", "a"))
            .await
            .unwrap()
            .value;
        let b = ctx
            .service
            .create(NewDocument::new("B", "b", "b").with_sidebar_position(2))
            .await
            .unwrap()
            .value;
        ctx.service
            .create(NewDocument::new("C", "c", "c"))
            .await
            .unwrap();
        ctx.service.delete(a.id).await.unwrap();
        ctx.service
            .update(
                b.id,
                DocumentPatch {
                    slug: Some("bee".into()),
                    ..DocumentPatch::default()
                },
            )
            .await
            .unwrap();

        let dir = ctx.docs_dir.join("base-de-datos-demo");
        let mut expected = names(&["_category_.json"]);
        for doc in ctx.service.list().await.unwrap() {
            expected.insert(doc.filename());
        }
        assert_eq!(expected, names(&["_category_.json", "bee.md", "c.md"]));
        assert_eq!(file_names(&dir), expected);

        let report = ctx.service.reconcile().await.unwrap();
        assert!(report.is_noop());
    }
}
