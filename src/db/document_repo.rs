use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::Document;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed document store.
///
/// Owns its pool handle; clone it to share between services.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    title: String,
    slug: String,
    category: String,
    sidebar_position: i64,
    author: String,
    last_updated: String,
    content: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = sqlx::Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let last_updated = NaiveDate::parse_from_str(&row.last_updated, DATE_FORMAT)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "last_updated".to_string(),
                source: Box::new(e),
            })?;

        Ok(Document {
            id: row.id,
            title: row.title,
            slug: row.slug,
            category: row.category,
            sidebar_position: row.sidebar_position,
            author: row.author,
            last_updated,
            content: row.content,
        })
    }
}

fn today() -> String {
    Utc::now().date_naive().format(DATE_FORMAT).to_string()
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a document. `id` and `last_updated` on the input are ignored;
    /// the store assigns both.
    pub async fn create(&self, doc: &Document) -> Result<Document, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (title, slug, category, sidebar_position, author, last_updated, content)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.title)
        .bind(&doc.slug)
        .bind(&doc.category)
        .bind(doc.sidebar_position)
        .bind(&doc.author)
        .bind(today())
        .bind(&doc.content)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Document>, sqlx::Error> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Document>, sqlx::Error> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT * FROM documents WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    /// All documents ordered by sidebar position, then id.
    pub async fn list(&self) -> Result<Vec<Document>, sqlx::Error> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT * FROM documents ORDER BY sidebar_position ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Overwrites every editable column of the row with `doc.id` and refreshes
    /// `last_updated`. Returns `RowNotFound` if the row is gone.
    pub async fn update(&self, doc: &Document) -> Result<Document, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET title = ?, slug = ?, category = ?, sidebar_position = ?, author = ?,
                last_updated = ?, content = ?
            WHERE id = ?
            "#,
        )
        .bind(&doc.title)
        .bind(&doc.slug)
        .bind(&doc.category)
        .bind(doc.sidebar_position)
        .bind(&doc.author)
        .bind(today())
        .bind(&doc.content)
        .bind(doc.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        self.get_by_id(doc.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Returns false if no row had that id.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
