use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::CATEGORY;

/// Category assigned to documents created without one.
pub const DEFAULT_CATEGORY: &str = CATEGORY.slug;

/// A database-backed documentation page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub sidebar_position: i64,
    pub author: String,
    pub last_updated: NaiveDate,
    pub content: String,
}

impl Document {
    /// Builds an unsaved document. The store assigns the real `id` and
    /// `last_updated` when it is persisted.
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            slug: slug.into(),
            category: DEFAULT_CATEGORY.to_string(),
            sidebar_position: 0,
            author: String::new(),
            last_updated: Utc::now().date_naive(),
            content: content.into(),
        }
    }

    pub fn with_sidebar_position(mut self, position: i64) -> Self {
        self.sidebar_position = position;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Name of the rendered markdown file for this document.
    pub fn filename(&self) -> String {
        format!("{}.md", self.slug)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Slug: {}", self.slug)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Sidebar position: {}", self.sidebar_position)?;
        if !self.author.is_empty() {
            writeln!(f, "Author: {}", self.author)?;
        }
        writeln!(f, "Last updated: {}", self.last_updated)?;
        writeln!(f, "\n{}", self.content)?;
        Ok(())
    }
}

/// Checks that a slug is usable both as a URL segment and as a filename
/// stem inside the category directory.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains("..")
        && !slug
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
}

/// Input for creating a document.
///
/// Required fields are optional here so that a request missing several of
/// them can be rejected with every missing name at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewDocument {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub sidebar_position: Option<i64>,
    pub author: Option<String>,
    pub content: Option<String>,
}

impl NewDocument {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            slug: Some(slug.into()),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sidebar_position(mut self, position: i64) -> Self {
        self.sidebar_position = Some(position);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Partial update. `None` fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub sidebar_position: Option<i64>,
    pub author: Option<String>,
    pub content: Option<String>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.category.is_none()
            && self.sidebar_position.is_none()
            && self.author.is_none()
            && self.content.is_none()
    }

    /// Overlays the supplied fields onto `doc`.
    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            doc.slug = slug.clone();
        }
        if let Some(category) = &self.category {
            doc.category = category.clone();
        }
        if let Some(position) = self.sidebar_position {
            doc.sidebar_position = position;
        }
        if let Some(author) = &self.author {
            doc.author = author.clone();
        }
        if let Some(content) = &self.content {
            doc.content = content.clone();
        }
    }
}
