//! The documentation category that holds every database-sourced page.
//!
//! Shared by the live reconciler and the build-time generator so both write
//! the same `_category_.json`.

use serde::Serialize;

/// Filename of the category descriptor inside the category directory.
pub const DESCRIPTOR_FILENAME: &str = "_category_.json";

/// Sidebar category metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: &'static str,
    pub slug: &'static str,
    pub position: i64,
    pub description: &'static str,
}

pub const CATEGORY: Category = Category {
    label: "Base de Datos (Demo)",
    slug: "base-de-datos-demo",
    position: 6,
    description: "Documentación generada dinámicamente desde una base de datos simulada",
};

/// On-disk shape of `_category_.json`.
#[derive(Debug, Serialize)]
pub struct CategoryDescriptor<'a> {
    label: &'a str,
    position: i64,
    description: &'a str,
    link: CategoryLink<'a>,
}

#[derive(Debug, Serialize)]
struct CategoryLink<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    description: &'a str,
}

impl Category {
    pub fn descriptor(&self) -> CategoryDescriptor<'static> {
        CategoryDescriptor {
            label: self.label,
            position: self.position,
            description: self.description,
            link: CategoryLink {
                kind: "generated-index",
                description: self.description,
            },
        }
    }

    /// Renders the descriptor file contents (two-space indented JSON).
    pub fn descriptor_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.descriptor())
    }
}
