mod category;
mod document;

pub use category::{Category, CategoryDescriptor, CATEGORY, DESCRIPTOR_FILENAME};
pub use document::{is_valid_slug, Document, DocumentPatch, NewDocument, DEFAULT_CATEGORY};
