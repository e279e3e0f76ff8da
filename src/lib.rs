//! Database-backed documentation pages mirrored into a static-site docs
//! directory.
//!
//! Documents live in SQLite ([`db`]). Every mutation made through
//! [`service::DocumentService`] is followed by a reconciliation pass that
//! rewrites only the markdown files whose rendered text changed
//! ([`projection::Reconciler`]). Site builds regenerate the whole directory
//! from a read-only snapshot instead ([`projection::Generator`]).

pub mod config;
pub mod db;
pub mod frontmatter;
pub mod models;
pub mod projection;
pub mod server;
pub mod service;
