use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{document_path, write_descriptor, ProjectionError};
use crate::frontmatter;
use crate::models::{Category, Document, CATEGORY, DESCRIPTOR_FILENAME};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Document files created or rewritten.
    pub written: Vec<String>,
    /// Document files whose content already matched.
    pub unchanged: usize,
    /// Stale files deleted.
    pub removed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Incremental directory sync for the live service.
///
/// Every pass recomputes from the full record set, so passes never depend on
/// what an earlier (possibly failed) pass did. Overlapping passes are not
/// locked against each other; they can only race to write identical bytes
/// or to delete the same stale file.
#[derive(Debug, Clone)]
pub struct Reconciler {
    category_dir: PathBuf,
    category: Category,
}

impl Reconciler {
    pub fn new(docs_dir: impl AsRef<Path>) -> Self {
        Self {
            category_dir: docs_dir.as_ref().join(CATEGORY.slug),
            category: CATEGORY,
        }
    }

    pub fn category_dir(&self) -> &Path {
        &self.category_dir
    }

    /// Brings the category directory into agreement with `docs`.
    ///
    /// Document files are only written when absent or different, so a
    /// file-watching dev server sees no change events for untouched pages.
    /// The first I/O error aborts the pass.
    pub fn reconcile(&self, docs: &[Document]) -> Result<ReconcileReport, ProjectionError> {
        let dir = &self.category_dir;
        let mut report = ReconcileReport::default();

        fs::create_dir_all(dir).map_err(|e| ProjectionError::Io(dir.clone(), e))?;
        write_descriptor(dir, &self.category)?;

        let mut expected: HashSet<String> = HashSet::with_capacity(docs.len() + 1);
        expected.insert(DESCRIPTOR_FILENAME.to_string());

        for doc in docs {
            let path = document_path(dir, doc)?;
            let filename = doc.filename();
            let rendered = frontmatter::render(doc);

            let up_to_date = match fs::read(&path) {
                Ok(current) => current == rendered.as_bytes(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(ProjectionError::Io(path, e)),
            };

            if up_to_date {
                report.unchanged += 1;
            } else {
                fs::write(&path, rendered).map_err(|e| ProjectionError::Io(path.clone(), e))?;
                tracing::debug!("Wrote {}", path.display());
                report.written.push(filename.clone());
            }

            expected.insert(filename);
        }

        let entries = fs::read_dir(dir).map_err(|e| ProjectionError::Io(dir.clone(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ProjectionError::Io(dir.clone(), e))?;
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(t) => t,
                // Removed by an overlapping pass
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ProjectionError::Io(path, e)),
            };
            if file_type.is_dir() {
                tracing::debug!("Skipping directory {}", path.display());
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if expected.contains(&name) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed stale {}", path.display());
                    report.removed.push(name);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(ProjectionError::Io(path, e)),
            }
        }

        tracing::info!(
            "Regenerated {} docs ({} written, {} unchanged, {} removed)",
            docs.len(),
            report.written.len(),
            report.unchanged,
            report.removed.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn file_names(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_creates_directory_descriptor_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());

        let docs = vec![
            Document::new("Intro", "intro", "# Hi"),
            Document::new("Guide", "guide", "# Guide").with_sidebar_position(2),
        ];
        let report = reconciler.reconcile(&docs).unwrap();

        let dir = temp_dir.path().join("base-de-datos-demo");
        assert_eq!(reconciler.category_dir(), dir);
        assert_eq!(
            file_names(&dir),
            names(&["_category_.json", "intro.md", "guide.md"])
        );
        assert_eq!(report.written, vec!["intro.md", "guide.md"]);
        assert_eq!(report.unchanged, 0);
        assert!(report.removed.is_empty());

        let intro = fs::read_to_string(dir.join("intro.md")).unwrap();
        assert_eq!(intro, frontmatter::render(&docs[0]));
        assert_eq!(
            fs::read_to_string(dir.join("_category_.json")).unwrap(),
            CATEGORY.descriptor_json().unwrap()
        );
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let docs = vec![
            Document::new("Intro", "intro", "# Hi"),
            Document::new("Guide", "guide", "# Guide"),
        ];

        reconciler.reconcile(&docs).unwrap();
        let intro_path = reconciler.category_dir().join("intro.md");
        let before = mtime(&intro_path);

        std::thread::sleep(Duration::from_millis(20));
        let report = reconciler.reconcile(&docs).unwrap();

        assert!(report.is_noop());
        assert_eq!(report.unchanged, 2);
        assert_eq!(mtime(&intro_path), before);
    }

    #[test]
    fn test_rewrites_only_changed_file() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let mut docs = vec![
            Document::new("Intro", "intro", "# Hi"),
            Document::new("Guide", "guide", "# Guide"),
        ];
        reconciler.reconcile(&docs).unwrap();

        docs[0].content = "# Hola".to_string();
        let report = reconciler.reconcile(&docs).unwrap();

        assert_eq!(report.written, vec!["intro.md"]);
        assert_eq!(report.unchanged, 1);
        let intro = fs::read_to_string(reconciler.category_dir().join("intro.md")).unwrap();
        assert!(intro.ends_with("\n\n# Hola"));
    }

    #[test]
    fn test_repairs_hand_edited_file() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let docs = vec![Document::new("Intro", "intro", "# Hi")];
        reconciler.reconcile(&docs).unwrap();

        let path = reconciler.category_dir().join("intro.md");
        fs::write(&path, "tampered").unwrap();

        let report = reconciler.reconcile(&docs).unwrap();
        assert_eq!(report.written, vec!["intro.md"]);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            frontmatter::render(&docs[0])
        );
    }

    #[test]
    fn test_slug_rename_removes_old_file() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let mut docs = vec![Document::new("Intro", "intro", "# Hi")];
        reconciler.reconcile(&docs).unwrap();

        docs[0].slug = "introduccion".to_string();
        let report = reconciler.reconcile(&docs).unwrap();

        assert_eq!(report.written, vec!["introduccion.md"]);
        assert_eq!(report.removed, vec!["intro.md"]);
        assert_eq!(
            file_names(reconciler.category_dir()),
            names(&["_category_.json", "introduccion.md"])
        );
    }

    #[test]
    fn test_empty_record_set_leaves_only_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        reconciler
            .reconcile(&[Document::new("Intro", "intro", "# Hi")])
            .unwrap();

        let report = reconciler.reconcile(&[]).unwrap();

        assert_eq!(report.removed, vec!["intro.md"]);
        assert_eq!(
            file_names(reconciler.category_dir()),
            names(&["_category_.json"])
        );
    }

    #[test]
    fn test_unknown_files_removed_directories_kept() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let dir = reconciler.category_dir().to_path_buf();
        fs::create_dir_all(dir.join("assets")).unwrap();
        fs::write(dir.join("notes.txt"), "stray").unwrap();

        reconciler.reconcile(&[]).unwrap();

        assert_eq!(file_names(&dir), names(&["_category_.json", "assets"]));
    }

    #[test]
    fn test_unsafe_slug_aborts_pass() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());

        let docs = vec![Document::new("Evil", "../escape", "x")];
        let err = reconciler.reconcile(&docs).unwrap_err();

        assert!(matches!(err, ProjectionError::UnsafeSlug(ref s) if s == "../escape"));
        assert!(!temp_dir.path().join("escape.md").exists());
    }

    #[test]
    fn test_io_error_aborts_pass() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the docs directory should be
        let blocker = temp_dir.path().join("docs");
        fs::write(&blocker, "not a directory").unwrap();

        let reconciler = Reconciler::new(&blocker);
        let err = reconciler
            .reconcile(&[Document::new("Intro", "intro", "# Hi")])
            .unwrap_err();

        assert!(matches!(err, ProjectionError::Io(..)));
    }

    // Passes are not mutually excluded. Overlapping passes over the same
    // record set must still converge on the same directory contents.
    #[test]
    fn test_overlapping_passes_converge() {
        let temp_dir = TempDir::new().unwrap();
        let reconciler = Reconciler::new(temp_dir.path());
        let dir = reconciler.category_dir().to_path_buf();
        fs::create_dir_all(&dir).unwrap();
        for i in 0..20 {
            fs::write(dir.join(format!("stale-{i}.md")), "old").unwrap();
        }

        let docs: Vec<Document> = (0..20)
            .map(|i| Document::new(format!("Doc {i}"), format!("doc-{i}"), format!("body {i}")))
            .collect();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reconciler = reconciler.clone();
                let docs = docs.clone();
                std::thread::spawn(move || reconciler.reconcile(&docs))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let mut expected = names(&["_category_.json"]);
        expected.extend(docs.iter().map(|d| d.filename()));
        assert_eq!(file_names(&dir), expected);
        for doc in &docs {
            let on_disk = fs::read_to_string(dir.join(doc.filename())).unwrap();
            assert_eq!(on_disk, frontmatter::render(doc));
        }
    }
}
