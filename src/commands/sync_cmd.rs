//! Manual reconciliation of the docs directory with the database.

use clap::Args;

use dbdocs::service::DocumentService;

/// Regenerate changed markdown files and remove stale ones
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// List every file written or removed
    #[arg(long, short)]
    verbose: bool,
}

impl SyncCommand {
    pub async fn run(&self, service: &DocumentService) -> Result<(), Box<dyn std::error::Error>> {
        let report = service.reconcile().await?;
        let dir = service.reconciler().category_dir();

        if report.is_noop() {
            println!(
                "Already up to date ({} document(s) in {}).",
                report.unchanged,
                dir.display()
            );
            return Ok(());
        }

        if self.verbose {
            for name in &report.written {
                println!("  ✓ wrote {}", name);
            }
            for name in &report.removed {
                println!("  ✗ removed {}", name);
            }
            println!();
        }

        println!(
            "Synced {}: {} written, {} unchanged, {} removed.",
            dir.display(),
            report.written.len(),
            report.unchanged,
            report.removed.len()
        );
        Ok(())
    }
}
