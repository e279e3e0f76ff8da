//! Build-time regeneration of the docs directory.

use clap::Args;

use super::doc::OutputFormat;
use dbdocs::config::Config;
use dbdocs::projection::Generator;

/// Wipe and regenerate the category directory from the database (site builds)
#[derive(Args)]
pub struct GenerateCommand {
    /// Output format; `json` prints the generated content set for the build
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl GenerateCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let generator = Generator::new(&config.docs_dir.value);
        let generated = generator.generate(&config.database_path.value).await?;

        match (&self.format, generated) {
            (OutputFormat::Json, content) => {
                println!("{}", serde_json::to_string_pretty(&content)?);
            }
            (OutputFormat::Text, None) => {
                println!(
                    "No documents found in {}",
                    config.database_path.value.display()
                );
            }
            (OutputFormat::Text, Some(content)) => {
                println!(
                    "Generated {} document(s) in {}",
                    content.documents.len(),
                    generator.category_dir().display()
                );
            }
        }
        Ok(())
    }
}
