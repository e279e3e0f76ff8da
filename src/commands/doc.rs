use clap::{Args, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

use dbdocs::models::{Document, DocumentPatch, NewDocument};
use dbdocs::service::{DocumentService, ProjectionStatus, ServiceError};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct DocCommand {
    #[command(subcommand)]
    pub command: DocSubcommand,
}

#[derive(Subcommand)]
pub enum DocSubcommand {
    /// Create a new document
    Create {
        /// Display title
        title: String,

        /// URL slug, also the output filename
        #[arg(long)]
        slug: String,

        /// Markdown body
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read the markdown body from a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Category tag
        #[arg(long)]
        category: Option<String>,

        /// Sidebar ordering hint
        #[arg(long, allow_hyphen_values = true)]
        position: Option<i64>,

        /// Author attribution
        #[arg(long)]
        author: Option<String>,
    },

    /// List all documents
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a document
    Show {
        /// Document ID or slug
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing document
    Update {
        /// Document ID or slug
        identifier: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New slug
        #[arg(long)]
        slug: Option<String>,

        /// New markdown body
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read the new markdown body from a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New sidebar position
        #[arg(long, allow_hyphen_values = true)]
        position: Option<i64>,

        /// New author
        #[arg(long)]
        author: Option<String>,
    },

    /// Delete a document
    Delete {
        /// Document ID or slug
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl DocCommand {
    pub async fn run(&self, service: &DocumentService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DocSubcommand::Create {
                title,
                slug,
                content,
                file,
                category,
                position,
                author,
            } => {
                let content = read_content(content, file)?.unwrap_or_default();

                let mut input = NewDocument::new(title, slug, content);
                if let Some(category) = category {
                    input = input.with_category(category);
                }
                if let Some(position) = position {
                    input = input.with_sidebar_position(*position);
                }
                if let Some(author) = author {
                    input = input.with_author(author);
                }

                let created = service.create(input).await?;
                println!("Created document:");
                println!("{}", created.value);
                report_projection(&created.projection);
                Ok(())
            }

            DocSubcommand::List { format } => {
                let docs = service.list().await?;

                if docs.is_empty() {
                    println!("No documents found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&docs)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<6}  {:<4}  {:<30}  TITLE", "ID", "POS", "SLUG");
                        println!("{}", "-".repeat(80));
                        for doc in &docs {
                            println!(
                                "{:<6}  {:<4}  {:<30}  {}",
                                doc.id,
                                doc.sidebar_position,
                                truncate(&doc.slug, 30),
                                doc.title
                            );
                        }
                        println!("\nTotal: {} document(s)", docs.len());
                    }
                }
                Ok(())
            }

            DocSubcommand::Show { identifier, format } => {
                let doc = find(service, identifier).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
                    OutputFormat::Text => println!("{}", doc),
                }
                Ok(())
            }

            DocSubcommand::Update {
                identifier,
                title,
                slug,
                content,
                file,
                category,
                position,
                author,
            } => {
                let patch = DocumentPatch {
                    title: title.clone(),
                    slug: slug.clone(),
                    category: category.clone(),
                    sidebar_position: *position,
                    author: author.clone(),
                    content: read_content(content, file)?,
                };

                if patch.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let doc = find(service, identifier).await?;
                let updated = service.update(doc.id, patch).await?;
                println!("Updated document:");
                println!("{}", updated.value);
                report_projection(&updated.projection);
                Ok(())
            }

            DocSubcommand::Delete { identifier, force } => {
                let doc = find(service, identifier).await?;

                // Confirm deletion unless --force is used
                if !force {
                    print!("Delete document '{}' ({})? [y/N] ", doc.title, doc.slug);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                let deleted = service.delete(doc.id).await?;
                println!("Deleted document {}: {}", deleted.value, doc.title);
                report_projection(&deleted.projection);
                Ok(())
            }
        }
    }
}

/// Looks a document up by numeric ID first, then by slug.
async fn find(service: &DocumentService, identifier: &str) -> Result<Document, ServiceError> {
    match identifier.parse::<i64>() {
        Ok(id) => match service.get(id).await {
            Err(ServiceError::NotFound(_)) => service.get_by_slug(identifier).await,
            result => result,
        },
        Err(_) => service.get_by_slug(identifier).await,
    }
}

fn read_content(
    content: &Option<String>,
    file: &Option<PathBuf>,
) -> Result<Option<String>, io::Error> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content.clone())),
        (None, Some(path)) => std::fs::read_to_string(path).map(Some),
        (None, None) => Ok(None),
    }
}

fn report_projection(status: &ProjectionStatus) {
    if let ProjectionStatus::Stale(reason) = status {
        eprintln!("Warning: docs directory was not regenerated: {}", reason);
        eprintln!("Run `dbdocs sync` once the problem is fixed.");
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
