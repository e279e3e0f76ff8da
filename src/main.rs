use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ConfigCommand, DocCommand, GenerateCommand, SyncCommand};
use dbdocs::config::Config;
use dbdocs::db::{init_db, DocumentRepository};
use dbdocs::projection::Reconciler;
use dbdocs::service::DocumentService;

#[derive(Parser)]
#[command(name = "dbdocs")]
#[command(version)]
#[command(about = "Manage database-backed documentation pages", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, show, update and delete documents
    Doc(DocCommand),

    /// Bring the docs directory in line with the database
    Sync(SyncCommand),

    /// Regenerate the docs directory from scratch (for site builds)
    Generate(GenerateCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbdocs=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Doc(cmd)) => {
            let service = open_service(&config).await?;
            cmd.run(&service).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let service = open_service(&config).await?;
            cmd.run(&service).await?;
        }
        Some(Commands::Generate(cmd)) => {
            cmd.run(&config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_service(config: &Config) -> Result<DocumentService, sqlx::Error> {
    let pool = init_db(&config.database_path.value).await?;
    Ok(DocumentService::new(
        DocumentRepository::new(pool),
        Reconciler::new(&config.docs_dir.value),
    ))
}
