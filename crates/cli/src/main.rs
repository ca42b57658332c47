use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use content_core::api::{self, AppState};
use content_core::config::{FileConfig, ServerConfig};
use content_core::memory::MemoryDocuments;
use content_core::schema::{BlogPost, Collection, Lead, Product, Testimonial, User};
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "siteapi")]
#[command(about = "Marketing site content API", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Load testimonials or blog posts from a JSON array file
    Import {
        /// Target collection (testimonial, blogpost)
        collection: String,
        /// JSON file holding an array of documents
        file: PathBuf,
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Optional TOML config file (host, port, database_url, database_name)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address (default: 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (default: 8000)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Keep documents in process memory instead of SQLite
    #[arg(long)]
    memory: bool,

    #[command(flatten)]
    database: DatabaseArgs,
}

#[derive(clap::Args)]
struct DatabaseArgs {
    /// SQLite database path, optionally prefixed with sqlite://
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Logical database name reported by diagnostics
    #[arg(long, env = "DATABASE_NAME")]
    database_name: Option<String>,
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    content_core::logging::init_logging(cli.verbose)?;

    match cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Import {
            collection,
            file,
            database,
        } => import(&collection, file, database),
    }
}

fn resolve_config(config: Option<PathBuf>, overrides: FileConfig) -> Result<ServerConfig> {
    let file = match config {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    Ok(ServerConfig::resolve(file, overrides))
}

fn serve(args: ServeArgs) -> Result<()> {
    let overrides = FileConfig {
        host: args.host,
        port: args.port,
        database_url: args.database.database_url,
        database_name: args.database.database_name,
    };
    let config = resolve_config(args.config, overrides)?;

    let state = if args.memory {
        info!("serving from in-memory store");
        AppState::new(Arc::new(MemoryDocuments::new())).with_env(config.env_presence())
    } else {
        if config.database_url.is_none() {
            info!("DATABASE_URL not set, serving static fallbacks");
        }
        AppState::from_config(&config)
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(api::serve(&config.bind_addr(), state))
}

fn import(collection: &str, file: PathBuf, database: DatabaseArgs) -> Result<()> {
    let overrides = FileConfig {
        database_url: database.database_url,
        database_name: database.database_name,
        ..FileConfig::default()
    };
    let config = resolve_config(None, overrides)?;
    if config.database_url.is_none() {
        anyhow::bail!("DATABASE_URL (or --database-url) is required for import");
    }

    let store = config.store();
    let count = content_core::import::import_file(&store, collection, &file)?;
    println!("Imported {count} documents into `{collection}`");
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        (Testimonial::NAME, schema_for!(Testimonial)),
        (BlogPost::NAME, schema_for!(BlogPost)),
        (Lead::NAME, schema_for!(Lead)),
        (User::NAME, schema_for!(User)),
        (Product::NAME, schema_for!(Product)),
    ];

    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
