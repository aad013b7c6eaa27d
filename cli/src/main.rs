//! `contentsync`: load a content directory once, or keep it in sync.

mod logging;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use contentsync_source_local::{Cache, LocalContentSource, SourceConfig};
use futures::StreamExt;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "contentsync", version, about = "Synchronize a content directory into a document cache")]
struct Cli {
    /// Default log filter, overridden by `RUST_LOG`.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every document once and print a summary.
    Build {
        /// Path to the config file.
        #[arg(short, long, default_value = "contentsync.toml")]
        config: PathBuf,

        /// Print the whole cache instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Load every document, then follow changes until interrupted.
    Dev {
        /// Path to the config file.
        #[arg(short, long, default_value = "contentsync.toml")]
        config: PathBuf,
    },
}

/// What `build` prints by default.
#[derive(Debug, Serialize, PartialEq)]
struct Summary {
    documents: usize,
    types: BTreeMap<String, usize>,
    schema_hash: String,
}

impl Summary {
    fn of(cache: &Cache) -> Self {
        let mut types = BTreeMap::new();
        for document in &cache.documents {
            *types.entry(document.type_name.clone()).or_insert(0) += 1;
        }

        Self {
            documents: cache.len(),
            types,
            schema_hash: cache.schema.hash.clone(),
        }
    }
}

fn open(config_path: &Path) -> Result<LocalContentSource> {
    let config = SourceConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    LocalContentSource::new(config).context("invalid configuration")
}

async fn build(config_path: &Path, json: bool) -> Result<()> {
    let source = open(config_path)?;
    let mut snapshots = source.fetch_data(false)?;

    let Some(cache) = snapshots.next().await else {
        bail!("content source ended without a snapshot");
    };
    let cache = cache?;

    let output = if json {
        serde_json::to_string_pretty(&cache)?
    } else {
        serde_json::to_string_pretty(&Summary::of(&cache))?
    };
    println!("{output}");

    Ok(())
}

async fn dev(config_path: &Path) -> Result<()> {
    let source = open(config_path)?;
    let mut snapshots = source.fetch_data(true)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(());
            }
            next = snapshots.next() => {
                let Some(cache) = next else {
                    info!("Content source ended");
                    return Ok(());
                };
                let cache = cache?;
                let summary = Summary::of(&cache);
                info!("Cache updated: {} documents {:?}", summary.documents, summary.types);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Command::Build { config, json } => build(&config, json).await,
        Command::Dev { config } => dev(&config).await,
    }
}
