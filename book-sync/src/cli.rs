///
/// This module implements the CLI interface for book-sync: command parsing and
/// the entrypoint shared by `main` and the integration tests.
///
/// All pipeline logic lives in the [`book-sync-core`] crate; this module is
/// CLI glue only.
///
/// [`book-sync-core`]: ../../book-sync-core/
use crate::load_config::load_config;
use anyhow::Result;
use book_sync_core::download::GitFetcher;
use book_sync_core::pages::{discover_units, generate_pages};
use book_sync_core::synchronise::run_pipeline;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for book-sync: mirror book chapters and code samples into site content.
#[derive(Parser)]
#[clap(
    name = "book-sync",
    version,
    about = "Sync book chapters and code samples from a git repository into static-site content"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the source, rebuild the chapter units, then regenerate the page manifests
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Regenerate the page manifests from the current content directory only
    Pages {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation");
            let fetcher = GitFetcher::from_config(&config.source);
            match run_pipeline(&config, &fetcher) {
                Ok(report) => {
                    println!(
                        "Synchronise complete: {} units ({} augmented), {} pages, source {:?}",
                        report.sync.units.len(),
                        report.sync.augmented(),
                        report.pages.len(),
                        report.sync.acquisition,
                    );
                    tracing::info!(command = "sync", report = ?report.sync, "Synchronisation complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e).context("synchronisation failed"))
                }
            }
        }
        Commands::Pages { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "pages", "Generating pages");
            let pages = generate_pages(discover_units(&config.content_dir)?, &config.site)?;
            println!(
                "Generated {} pages into {}",
                pages.len(),
                config.site.manifest_dir.display()
            );
            Ok(())
        }
    }
}
