//! # Asset Precompressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione delle directory passate
//! - Creazione della configurazione e avvio del coordinator
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, workers, livelli dei codec, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Risolve le directory rispetto alla working directory e verifica che esistano
//! 4. Carica la configurazione (file JSON opzionale + override da CLI)
//! 5. Istanzia PoolCoordinator e avvia la compressione
//!
//! ## Esempio di utilizzo:
//! ```bash
//! precompress dist/browser dist/assets --workers 8 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use asset_precompressor::walker::absolutize;
use asset_precompressor::{CompressError, Config, PoolCoordinator};

#[derive(Parser)]
#[command(name = "precompress")]
#[command(about = "Write .br and .gz sidecar files for every compressible asset")]
struct Args {
    /// Directories to compress, relative to the current directory
    #[arg(required = true, value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Number of parallel workers (default: available cores - 1)
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Brotli quality (0-11)
    #[arg(long)]
    brotli_quality: Option<u32>,

    /// Gzip level (0-9)
    #[arg(long)]
    gzip_level: Option<u32>,

    /// Follow symbolic links (loops are detected)
    #[arg(long)]
    follow_symlinks: bool,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Output progress and summary as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout stays clean for JSON lines in --json mode
    let writer = if args.json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if let Some(quality) = args.brotli_quality {
        config.codec.brotli_quality = quality;
    }
    if let Some(level) = args.gzip_level {
        config.codec.gzip_level = level;
    }
    config.follow_symlinks |= args.follow_symlinks;
    config.progress |= args.progress;
    config.json_output |= args.json;

    // Validate arguments
    let mut roots = Vec::with_capacity(args.roots.len());
    for root in &args.roots {
        let root = absolutize(root);
        if !root.is_dir() {
            return Err(CompressError::RootNotFound(root).into());
        }
        roots.push(root);
    }

    let coordinator = PoolCoordinator::new(config)?;
    coordinator.run(&roots).await?;

    Ok(())
}
