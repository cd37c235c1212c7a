//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico (`--json`).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della run (root, file trovati, dimensione del pool)
//! - `file_complete`: Fine elaborazione di un file
//! - `complete`: Totali finali, emesso una sola volta
//!
//! Un messaggio per riga su stdout; i log vanno su stderr in questa modalità.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::error;

use crate::pipeline::messages::{CompressionResult, Outcome};
use crate::progress::CompressionStats;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio della compressione
    #[serde(rename = "start")]
    Start {
        roots: Vec<PathBuf>,
        total_files: usize,
        pool_size: usize,
    },

    /// Fine elaborazione di un file specifico
    #[serde(rename = "file_complete")]
    FileComplete {
        worker: usize,
        path: PathBuf,
        original_size: u64,
        brotli_size: Option<u64>,
        gzip_size: Option<u64>,
        skipped: bool,
        error: Option<String>,
    },

    /// Processo completato
    #[serde(rename = "complete")]
    Complete {
        #[serde(flatten)]
        stats: CompressionStats,
        brotli_reduction_percent: f64,
        gzip_reduction_percent: f64,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize JSON message: {}", e),
        }
    }

    /// Crea un messaggio di inizio
    pub fn start(roots: Vec<PathBuf>, total_files: usize, pool_size: usize) -> Self {
        Self::Start {
            roots,
            total_files,
            pool_size,
        }
    }

    /// Crea un messaggio di completamento file
    pub fn file_complete(worker: usize, result: &CompressionResult) -> Self {
        Self::FileComplete {
            worker,
            path: result.path.clone(),
            original_size: result.original_size,
            brotli_size: result.brotli_size,
            gzip_size: result.gzip_size,
            skipped: result.outcome() == Outcome::Empty,
            error: result.error.clone(),
        }
    }

    /// Crea un messaggio di completamento generale
    pub fn complete(stats: &CompressionStats) -> Self {
        Self::Complete {
            stats: stats.clone(),
            brotli_reduction_percent: stats.brotli_reduction_percent(),
            gzip_reduction_percent: stats.gzip_reduction_percent(),
        }
    }
}
