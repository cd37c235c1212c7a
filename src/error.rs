//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della pipeline di compressione.
//!
//! ## Categorie di errori:
//! - `NoRoots`: Nessuna directory passata (usage error, fatale)
//! - `RootNotFound`: Una root non esiste o non è una directory
//! - `Io`: Errori di I/O generici
//! - `Stream`: Errore di lettura/scrittura in una delle due pipeline di un file
//! - `Classification`: Sniffing del content type fallito (il file diventa non eleggibile)
//! - `WorkerLost` / `WorkerPanicked`: Il protocollo di shutdown del pool non è stato completato
//! - `Validation`: Errori di validazione configurazione
//!
//! ## Propagazione:
//! Solo `NoRoots`, `RootNotFound`, `Validation` e gli errori del pool arrivano al main.
//! `Stream` e `Classification` vengono loggati e convertiti in risultati parziali.
//!
//! ## Esempio:
//! ```rust,ignore
//! if roots.is_empty() {
//!     return Err(CompressError::NoRoots);
//! }
//! ```

use std::path::PathBuf;

use crate::codec::Codec;

/// Custom error types for the compression pipeline
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("No directories supplied: at least one root directory is required")]
    NoRoots,

    #[error("Root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{codec} stream failed for {}: {source}", .path.display())]
    Stream {
        codec: Codec,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Content type detection failed for {}: {source}", .path.display())]
    Classification {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool lost: {stopped} of {pool_size} workers acknowledged shutdown")]
    WorkerLost { stopped: usize, pool_size: usize },

    #[error("Worker task panicked: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CompressError>;
