//! # Pipeline Messages
//!
//! Messaggi scambiati tra coordinator e worker. I segnali di controllo
//! (`Shutdown`, `Stopped`) sono varianti dell'enum, separate dai payload.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Coordinator → worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Compress one file
    Compress(PathBuf),
    /// No more files will arrive
    Shutdown,
}

/// Worker → coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// One dispatched file has been handled
    Completed { worker: usize, result: CompressionResult },
    /// The worker has shut down cleanly. Sent exactly once.
    Stopped { worker: usize },
}

/// Per-file outcome reported by a worker.
///
/// A codec size is `None` when that pipeline failed or never ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub path: PathBuf,
    pub original_size: u64,
    pub brotli_size: Option<u64>,
    pub gzip_size: Option<u64>,
    /// First failure seen while handling the file
    pub error: Option<String>,
}

/// How a result contributes to the totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Compressed {
        original_size: u64,
        brotli_size: u64,
        gzip_size: u64,
    },
    Empty,
    Failed,
}

impl CompressionResult {
    /// Zero-length source: nothing written
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            original_size: 0,
            brotli_size: None,
            gzip_size: None,
            error: None,
        }
    }

    /// Source could not be inspected or opened
    pub fn failed(path: PathBuf, original_size: u64, error: impl ToString) -> Self {
        Self {
            path,
            original_size,
            brotli_size: None,
            gzip_size: None,
            error: Some(error.to_string()),
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.error.is_some() {
            return Outcome::Failed;
        }
        match (self.original_size, self.brotli_size, self.gzip_size) {
            (0, _, _) => Outcome::Empty,
            (original_size, Some(brotli_size), Some(gzip_size)) => Outcome::Compressed {
                original_size,
                brotli_size,
                gzip_size,
            },
            _ => Outcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let path = PathBuf::from("/srv/a.js");
        assert_eq!(CompressionResult::empty(path.clone()).outcome(), Outcome::Empty);
        assert_eq!(
            CompressionResult::failed(path.clone(), 0, "permission denied").outcome(),
            Outcome::Failed
        );

        let half = CompressionResult {
            path: path.clone(),
            original_size: 42,
            brotli_size: None,
            gzip_size: Some(30),
            error: None,
        };
        assert_eq!(half.outcome(), Outcome::Failed);

        let full = CompressionResult {
            path,
            original_size: 42,
            brotli_size: Some(20),
            gzip_size: Some(30),
            error: None,
        };
        assert_eq!(
            full.outcome(),
            Outcome::Compressed {
                original_size: 42,
                brotli_size: 20,
                gzip_size: 30
            }
        );
    }
}
