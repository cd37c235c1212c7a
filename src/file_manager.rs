//! # File Management Module
//!
//! Utilità sui file condivise da worker e coordinator.
//!
//! ## Operazioni:
//! - `get_file_size()`: Dimensione dai metadata del filesystem
//! - `remove_partial()`: Rimozione best-effort di un sidecar incompleto
//! - `format_size()`: Converte bytes in formato leggibile (KB, MB, GB)

use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Manages file operations
pub struct FileManager;

impl FileManager {
    /// Size in bytes from filesystem metadata
    pub async fn get_file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Remove a sidecar left behind by a failed pipeline
    pub async fn remove_partial(path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed partial output {}", path.display()),
            Err(e) => debug!("No partial output removed at {}: {}", path.display(), e),
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
