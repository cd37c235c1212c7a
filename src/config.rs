//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della pipeline di compressione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di compressione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Calcola la dimensione del pool di worker
//!
//! ## Parametri di configurazione:
//! - `workers`: Numero di worker (default: None = unità parallele − 1, minimo 1)
//! - `eligibility`: Estensioni e content type da comprimere
//! - `codec`: Qualità brotli (default: 11), livello gzip (default: 8), chunk (32 KiB)
//! - `follow_symlinks`: Segue i link simbolici durante il walk (default: false)
//! - `progress`: Mostra la progress bar (default: false)
//! - `json_output`: Output JSON line-delimited (default: false)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: Some(4),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::EligibilityRule;
use crate::codec::{CodecSettings, BROTLI_MAX_QUALITY};

/// Configuration for a compression run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of parallel workers (None = available parallelism - 1)
    pub workers: Option<usize>,
    /// Which files get sidecars
    pub eligibility: EligibilityRule,
    /// Codec parameters
    pub codec: CodecSettings,
    /// Follow symbolic links while walking (loops are detected and skipped)
    pub follow_symlinks: bool,
    /// Show a progress bar on stderr
    pub progress: bool,
    /// Output progress and summary as JSON for programmatic use
    pub json_output: bool,
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.codec.brotli_quality > BROTLI_MAX_QUALITY {
            return Err(anyhow::anyhow!("Brotli quality must be between 0 and 11"));
        }

        if !(10..=24).contains(&self.codec.brotli_window) {
            return Err(anyhow::anyhow!("Brotli window must be between 10 and 24"));
        }

        if self.codec.gzip_level > 9 {
            return Err(anyhow::anyhow!("Gzip level must be between 0 and 9"));
        }

        if self.codec.chunk_size == 0 {
            return Err(anyhow::anyhow!("Chunk size must be greater than 0"));
        }

        Ok(())
    }

    /// Pool size: explicit `workers`, or one less than the available parallelism (at least 1)
    pub fn pool_size(&self) -> usize {
        match self.workers {
            Some(workers) => workers.max(1),
            None => {
                let units = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                units.saturating_sub(1).max(1)
            }
        }
    }

    /// Load configuration from an explicitly given file; a missing file is an error
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(anyhow::anyhow!(
                "Configuration file not found: {}",
                path.display()
            ));
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
