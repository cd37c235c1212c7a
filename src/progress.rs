//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di compressione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar `indicatif` (opzionale, `--progress`)
//! - `CompressionStats`: Totali cumulativi della run (file, byte originali, byte br/gz)
//!
//! ## Statistiche tracciate:
//! - **total_files**: File compressi con entrambi i codec
//! - **total_original_bytes**: Somma delle dimensioni originali
//! - **total_brotli_bytes** / **total_gzip_bytes**: Somma delle dimensioni dei sidecar
//! - **files_empty**: File vuoti saltati
//! - **files_failed**: File con almeno un codec fallito (esclusi dai totali)
//!
//! L'aggregazione è una somma pura: l'ordine di arrivo dei risultati non conta.
//!
//! ## Report finale:
//! ```text
//! Done Compressing files
//! total files compressed:1
//! total original size:500
//! total br size:120 (76.00% of original)
//! total gz size:160 (68.00%  of original)
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::pipeline::messages::{CompressionResult, Outcome};

/// Manages the optional progress bar
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Running totals owned by the coordinator
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub total_files: usize,
    pub total_original_bytes: u64,
    pub total_brotli_bytes: u64,
    pub total_gzip_bytes: u64,
    pub files_empty: usize,
    pub files_failed: usize,
}

impl CompressionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one per-file result into the totals
    pub fn add_result(&mut self, result: &CompressionResult) {
        match result.outcome() {
            Outcome::Compressed {
                original_size,
                brotli_size,
                gzip_size,
            } => {
                self.total_files += 1;
                self.total_original_bytes += original_size;
                self.total_brotli_bytes += brotli_size;
                self.total_gzip_bytes += gzip_size;
            }
            Outcome::Empty => self.files_empty += 1,
            Outcome::Failed => self.files_failed += 1,
        }
    }

    /// `100 - (brotli / original) * 100`
    pub fn brotli_reduction_percent(&self) -> f64 {
        reduction_percent(self.total_original_bytes, self.total_brotli_bytes)
    }

    /// `100 - (gzip / original) * 100`
    pub fn gzip_reduction_percent(&self) -> f64 {
        reduction_percent(self.total_original_bytes, self.total_gzip_bytes)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Compressed: {} files | Empty: {} | Failed: {}",
            self.total_files, self.files_empty, self.files_failed
        )
    }
}

/// `100 - (compressed / original) * 100`, or 0 when there is no input
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        100.0 - (compressed as f64 / original as f64) * 100.0
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Done Compressing files")?;
        writeln!(f, "total files compressed:{}", self.total_files)?;
        writeln!(f, "total original size:{}", self.total_original_bytes)?;
        writeln!(
            f,
            "total br size:{} ({:.2}% of original)",
            self.total_brotli_bytes,
            self.brotli_reduction_percent()
        )?;
        write!(
            f,
            "total gz size:{} ({:.2}%  of original)",
            self.total_gzip_bytes,
            self.gzip_reduction_percent()
        )
    }
}
