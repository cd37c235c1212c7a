//! # Content Classifier Module
//!
//! Decide se un file scoperto va compresso.
//!
//! ## Regola di eleggibilità:
//! 1. **Fast path**: l'estensione è nella allow-list (js, html, css, svg, json, xml)
//! 2. **Fallback**: per estensioni sconosciute legge i primi byte del file e rileva
//!    il content type con `infer`; eleggibile se il MIME è nella allow-list testuale
//!
//! Un file illeggibile o non regolare (FIFO, socket, device) durante lo sniffing
//! è semplicemente non eleggibile: non viene mai aperto.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::CompressError;

/// Bytes read from the head of a file for content type detection
pub const SNIFF_LEN: u64 = 8192;

pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "html", "css", "svg", "json", "xml"];

pub const DEFAULT_CONTENT_TYPES: &[&str] = &[
    "text/html",
    "text/css",
    "text/xml",
    "text/javascript",
    "application/x-javascript",
    "application/xml",
    "image/svg+xml",
];

/// Accepted extensions (fast path) and sniffed content types (fallback)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityRule {
    /// Lowercase extensions without the leading dot
    pub extensions: BTreeSet<String>,
    pub content_types: BTreeSet<String>,
}

impl Default for EligibilityRule {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            content_types: DEFAULT_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Pure predicate over a file's name and content
#[derive(Debug, Clone, Default)]
pub struct ContentClassifier {
    rule: EligibilityRule,
}

impl ContentClassifier {
    pub fn new(rule: EligibilityRule) -> Self {
        Self { rule }
    }

    /// Check whether `path` should get sidecar files
    pub fn is_eligible(&self, path: &Path) -> bool {
        if self.matches_extension(path) {
            return true;
        }

        match Self::sniff(path) {
            Ok(Some(mime)) => {
                let eligible = self.rule.content_types.contains(&mime);
                debug!("Sniffed {} as {} (eligible: {})", path.display(), mime, eligible);
                eligible
            }
            Ok(None) => false,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    /// Extension allow-list check, case-insensitive
    pub fn matches_extension(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                self.rule.extensions.contains(&ext_lower)
            }
            None => false,
        }
    }

    /// Detect the MIME type of a file from its first `SNIFF_LEN` bytes.
    ///
    /// Anything that is not a regular file yields `None` without being opened.
    pub fn sniff(path: &Path) -> Result<Option<String>, CompressError> {
        let classification = |source| CompressError::Classification {
            path: path.to_path_buf(),
            source,
        };

        if !std::fs::metadata(path).map_err(classification)?.is_file() {
            return Ok(None);
        }

        let file = File::open(path).map_err(classification)?;
        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN)
            .read_to_end(&mut header)
            .map_err(classification)?;

        Ok(infer::get(&header).map(|kind| kind.mime_type().to_string()))
    }
}
