//! # Asset Precompressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `classifier`: Eleggibilità dei file (estensione o content type)
//! - `walker`: Discovery ricorsiva dei file sotto una o più root
//! - `codec`: Brotli e gzip in streaming a chunk da 32 KiB
//! - `pipeline`: Worker pool, protocollo di shutdown e aggregazione
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Output JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use asset_precompressor::{Config, PoolCoordinator};
//!
//! let coordinator = PoolCoordinator::new(Config::default())?;
//! let stats = coordinator.run(&[PathBuf::from("dist")]).await?;
//! ```

pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod pipeline;
pub mod progress;
pub mod walker;

pub use classifier::{ContentClassifier, EligibilityRule};
pub use codec::{Codec, CodecSettings};
pub use config::Config;
pub use error::CompressError;
pub use pipeline::{CompressionResult, PoolCoordinator};
pub use progress::CompressionStats;
pub use walker::DirectoryWalker;
