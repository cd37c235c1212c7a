//! # Pipeline Module
//!
//! Pool di compressione separato in sottomoduli:
//! - `messages`: Comandi e eventi scambiati tra coordinator e worker
//! - `worker`: Worker che comprime un file alla volta con due codec
//! - `coordinator`: Orchestratore del pool e aggregazione statistiche

pub mod coordinator;
pub mod messages;
pub mod worker;

pub use coordinator::{PoolCoordinator, PoolState};
pub use messages::{CompressionResult, Outcome, WorkerCommand, WorkerEvent};
pub use worker::{compress_file, CompressionWorker, WorkerState};
