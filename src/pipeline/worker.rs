//! # Compression Worker Module
//!
//! Worker isolato che riceve path dal coordinator e produce i sidecar `.br` e `.gz`.
//!
//! ## Stati:
//! | Stato      | Input         | Azione                               | Prossimo stato |
//! |------------|---------------|--------------------------------------|----------------|
//! | Running    | `Compress`    | comprime il file, invia `Completed`  | Running        |
//! | Running    | `Shutdown`    | chiude il canale di input            | Terminated     |
//! | Terminated | canale chiuso | invia `Stopped`                      | Terminated     |
//!
//! ## Compressione per file:
//! 1. Legge la dimensione dai metadata; file vuoti vengono saltati
//! 2. Apre un solo stream di lettura e lo distribuisce a chunk di 32 KiB su due pipeline
//! 3. Le pipeline (brotli e gzip) girano in parallelo su thread bloccanti
//! 4. Attende entrambe senza short-circuit: il fallimento di una non cancella l'altra
//! 5. Rilegge la dimensione dei sidecar dai metadata
//!
//! I file di un worker vengono processati in ordine di arrivo, uno alla volta.

use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::codec::{run_pipeline, Chunk, ChunkReader, Codec, CodecSettings, ReadFailure};
use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::pipeline::messages::{CompressionResult, WorkerCommand, WorkerEvent};

/// Chunks buffered per pipeline before the source reader waits
const PIPELINE_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Terminated,
}

/// One execution unit of the pool
pub struct CompressionWorker {
    id: usize,
    state: WorkerState,
    commands: mpsc::UnboundedReceiver<WorkerCommand>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    settings: Arc<CodecSettings>,
}

impl CompressionWorker {
    pub fn new(
        id: usize,
        commands: mpsc::UnboundedReceiver<WorkerCommand>,
        events: mpsc::UnboundedSender<WorkerEvent>,
        settings: Arc<CodecSettings>,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Running,
            commands,
            events,
            settings,
        }
    }

    /// Process commands until the input channel is closed, then acknowledge with `Stopped`
    pub async fn run(mut self) -> WorkerState {
        debug!("Worker {} started", self.id);

        while let Some(command) = self.commands.recv().await {
            match (self.state, command) {
                (WorkerState::Running, WorkerCommand::Compress(path)) => {
                    let result = compress_file(&path, &self.settings).await;
                    let event = WorkerEvent::Completed {
                        worker: self.id,
                        result,
                    };
                    if self.events.send(event).is_err() {
                        warn!("Worker {}: coordinator gone, result for {} dropped", self.id, path.display());
                    }
                }
                (WorkerState::Running, WorkerCommand::Shutdown) => {
                    debug!("Worker {} received shutdown", self.id);
                    self.commands.close();
                    self.state = WorkerState::Terminated;
                }
                (WorkerState::Terminated, command) => {
                    warn!("Worker {} ignoring {:?} after shutdown", self.id, command);
                }
            }
        }

        self.state = WorkerState::Terminated;
        if self.events.send(WorkerEvent::Stopped { worker: self.id }).is_err() {
            warn!("Worker {}: coordinator gone before stop acknowledgment", self.id);
        }
        debug!("Worker {} stopped", self.id);
        self.state
    }
}

/// Write `<path>.br` and `<path>.gz` and report their sizes.
///
/// Never fails as a whole: every problem ends up in the returned result.
pub async fn compress_file(path: &Path, settings: &CodecSettings) -> CompressionResult {
    let original_size = match FileManager::get_file_size(path).await {
        Ok(size) => size,
        Err(e) => {
            error!("Failed to read metadata for {}: {}", path.display(), e);
            return CompressionResult::failed(path.to_path_buf(), 0, e);
        }
    };

    if original_size == 0 {
        info!("File is empty skipping compression: {}", path.display());
        return CompressionResult::empty(path.to_path_buf());
    }

    let source = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return CompressionResult::failed(path.to_path_buf(), original_size, e);
        }
    };

    let (brotli_tx, brotli_task) = spawn_pipeline(Codec::Brotli, path, settings);
    let (gzip_tx, gzip_task) = spawn_pipeline(Codec::Gzip, path, settings);

    let ((), brotli_outcome, gzip_outcome) = tokio::join!(
        pump_source(source, settings.chunk_size, vec![brotli_tx, gzip_tx]),
        brotli_task,
        gzip_task,
    );

    let mut result = CompressionResult {
        path: path.to_path_buf(),
        original_size,
        brotli_size: None,
        gzip_size: None,
        error: None,
    };

    for (codec, outcome) in [(Codec::Brotli, brotli_outcome), (Codec::Gzip, gzip_outcome)] {
        match settle(codec, path, outcome).await {
            Ok(size) => match codec {
                Codec::Brotli => result.brotli_size = Some(size),
                Codec::Gzip => result.gzip_size = Some(size),
            },
            Err(e) => {
                error!("{}", e);
                result.error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    result
}

fn spawn_pipeline(
    codec: Codec,
    source: &Path,
    settings: &CodecSettings,
) -> (mpsc::Sender<Chunk>, JoinHandle<io::Result<()>>) {
    let (tx, rx) = mpsc::channel(PIPELINE_DEPTH);
    let output = codec.sidecar_path(source);
    let settings = settings.clone();
    let task = tokio::task::spawn_blocking(move || {
        run_pipeline(codec, &settings, ChunkReader::new(rx), &output)
    });
    (tx, task)
}

/// Read the source once and hand every chunk to each live pipeline.
///
/// A pipeline that hangs up is dropped from the fan-out; the others keep receiving.
async fn pump_source(mut source: File, chunk_size: usize, sinks: Vec<mpsc::Sender<Chunk>>) {
    let mut sinks: Vec<Option<mpsc::Sender<Chunk>>> = sinks.into_iter().map(Some).collect();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let chunk: Chunk = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => Ok(Arc::from(&buf[..n])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(ReadFailure::from(&e)),
        };
        let read_failed = chunk.is_err();

        for slot in sinks.iter_mut() {
            let delivered = match slot {
                Some(sink) => sink.send(chunk.clone()).await.is_ok(),
                None => continue,
            };
            if !delivered {
                *slot = None;
            }
        }

        if read_failed || sinks.iter().all(Option::is_none) {
            break;
        }
    }
}

/// Map one pipeline's outcome to the sidecar size on disk
async fn settle(
    codec: Codec,
    path: &Path,
    outcome: Result<io::Result<()>, JoinError>,
) -> Result<u64, CompressError> {
    let sidecar = codec.sidecar_path(path);
    let stream_error = |source| CompressError::Stream {
        codec,
        path: path.to_path_buf(),
        source,
    };

    let finished = match outcome {
        Ok(result) => result.map_err(stream_error),
        Err(join_error) => Err(CompressError::WorkerPanicked(join_error)),
    };

    match finished {
        Ok(()) => {
            let size = FileManager::get_file_size(&sidecar).await.map_err(stream_error)?;
            info!("Written to {}", sidecar.display());
            debug!(
                "{} {} -> {}",
                codec,
                sidecar.display(),
                FileManager::format_size(size)
            );
            Ok(size)
        }
        Err(e) => {
            FileManager::remove_partial(&sidecar).await;
            Err(e)
        }
    }
}
