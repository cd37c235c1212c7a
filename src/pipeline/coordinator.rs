//! # Pool Coordinator
//!
//! Orchestratore principale: costruisce la lista dei file, avvia il pool di worker,
//! distribuisce il lavoro round-robin e aggrega i risultati.
//!
//! ## Flusso di esecuzione:
//! 1. **Discovery**: Walker + Classifier producono la lista completa in memoria
//! 2. **Pool**: `pool_size` = unità parallele disponibili − 1 (minimo 1)
//! 3. **Dispatch**: il file `i` va al worker `i mod pool_size`
//! 4. **Shutdown**: un `Shutdown` per worker dopo l'ultimo file
//! 5. **Aggregazione**: ogni `Completed` aggiorna i totali, ogni `Stopped` incrementa il contatore
//! 6. **Report**: al `pool_size`-esimo `Stopped` stampa il riepilogo, una sola volta
//!
//! Lo stato del pool vive solo nel loop di gestione messaggi del coordinator:
//! nessun lock, nessuno stato condiviso con i worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::classifier::ContentClassifier;
use crate::config::Config;
use crate::error::{CompressError, Result};
use crate::json_output::JsonMessage;
use crate::pipeline::messages::{CompressionResult, Outcome, WorkerCommand, WorkerEvent};
use crate::pipeline::worker::CompressionWorker;
use crate::progress::{reduction_percent, CompressionStats, ProgressManager};
use crate::walker::DirectoryWalker;

/// Coordinator-owned bookkeeping for one run
#[derive(Debug)]
pub struct PoolState {
    pool_size: usize,
    stopped: usize,
    finished: bool,
    stats: CompressionStats,
}

impl PoolState {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            stopped: 0,
            finished: false,
            stats: CompressionStats::new(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stopped(&self) -> usize {
        self.stopped
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> &CompressionStats {
        &self.stats
    }

    /// Apply one worker event.
    ///
    /// Returns the final totals exactly once, on the `pool_size`-th `Stopped`.
    /// Events arriving after that are ignored.
    pub fn handle_event(&mut self, event: WorkerEvent) -> Option<CompressionStats> {
        if self.finished {
            warn!("Ignoring {:?}: pool already finished", event);
            return None;
        }

        match event {
            WorkerEvent::Completed { worker, result } => {
                debug!("Worker {} completed {}", worker, result.path.display());
                self.stats.add_result(&result);
                None
            }
            WorkerEvent::Stopped { worker } => {
                self.stopped += 1;
                debug!("Worker {} stopped ({}/{})", worker, self.stopped, self.pool_size);
                if self.stopped == self.pool_size {
                    self.finished = true;
                    Some(self.stats.clone())
                } else {
                    None
                }
            }
        }
    }
}

/// Owns the worker pool for one batch run
pub struct PoolCoordinator {
    config: Config,
    classifier: ContentClassifier,
}

impl PoolCoordinator {
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CompressError::Validation(e.to_string()))?;
        let classifier = ContentClassifier::new(config.eligibility.clone());
        Ok(Self { config, classifier })
    }

    /// Walk `roots` and keep the eligible files, in walk order
    pub fn discover(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        eligible_files(&self.walker(roots), &self.classifier)
    }

    fn walker(&self, roots: &[PathBuf]) -> DirectoryWalker {
        DirectoryWalker::new(roots).follow_symlinks(self.config.follow_symlinks)
    }

    /// Compress every eligible file under `roots` and print the summary
    pub async fn run(&self, roots: &[PathBuf]) -> Result<CompressionStats> {
        if roots.is_empty() {
            return Err(CompressError::NoRoots);
        }

        let files = self.discover_blocking(roots).await?;
        let pool_size = self.config.pool_size();
        info!("Found {} files to compress, using {} workers", files.len(), pool_size);

        if self.config.json_output {
            JsonMessage::start(roots.to_vec(), files.len(), pool_size).emit();
        }

        let stats = self.run_pool(files, pool_size).await?;
        self.report(&stats);
        Ok(stats)
    }

    async fn discover_blocking(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let walker = self.walker(roots);
        let classifier = self.classifier.clone();
        let files = tokio::task::spawn_blocking(move || eligible_files(&walker, &classifier)).await?;
        Ok(files)
    }

    /// Spin up `pool_size` workers, feed them `files` round-robin and wait for every ack
    pub async fn run_pool(&self, files: Vec<PathBuf>, pool_size: usize) -> Result<CompressionStats> {
        let pool_size = pool_size.max(1);
        let settings = Arc::new(self.config.codec.clone());
        let progress = self
            .config
            .progress
            .then(|| ProgressManager::new(files.len() as u64));

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut pool = Vec::with_capacity(pool_size);
        let mut handles = Vec::with_capacity(pool_size);

        for id in 0..pool_size {
            let (command_tx, command_rx) = mpsc::unbounded_channel();
            let worker = CompressionWorker::new(id, command_rx, event_tx.clone(), settings.clone());
            handles.push(tokio::spawn(worker.run()));
            pool.push(command_tx);
        }
        // Only workers hold event senders from here on
        drop(event_tx);

        dispatch(&pool, files);

        let mut state = PoolState::new(pool_size);
        let stats = loop {
            let Some(event) = event_rx.recv().await else {
                return Err(CompressError::WorkerLost {
                    stopped: state.stopped(),
                    pool_size,
                });
            };

            if let WorkerEvent::Completed { worker, result } = &event {
                self.observe(*worker, result, progress.as_ref());
            }
            if let Some(stats) = state.handle_event(event) {
                break stats;
            }
        };

        for handle in futures::future::join_all(handles).await {
            handle?;
        }

        if let Some(progress) = progress {
            progress.finish(&stats.format_summary());
        }

        Ok(stats)
    }

    fn observe(&self, worker: usize, result: &CompressionResult, progress: Option<&ProgressManager>) {
        if self.config.json_output {
            JsonMessage::file_complete(worker, result).emit();
        }

        if let Some(progress) = progress {
            progress.update(&progress_message(&result.path, result));
        }
    }

    fn report(&self, stats: &CompressionStats) {
        if stats.files_failed > 0 {
            warn!("{} files failed and are excluded from the totals", stats.files_failed);
        }

        if self.config.json_output {
            JsonMessage::complete(stats).emit();
        } else {
            println!();
            println!("{}", stats);
        }
    }
}

/// File `i` goes to worker `i mod pool.len()`; then one `Shutdown` per worker
fn dispatch(pool: &[mpsc::UnboundedSender<WorkerCommand>], files: Vec<PathBuf>) {
    for (i, path) in files.into_iter().enumerate() {
        let worker = i % pool.len();
        if pool[worker].send(WorkerCommand::Compress(path)).is_err() {
            error!("Worker {} is gone, file not dispatched", worker);
        }
    }

    for (worker, commands) in pool.iter().enumerate() {
        if commands.send(WorkerCommand::Shutdown).is_err() {
            error!("Worker {} is gone before shutdown", worker);
        }
    }
}

fn eligible_files(walker: &DirectoryWalker, classifier: &ContentClassifier) -> Vec<PathBuf> {
    walker
        .files()
        .filter(|path| classifier.is_eligible(path))
        .collect()
}

fn progress_message(path: &Path, result: &CompressionResult) -> String {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    match result.outcome() {
        Outcome::Compressed {
            original_size,
            brotli_size,
            ..
        } => format!(
            "[OK] {}: {:.1}% smaller (br)",
            name,
            reduction_percent(original_size, brotli_size)
        ),
        Outcome::Empty => format!("[SKIP] {}: empty", name),
        Outcome::Failed => format!("[ERROR] {}: error", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecSettings;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn completed(worker: usize, original: u64, br: u64, gz: u64) -> WorkerEvent {
        WorkerEvent::Completed {
            worker,
            result: CompressionResult {
                path: PathBuf::from(format!("/srv/file-{}-{}.js", worker, original)),
                original_size: original,
                brotli_size: Some(br),
                gzip_size: Some(gz),
                error: None,
            },
        }
    }

    #[test]
    fn test_summary_only_after_every_worker_stopped() {
        let mut state = PoolState::new(2);

        // Two workers, four files, interleaved arbitrarily
        assert!(state.handle_event(completed(1, 100, 40, 50)).is_none());
        assert!(state.handle_event(completed(0, 200, 80, 90)).is_none());
        assert!(state.handle_event(WorkerEvent::Stopped { worker: 1 }).is_none());
        assert!(state.handle_event(completed(0, 300, 100, 120)).is_none());
        assert!(!state.is_finished());

        // A late result from worker 0 is counted: it stopped after sending it
        assert!(state.handle_event(completed(0, 400, 100, 150)).is_none());
        let stats = state.handle_event(WorkerEvent::Stopped { worker: 0 }).unwrap();

        assert!(state.is_finished());
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.total_original_bytes, 1000);
        assert_eq!(stats.total_brotli_bytes, 320);
        assert_eq!(stats.total_gzip_bytes, 410);
    }

    #[test]
    fn test_summary_is_produced_once() {
        let mut state = PoolState::new(1);
        assert!(state.handle_event(WorkerEvent::Stopped { worker: 0 }).is_some());
        assert!(state.handle_event(WorkerEvent::Stopped { worker: 0 }).is_none());
        assert!(state.handle_event(completed(0, 10, 5, 5)).is_none());
        assert_eq!(state.stats().total_files, 0);
        assert_eq!(state.stopped(), 1);
    }

    #[tokio::test]
    async fn test_no_roots_is_a_usage_error() {
        let coordinator = PoolCoordinator::new(Config::default()).unwrap();
        let result = coordinator.run(&[]).await;
        assert!(matches!(result, Err(CompressError::NoRoots)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            workers: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            PoolCoordinator::new(config),
            Err(CompressError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_round_robin_pool_counts_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = temp_dir.path().join(format!("chunk-{}.js", i));
                fs::write(&path, format!("export const value{} = '{}';\n", i, "x".repeat(300))).unwrap();
                path
            })
            .collect();

        let coordinator = PoolCoordinator::new(Config::default()).unwrap();
        let stats = coordinator.run_pool(files.clone(), 2).await.unwrap();

        assert_eq!(stats.total_files, 4);
        for file in &files {
            assert!(PathBuf::from(format!("{}.br", file.display())).is_file());
            assert!(PathBuf::from(format!("{}.gz", file.display())).is_file());
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<WorkerCommand>) -> Vec<WorkerCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    #[test]
    fn test_dispatch_is_round_robin_then_shutdown() {
        let (tx0, mut rx0) = mpsc::unbounded_channel();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let files: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("/srv/{}.js", i))).collect();

        dispatch(&[tx0, tx1], files);

        assert_eq!(
            drain(&mut rx0),
            vec![
                WorkerCommand::Compress(PathBuf::from("/srv/0.js")),
                WorkerCommand::Compress(PathBuf::from("/srv/2.js")),
                WorkerCommand::Shutdown,
            ]
        );
        assert_eq!(
            drain(&mut rx1),
            vec![
                WorkerCommand::Compress(PathBuf::from("/srv/1.js")),
                WorkerCommand::Compress(PathBuf::from("/srv/3.js")),
                WorkerCommand::Shutdown,
            ]
        );
    }

    #[test]
    fn test_dispatch_with_no_files_still_shuts_down_every_worker() {
        let (tx0, mut rx0) = mpsc::unbounded_channel();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        dispatch(&[tx0, tx1], Vec::new());
        assert_eq!(drain(&mut rx0), vec![WorkerCommand::Shutdown]);
        assert_eq!(drain(&mut rx1), vec![WorkerCommand::Shutdown]);
    }

    #[tokio::test]
    async fn test_workers_complete_their_assigned_files() {
        let temp_dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = temp_dir.path().join(format!("part-{}.js", i));
                fs::write(&path, format!("const part{} = '{}';\n", i, "y".repeat(200))).unwrap();
                path
            })
            .collect();

        let settings = Arc::new(CodecSettings::default());
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut pool = Vec::new();
        let mut handles = Vec::new();
        for id in 0..2 {
            let (command_tx, command_rx) = mpsc::unbounded_channel();
            let worker = CompressionWorker::new(id, command_rx, event_tx.clone(), settings.clone());
            handles.push(tokio::spawn(worker.run()));
            pool.push(command_tx);
        }
        drop(event_tx);

        dispatch(&pool, files.clone());

        let mut state = PoolState::new(2);
        let mut assigned = HashMap::new();
        let mut completed = 0;
        let mut stopped = 0;
        let stats = loop {
            let event = event_rx.recv().await.unwrap();
            match &event {
                WorkerEvent::Completed { worker, result } => {
                    completed += 1;
                    assigned.insert(result.path.clone(), *worker);
                }
                WorkerEvent::Stopped { .. } => stopped += 1,
            }
            if let Some(stats) = state.handle_event(event) {
                break stats;
            }
        };

        assert_eq!(completed, 4);
        assert_eq!(stopped, 2);
        assert_eq!(stats.total_files, 4);
        for (i, file) in files.iter().enumerate() {
            assert_eq!(assigned[file], i % 2, "{} went to the wrong worker", file.display());
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_more_workers_than_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("only.css");
        fs::write(&path, "body { margin: 0; padding: 0; }\n".repeat(10)).unwrap();

        let coordinator = PoolCoordinator::new(Config::default()).unwrap();
        let stats = coordinator.run_pool(vec![path], 8).await.unwrap();
        assert_eq!(stats.total_files, 1);
    }

    #[test]
    fn test_discover_filters_ineligible_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.js"), "let a = 1;").unwrap();
        fs::write(temp_dir.path().join("b.png"), [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        fs::write(temp_dir.path().join("empty.css"), "").unwrap();

        let coordinator = PoolCoordinator::new(Config::default()).unwrap();
        let mut found = coordinator.discover(&[temp_dir.path().to_path_buf()]);
        found.sort();

        assert_eq!(
            found,
            vec![temp_dir.path().join("a.js"), temp_dir.path().join("empty.css")]
        );
    }
}
