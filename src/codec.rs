//! # Codec Module
//!
//! Questo modulo contiene i due codec applicati ad ogni file e le pipeline sincrone
//! che li eseguono.
//!
//! ## Responsabilità:
//! - `Codec`: Brotli (`.br`) e gzip (`.gz`), con estensione del sidecar
//! - `CodecSettings`: Parametri fissi dei codec (qualità, livello, chunk size)
//! - `ChunkReader`: Adatta un canale di chunk in un `std::io::Read`
//! - `run_pipeline()`: Comprime uno stream di chunk in un file sidecar
//!
//! ## Parametri di default:
//! - Brotli: quality 11, window 22, modalità TEXT
//! - gzip: livello 8
//! - Chunk: 32 KiB in lettura e in scrittura
//!
//! Le pipeline sono CPU-bound e vanno eseguite fuori dal runtime async
//! (`tokio::task::spawn_blocking`).

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brotli::enc::backward_references::{BrotliEncoderMode, BrotliEncoderParams};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Chunk size for source reads and sidecar write buffers
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Highest brotli quality level
pub const BROTLI_MAX_QUALITY: u32 = 11;

/// Compression algorithm producing one sidecar file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Brotli,
    Gzip,
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::Brotli, Codec::Gzip];

    /// Sidecar file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Brotli => "br",
            Codec::Gzip => "gz",
        }
    }

    /// `<source>.<ext>`, next to the source file
    pub fn sidecar_path(self, source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_owned();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Brotli => f.write_str("brotli"),
            Codec::Gzip => f.write_str("gzip"),
        }
    }
}

/// Fixed codec parameters shared by every worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Brotli quality (0-11)
    pub brotli_quality: u32,
    /// Brotli log2 window size (10-24)
    pub brotli_window: u32,
    /// gzip level (0-9)
    pub gzip_level: u32,
    /// Buffer size for reads and writes
    pub chunk_size: usize,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            brotli_quality: BROTLI_MAX_QUALITY,
            brotli_window: 22,
            gzip_level: 8,
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl CodecSettings {
    fn brotli_params(&self) -> BrotliEncoderParams {
        let mut params = BrotliEncoderParams::default();
        params.quality = self.brotli_quality as i32;
        params.lgwin = self.brotli_window as i32;
        params.mode = BrotliEncoderMode::BROTLI_MODE_TEXT;
        params
    }
}

/// Read error on the source stream, copied to every pipeline fed by it
#[derive(Debug, Clone)]
pub struct ReadFailure {
    kind: io::ErrorKind,
    message: String,
}

impl From<&io::Error> for ReadFailure {
    fn from(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ReadFailure> for io::Error {
    fn from(failure: ReadFailure) -> Self {
        io::Error::new(failure.kind, failure.message)
    }
}

/// One piece of the source stream
pub type Chunk = std::result::Result<Arc<[u8]>, ReadFailure>;

/// Blocking `Read` over a channel of chunks.
///
/// Returns EOF once every sender is dropped. Must not be used from async context.
pub struct ChunkReader {
    chunks: mpsc::Receiver<Chunk>,
    current: Arc<[u8]>,
    offset: usize,
}

impl ChunkReader {
    pub fn new(chunks: mpsc::Receiver<Chunk>) -> Self {
        Self {
            chunks,
            current: Arc::from(Vec::new()),
            offset: 0,
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.offset >= self.current.len() {
            match self.chunks.blocking_recv() {
                Some(Ok(chunk)) => {
                    self.current = chunk;
                    self.offset = 0;
                }
                Some(Err(failure)) => return Err(failure.into()),
                None => return Ok(0),
            }
        }
        let remaining = &self.current[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        Ok(n)
    }
}

/// Compress everything `input` yields into `output` with `codec`.
///
/// `output` is created or truncated. On error the partial file is left in place;
/// callers decide whether to remove it.
pub fn run_pipeline<R: Read>(
    codec: Codec,
    settings: &CodecSettings,
    mut input: R,
    output: &Path,
) -> io::Result<()> {
    let file = File::create(output)?;
    let mut sink = BufWriter::with_capacity(settings.chunk_size, file);

    match codec {
        Codec::Brotli => {
            brotli::enc::BrotliCompress(&mut input, &mut sink, &settings.brotli_params())?;
        }
        Codec::Gzip => {
            let mut encoder = GzEncoder::new(&mut sink, Compression::new(settings.gzip_level));
            io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
        }
    }

    sink.flush()
}
