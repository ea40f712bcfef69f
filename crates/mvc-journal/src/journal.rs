use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{JournalError, JournalResult};
use crate::mutation::Transaction;

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every transaction (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    #[default]
    OsDefault,
}

/// Where the journal lives and how hard it syncs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub sync_mode: SyncMode,
}

impl JournalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_mode: SyncMode::default(),
        }
    }
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Largest payload a single frame may carry.
pub const MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

struct JournalWriter {
    writer: BufWriter<File>,
    /// Current end of the journal file.
    offset: u64,
}

/// Crash-recoverable transaction journal.
///
/// On-disk format, one frame per transaction:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Transaction)]
/// ```
///
/// On recovery the file is read front-to-back. Frames that fail the CRC
/// check are skipped; a frame whose length runs past the end of the file is
/// a torn tail and ends recovery.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    sync_mode: SyncMode,
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}

impl Journal {
    /// Open (or create) the journal file named by `config`.
    pub fn open(config: &JournalConfig) -> JournalResult<Self> {
        let path = config.path.as_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset,
            }),
            sync_mode: config.sync_mode,
        })
    }

    fn lock(&self) -> JournalResult<MutexGuard<'_, JournalWriter>> {
        self.writer
            .lock()
            .map_err(|e| JournalError::LockPoisoned(e.to_string()))
    }

    /// Append one transaction. Returns the byte offset of its frame.
    pub fn append(&self, txn: &Transaction) -> JournalResult<u64> {
        let frame = encode_frame(txn)?;

        let mut w = self.lock()?;
        let frame_offset = w.offset;
        w.writer.write_all(&frame)?;
        w.writer.flush()?;
        if self.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_all()?;
        }
        w.offset += frame.len() as u64;

        debug!(
            offset = frame_offset,
            seq = txn.seq,
            mutations = txn.len(),
            len = frame.len(),
            "journal append"
        );
        Ok(frame_offset)
    }

    /// Read every intact transaction, in commit order.
    pub fn recover(&self) -> JournalResult<Vec<Transaction>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut txns = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
                warn!(offset, length, file_len, "torn journal frame; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal frame; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            offset += HEADER_SIZE as u64 + length as u64;

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping journal frame"
                );
                continue;
            }

            match bincode::deserialize::<Transaction>(&payload) {
                Ok(txn) => txns.push(txn),
                Err(e) => warn!(offset, error = %e, "undecodable journal frame; skipping"),
            }
        }

        debug!(recovered = txns.len(), "journal recovery complete");
        Ok(txns)
    }

    /// Replace the journal's contents with `txns`.
    ///
    /// The new contents are written to a sibling file and renamed over the
    /// journal, so a crash mid-rewrite leaves the old journal intact.
    pub fn rewrite(&self, txns: &[Transaction]) -> JournalResult<()> {
        let mut w = self.lock()?;
        let staging = self.path.with_extension("compact");

        let mut written: u64 = 0;
        {
            let mut out = BufWriter::new(File::create(&staging)?);
            for txn in txns {
                let frame = encode_frame(txn)?;
                out.write_all(&frame)?;
                written += frame.len() as u64;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        fs::rename(&staging, &self.path)?;

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        w.writer = BufWriter::new(file);
        w.offset = written;

        debug!(transactions = txns.len(), bytes = written, "journal rewritten");
        Ok(())
    }

    /// Remove all data from the journal.
    pub fn truncate(&self) -> JournalResult<()> {
        let mut w = self.lock()?;
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        drop(file);

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        w.writer = BufWriter::new(file);
        w.offset = 0;

        debug!("journal truncated");
        Ok(())
    }

    /// Current size of the journal in bytes.
    pub fn offset(&self) -> JournalResult<u64> {
        Ok(self.lock()?.offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn encode_frame(txn: &Transaction) -> JournalResult<Vec<u8>> {
    let payload =
        bincode::serialize(txn).map_err(|e| JournalError::Serialization(e.to_string()))?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(JournalError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
