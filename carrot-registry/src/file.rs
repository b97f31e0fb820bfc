//! File-backed enote ledger.
//!
//! Wraps a [`MemoryLedger`] and persists it to a single file with
//! periodic automatic saves.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use carrot_core::error::{CarrotError, Result};
use carrot_core::traits::EnoteLedger;
use carrot_core::types::{EnoteRecord, OnetimeAddress};

use crate::{LedgerStats, MemoryLedger};

/// File format magic bytes
const MAGIC: &[u8; 4] = b"CRRT";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + count
const HEADER_LEN: usize = 13;

/// File-backed enote ledger.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "CRRT"
/// version (1 byte): 1
/// count (8 bytes, LE): number of records
/// records (variable): JSON array of records
/// ```
pub struct FileLedger {
    path: PathBuf,
    memory: MemoryLedger,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Save after this many writes
    auto_save_threshold: u64,
    writes_since_save: AtomicU64,
}

fn io_error(context: &str, err: std::io::Error) -> CarrotError {
    CarrotError::LedgerError(format!("{context}: {err}"))
}

impl FileLedger {
    /// Opens the ledger at `path`, loading it if the file exists.
    ///
    /// The file is created on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let ledger = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryLedger::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: 100,
            writes_since_save: AtomicU64::new(0),
        };

        if ledger.path.exists() {
            ledger.load().await?;
        }

        Ok(ledger)
    }

    /// Opens a ledger with a custom auto-save threshold.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut ledger = Self::new(path).await?;
        ledger.auto_save_threshold = threshold;
        Ok(ledger)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path)
            .await
            .map_err(|e| io_error("failed to read ledger file", e))?;

        if contents.len() < HEADER_LEN {
            return Err(CarrotError::LedgerError("file too short".into()));
        }
        if &contents[0..4] != MAGIC {
            return Err(CarrotError::LedgerError("invalid magic bytes".into()));
        }
        if contents[4] != VERSION {
            return Err(CarrotError::LedgerError(format!(
                "unsupported file version {} (expected {VERSION})",
                contents[4]
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
        let count = u64::from_le_bytes(count_bytes);
        info!(count, "Loading enotes from file");

        let records: Vec<EnoteRecord> = if contents.len() > HEADER_LEN {
            serde_json::from_slice(&contents[HEADER_LEN..])?
        } else {
            Vec::new()
        };
        if records.len() as u64 != count {
            return Err(CarrotError::LedgerError(format!(
                "header says {count} records, body has {}",
                records.len()
            )));
        }

        self.memory.import(records)?;
        self.dirty.store(false, Ordering::SeqCst);
        debug!("Ledger loaded");
        Ok(())
    }

    /// Writes the ledger to disk through a temporary file.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let records = self.memory.all_records();
        let count = records.len() as u64;
        info!(count, "Saving ledger to file");

        let body = serde_json::to_vec(&records)?;
        let mut contents = Vec::with_capacity(HEADER_LEN + body.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&body);

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error("failed to create temp file", e))?;
        file.write_all(&contents)
            .await
            .map_err(|e| io_error("failed to write ledger", e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("failed to sync ledger", e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| io_error("failed to replace ledger file", e))?;

        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);
        debug!("Ledger saved");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Saves if dirty.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory ledger.
    pub fn memory(&self) -> &MemoryLedger {
        &self.memory
    }

    /// Returns statistics.
    pub fn stats(&self) -> LedgerStats {
        self.memory.stats()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn maybe_auto_save(&self) -> Result<()> {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            self.save().await?;
        }
        Ok(())
    }
}

impl Drop for FileLedger {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!(path = ?self.path, "FileLedger dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl EnoteLedger for FileLedger {
    async fn publish(&self, record: EnoteRecord) -> Result<u64> {
        let id = self.memory.publish(record).await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await?;
        Ok(id)
    }

    async fn get_range(&self, start_id: u64, limit: usize) -> Result<Vec<EnoteRecord>> {
        self.memory.get_range(start_id, limit).await
    }

    async fn get_by_block_range(&self, start: u64, end: u64) -> Result<Vec<EnoteRecord>> {
        self.memory.get_by_block_range(start, end).await
    }

    async fn get_by_onetime_address(&self, address: &OnetimeAddress) -> Result<Option<EnoteRecord>> {
        self.memory.get_by_onetime_address(address).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }
}
