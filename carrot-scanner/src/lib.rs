//! # Carrot Scanner
//!
//! Batch scanning of ledger enotes against one account.
//!
//! ## Features
//!
//! - **Batch Processing**: enotes are cut into fixed-size batches
//! - **Parallel Workers**: each round scans up to `workers` batches on scoped threads
//! - **Deterministic Output**: discoveries are re-sorted by ledger id
//! - **Cancellation**: a [`CancelToken`] is honoured between rounds
//! - **Progress Reporting**: callbacks after every round
//! - **Resumable Scans**: a [`ScanPosition`] records the last consumed id
//!
//! Per-enote failures never abort a batch. Janus rejections, foreign enotes
//! and device errors are counted in [`ScanStats`] and scanning continues;
//! only configuration errors stop the scan.
//!
//! ## Example
//!
//! ```rust,ignore
//! use carrot_scanner::{BatchScanner, ScannerConfig};
//! use carrot_registry::MemoryLedger;
//!
//! let scanner = BatchScanner::new(&devices, ScannerConfig::from_env()?)?;
//! let outcome = scanner.scan_ledger(&ledger, None).await?;
//!
//! for found in &outcome.discoveries {
//!     println!("{} at block {}", found.amount(), found.block_index);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;

pub use config::{ScannerConfig, ENV_BATCH_SIZE, ENV_VIEW_TAG_PRIMARY_BITS, ENV_WORKERS};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use carrot_core::error::{CarrotError, Result};
use carrot_core::traits::{EnoteLedger, ProgressCallback, ScanProgress};
use carrot_core::types::{EnoteRecord, EnoteVariant, KeyImage};
use carrot_keys::{AccountDevices, LegacySubaddressTable};
use carrot_stealth::{EnoteScanner, IntermediateRecord, OpeningHint, ScanResult, ScanStats};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan position for resumable scanning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPosition {
    /// Last consumed ledger id
    pub last_id: u64,
    /// Block of the last scanned record
    pub last_block: u64,
    /// Total enotes scanned
    pub total_scanned: u64,
    /// Total discoveries
    pub total_discoveries: u64,
}

impl ScanPosition {
    /// Creates a new scan position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates position after scanning a record.
    pub fn update(&mut self, record: &EnoteRecord, discovered: bool) {
        self.advance_to(record.id);
        self.last_block = record.block_index;
        self.total_scanned += 1;
        if discovered {
            self.total_discoveries += 1;
        }
    }

    /// Marks ids up to `id` as consumed without scanning them.
    pub fn advance_to(&mut self, id: u64) {
        self.last_id = self.last_id.max(id);
    }

    /// First ledger id not yet consumed.
    pub fn next_id(&self) -> u64 {
        self.last_id + 1
    }
}

/// Cooperative cancellation flag shared with a running scan.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the scan stops at the next round boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// An owned enote found by the scanner.
#[derive(Clone, Debug)]
pub struct Discovery {
    /// Ledger id of the record
    pub record_id: u64,
    /// Block of the record
    pub block_index: u64,
    /// The enote
    pub enote: EnoteVariant,
    /// What scanning recovered
    pub record: IntermediateRecord,
    /// Key image, when the scanner was configured to derive them
    pub key_image: Option<KeyImage>,
}

impl Discovery {
    fn new(source: &EnoteRecord, record: IntermediateRecord, key_image: Option<KeyImage>) -> Self {
        Self {
            record_id: source.id,
            block_index: source.block_index,
            enote: source.enote,
            record,
            key_image,
        }
    }

    /// Cleartext amount.
    pub fn amount(&self) -> u64 {
        self.record.amount
    }

    /// Opening hint for spending this enote.
    pub fn opening_hint(&self) -> Result<OpeningHint> {
        OpeningHint::from_record(&self.enote, &self.record)
    }
}

/// Result of one scan call.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    /// Discoveries, ordered by ledger id
    pub discoveries: Vec<Discovery>,
    /// Statistics of this call only
    pub stats: ScanStats,
    /// Whether the scan stopped on a cancellation request
    pub cancelled: bool,
    /// Whether the scan stopped at the first discovery
    pub stopped_early: bool,
}

impl ScanOutcome {
    /// Summary of this call.
    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from(self.stats.clone())
    }
}

/// Scan result summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of enotes scanned
    pub total_scanned: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// Number of owned enotes discovered
    pub discoveries: u64,
    /// Enotes dropped by Janus protection
    pub janus_rejections: u64,
    /// Enotes no held device could scan
    pub skipped: u64,
    /// Number of errors
    pub errors: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Scan rate (enotes per second)
    pub rate: f64,
    /// Filter efficiency (% rejected by view tag)
    pub filter_efficiency: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            total_scanned: stats.total_scanned,
            view_tag_matches: stats.view_tag_matches,
            discoveries: stats.discoveries,
            janus_rejections: stats.janus_rejections,
            skipped: stats.skipped,
            errors: stats.errors,
            duration_ms: stats.duration_ms,
            rate: stats.rate(),
            filter_efficiency: stats.filter_efficiency(),
        }
    }
}

#[derive(Default)]
struct BatchOutput {
    discoveries: Vec<Discovery>,
    stats: ScanStats,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Scans ledger records in parallel batches.
///
/// Device calls are synchronous; workers are scoped OS threads so the scanner
/// runs the same under any async runtime or none.
pub struct BatchScanner<'a> {
    scanner: EnoteScanner<'a>,
    config: ScannerConfig,
    position: RwLock<ScanPosition>,
    stats: RwLock<ScanStats>,
    cancel: CancelToken,
}

impl<'a> BatchScanner<'a> {
    /// Creates a scanner for one account.
    ///
    /// # Errors
    /// `ConfigError` if `config` is invalid.
    pub fn new(devices: &'a AccountDevices, config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scanner: EnoteScanner::new(devices).with_view_tag_split(config.view_tag_split),
            config,
            position: RwLock::new(ScanPosition::new()),
            stats: RwLock::new(ScanStats::new()),
            cancel: CancelToken::new(),
        })
    }

    /// Enables legacy subaddress lookup.
    pub fn with_legacy_table(mut self, table: &'a LegacySubaddressTable) -> Self {
        self.scanner = self.scanner.with_legacy_table(table);
        self
    }

    /// Resumes from a saved position.
    pub fn with_position(self, position: ScanPosition) -> Self {
        *self.position.write() = position;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Token that cancels scans of this scanner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns the current scan position.
    pub fn position(&self) -> ScanPosition {
        self.position.read().clone()
    }

    /// Returns statistics accumulated over all scans.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Resets position and statistics.
    pub fn reset_position(&self) {
        *self.position.write() = ScanPosition::new();
        *self.stats.write() = ScanStats::new();
    }

    /// Scans a single record without touching the position.
    pub fn scan_one(&self, record: &EnoteRecord) -> Result<ScanResult<Discovery>> {
        let result = self.scan_record(record);
        self.stats.write().record(&result);
        result
    }

    /// Scans a slice of records.
    ///
    /// Records outside the configured block range are ignored. The slice
    /// need not be sorted.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn scan_records(
        &self,
        records: &[EnoteRecord],
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<ScanOutcome> {
        let start = Instant::now();
        let mut pending: Vec<EnoteRecord> = records
            .iter()
            .filter(|r| self.config.includes_block(r.block_index))
            .copied()
            .collect();
        pending.sort_by_key(|r| r.id);

        info!(
            total = pending.len(),
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            "Starting batch scan"
        );

        let mut progress = ScanProgress {
            total: pending.len() as u64,
            ..ScanProgress::default()
        };
        let mut outcome = ScanOutcome::default();
        self.run(&pending, &mut progress, progress_callback, &mut outcome)?;

        self.finish(&mut outcome, start);
        Ok(outcome)
    }

    /// Scans a ledger from the current position to its end.
    ///
    /// Device work runs on the calling thread's scope; callers on an async
    /// runtime that must not block should drive this from a blocking context.
    #[instrument(skip_all)]
    pub async fn scan_ledger(
        &self,
        ledger: &dyn EnoteLedger,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<ScanOutcome> {
        let start = Instant::now();
        let page_size = self.config.round_size();
        let total = ledger.count().await?;
        let mut progress = ScanProgress {
            total,
            scanned: self.position.read().total_scanned,
            ..ScanProgress::default()
        };
        let mut outcome = ScanOutcome::default();

        info!(
            from_id = self.position.read().next_id(),
            total = progress.total,
            "Starting ledger scan"
        );

        loop {
            let next_id = self.position.read().next_id();
            let page = ledger.get_range(next_id, page_size).await?;
            let last_id = match page.last() {
                Some(record) => record.id,
                None => break,
            };

            let in_range: Vec<EnoteRecord> = page
                .iter()
                .filter(|r| self.config.includes_block(r.block_index))
                .copied()
                .collect();
            progress.scanned += (page.len() - in_range.len()) as u64;

            if !self.run(&in_range, &mut progress, progress_callback, &mut outcome)? {
                break;
            }
            self.position.write().advance_to(last_id);
        }

        self.finish(&mut outcome, start);
        Ok(outcome)
    }

    /// Scans `records` round by round. Returns false when the scan stopped
    /// early.
    fn run(
        &self,
        records: &[EnoteRecord],
        progress: &mut ScanProgress,
        progress_callback: Option<&ProgressCallback>,
        outcome: &mut ScanOutcome,
    ) -> Result<bool> {
        for round in records.chunks(self.config.round_size()) {
            if self.cancel.is_cancelled() {
                info!(position = self.position.read().last_id, "Scan cancelled");
                outcome.cancelled = true;
                return Ok(false);
            }

            let batches: Vec<&[EnoteRecord]> = round.chunks(self.config.batch_size).collect();
            let mut output = self.scan_round(&batches)?;

            let cutoff = if self.config.stop_on_first {
                output.discoveries.first().map(|d| d.record_id)
            } else {
                None
            };
            if cutoff.is_some() {
                output.discoveries.truncate(1);
            }

            {
                let mut position = self.position.write();
                for record in round
                    .iter()
                    .take_while(|r| cutoff.map_or(true, |id| r.id <= id))
                {
                    let discovered = output.discoveries.iter().any(|d| d.record_id == record.id);
                    position.update(record, discovered);
                }
            }
            self.stats.write().merge(&output.stats);
            outcome.stats.merge(&output.stats);

            progress.scanned += round.len() as u64;
            progress.matched_view_tag += output.stats.view_tag_matches;
            progress.discoveries += output.discoveries.len() as u64;
            if let Some(callback) = progress_callback {
                callback(progress.clone());
            }

            debug!(
                round = round.len(),
                discoveries = output.discoveries.len(),
                "Round complete"
            );
            outcome.discoveries.extend(output.discoveries);

            if cutoff.is_some() {
                info!("Stopping on first discovery");
                outcome.stopped_early = true;
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn scan_round(&self, batches: &[&[EnoteRecord]]) -> Result<BatchOutput> {
        let outputs: Vec<Result<BatchOutput>> = if batches.len() <= 1 {
            batches.iter().map(|batch| self.scan_batch(batch)).collect()
        } else {
            thread::scope(|scope| {
                let handles: Vec<_> = batches
                    .iter()
                    .map(|batch| scope.spawn(move || self.scan_batch(batch)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(CarrotError::InternalError("scan worker panicked".into()))
                        })
                    })
                    .collect()
            })
        };

        let mut merged = BatchOutput::default();
        for output in outputs {
            let output = output?;
            merged.stats.merge(&output.stats);
            merged.discoveries.extend(output.discoveries);
        }
        merged.discoveries.sort_by_key(|d| d.record_id);
        Ok(merged)
    }

    fn scan_batch(&self, batch: &[EnoteRecord]) -> Result<BatchOutput> {
        let mut output = BatchOutput::default();
        for record in batch {
            let result = self.scan_record(record);
            output.stats.record(&result);
            match result {
                Ok(ScanResult::Owned(discovery)) => output.discoveries.push(discovery),
                Ok(ScanResult::JanusRejected) => {
                    warn!(id = record.id, "Enote failed Janus protection");
                }
                Ok(_) => {}
                Err(e) if e.is_configuration_error() => return Err(e),
                Err(e) => warn!(id = record.id, error = %e, "Enote scan failed"),
            }
        }
        Ok(output)
    }

    fn scan_record(&self, record: &EnoteRecord) -> Result<ScanResult<Discovery>> {
        if self.config.key_images {
            Ok(self
                .scanner
                .scan_enote_full(&record.enote)?
                .map(|full| Discovery::new(record, full.record, Some(full.key_image))))
        } else {
            Ok(self
                .scanner
                .scan_enote(&record.enote)?
                .map(|found| Discovery::new(record, found, None)))
        }
    }

    fn finish(&self, outcome: &mut ScanOutcome, start: Instant) {
        let duration_ms = start.elapsed().as_millis() as u64;
        outcome.stats.duration_ms = duration_ms;
        self.stats.write().duration_ms += duration_ms;

        info!(
            discoveries = outcome.discoveries.len(),
            scanned = outcome.stats.total_scanned,
            janus_rejections = outcome.stats.janus_rejections,
            duration_ms,
            rate = format!("{:.2}/s", outcome.stats.rate()),
            "Scan complete"
        );
    }
}
