//! Common traits for Carrot.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! enabling modularity and testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EnoteRecord, OnetimeAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of published enotes for the scanner.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - A node RPC client
/// - A local blockchain database
#[async_trait]
pub trait EnoteLedger: Send + Sync {
    /// Publishes an enote. Returns the assigned record id.
    ///
    /// Publishing an onetime address twice is an error.
    async fn publish(&self, record: EnoteRecord) -> Result<u64>;

    /// Returns up to `limit` records with `id >= start_id`, ordered by id.
    async fn get_range(&self, start_id: u64, limit: usize) -> Result<Vec<EnoteRecord>>;

    /// Returns records in blocks `[start, end]`, ordered by id.
    async fn get_by_block_range(&self, start: u64, end: u64) -> Result<Vec<EnoteRecord>>;

    /// Looks up a record by onetime address.
    async fn get_by_onetime_address(&self, address: &OnetimeAddress) -> Result<Option<EnoteRecord>>;

    /// Returns total record count.
    async fn count(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN PROGRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Progress update during scanning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanProgress {
    /// Total enotes to scan
    pub total: u64,
    /// Enotes scanned so far
    pub scanned: u64,
    /// Enotes that passed the view tag filter
    pub matched_view_tag: u64,
    /// Owned enotes found so far
    pub discoveries: u64,
}

impl ScanProgress {
    /// Fraction of work done, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.scanned as f64 / self.total as f64
    }
}

/// Callback for scan progress updates.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_progress() {
        let progress = ScanProgress {
            total: 1000,
            scanned: 500,
            matched_view_tag: 4,
            discoveries: 1,
        };
        assert_eq!(progress.total, 1000);
        assert!((progress.fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(ScanProgress::default().fraction(), 1.0);
    }
}
