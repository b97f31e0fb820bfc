//! In-memory enote ledger.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use carrot_core::error::{CarrotError, Result};
use carrot_core::traits::EnoteLedger;
use carrot_core::types::{EnoteRecord, OnetimeAddress};

use crate::LedgerStats;

/// In-memory enote ledger.
///
/// # Indexing
///
/// Records are indexed by:
/// - ID: for paging
/// - Onetime address: for duplicate rejection and direct lookup
/// - Block: for block-range queries
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryLedger {
    /// Primary storage: ID → record
    records: DashMap<u64, EnoteRecord>,
    /// Onetime address → ID
    onetime_index: DashMap<OnetimeAddress, u64>,
    /// Block → [record IDs]
    block_index: DashMap<u64, Vec<u64>>,
    /// Next record ID
    next_id: AtomicU64,
    stats: RwLock<LedgerStats>,
}

impl MemoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a ledger with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            onetime_index: DashMap::with_capacity(capacity),
            block_index: DashMap::new(),
            next_id: AtomicU64::new(1),
            stats: RwLock::new(LedgerStats::new()),
        }
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> LedgerStats {
        self.stats.read().clone()
    }

    /// Clears all records.
    pub fn clear(&self) {
        self.records.clear();
        self.onetime_index.clear();
        self.block_index.clear();
        self.next_id.store(1, Ordering::SeqCst);
        *self.stats.write() = LedgerStats::new();
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all records ordered by id (for export/backup).
    pub fn all_records(&self) -> Vec<EnoteRecord> {
        let mut records: Vec<EnoteRecord> =
            self.records.iter().map(|entry| *entry.value()).collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Imports records, keeping their ids when set.
    ///
    /// # Errors
    /// `DuplicateEnote` if a record's onetime address or id is already stored.
    /// Records before the duplicate stay imported.
    pub fn import(&self, records: Vec<EnoteRecord>) -> Result<usize> {
        let mut imported = 0;

        for mut record in records {
            if record.id == 0 {
                record.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            } else if self.records.contains_key(&record.id) {
                return Err(CarrotError::DuplicateEnote(format!("record id {}", record.id)));
            } else {
                self.next_id.fetch_max(record.id + 1, Ordering::SeqCst);
            }

            match self.onetime_index.entry(*record.enote.onetime_address()) {
                Entry::Occupied(entry) => {
                    return Err(CarrotError::DuplicateEnote(entry.key().to_hex()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(record.id);
                }
            }
            self.store(record);
            imported += 1;
        }

        Ok(imported)
    }

    fn store(&self, record: EnoteRecord) {
        self.block_index
            .entry(record.block_index)
            .or_default()
            .push(record.id);
        self.stats.write().add(&record);
        self.records.insert(record.id, record);
    }

    fn collect_ids(&self, mut ids: Vec<u64>) -> Vec<EnoteRecord> {
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.records.get(&id).map(|r| *r))
            .collect()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnoteLedger for MemoryLedger {
    /// Publishes a new record.
    ///
    /// The record is assigned the next id and, when it carries none, the
    /// current time as its timestamp.
    #[instrument(skip(self, record), fields(kind = record.enote.kind(), block = record.block_index))]
    async fn publish(&self, mut record: EnoteRecord) -> Result<u64> {
        let id = match self.onetime_index.entry(*record.enote.onetime_address()) {
            Entry::Occupied(entry) => {
                return Err(CarrotError::DuplicateEnote(entry.key().to_hex()));
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                entry.insert(id);
                id
            }
        };

        record.id = id;
        if record.timestamp == 0 {
            record.timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        }

        debug!(id, "Publishing enote");
        self.store(record);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_range(&self, start_id: u64, limit: usize) -> Result<Vec<EnoteRecord>> {
        let ids: Vec<u64> = self
            .records
            .iter()
            .map(|entry| *entry.key())
            .filter(|id| *id >= start_id)
            .collect();

        let mut records = self.collect_ids(ids);
        records.truncate(limit);

        debug!(start_id, count = records.len(), "Retrieved range");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_by_block_range(&self, start: u64, end: u64) -> Result<Vec<EnoteRecord>> {
        if start > end {
            return Ok(Vec::new());
        }
        let ids: Vec<u64> = self
            .block_index
            .iter()
            .filter(|entry| (start..=end).contains(entry.key()))
            .flat_map(|entry| entry.value().clone())
            .collect();

        let records = self.collect_ids(ids);
        debug!(start, end, count = records.len(), "Retrieved by block range");
        Ok(records)
    }

    async fn get_by_onetime_address(&self, address: &OnetimeAddress) -> Result<Option<EnoteRecord>> {
        let id = match self.onetime_index.get(address) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.records.get(&id).map(|r| *r))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrot_core::{
        CarrotCoinbaseEnote, EncryptedJanusAnchor, EnoteEphemeralPubkey, EnoteVariant, ViewTag,
    };

    fn make_record(seed: u8, block: u64) -> EnoteRecord {
        EnoteRecord::new(
            block,
            EnoteVariant::CarrotCoinbase(CarrotCoinbaseEnote {
                onetime_address: OnetimeAddress::from_array([seed; 32]),
                amount: 1_000,
                anchor_enc: EncryptedJanusAnchor::default(),
                view_tag: ViewTag::default(),
                ephemeral_pubkey: EnoteEphemeralPubkey::default(),
                block_index: block,
            }),
        )
    }

    #[tokio::test]
    async fn test_publish_and_lookup() {
        let ledger = MemoryLedger::new();
        let id = ledger.publish(make_record(1, 10)).await.unwrap();
        assert_eq!(id, 1);

        let found = ledger
            .get_by_onetime_address(&OnetimeAddress::from_array([1; 32]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.block_index, 10);
        assert!(found.timestamp > 0);

        let missing = ledger
            .get_by_onetime_address(&OnetimeAddress::from_array([9; 32]))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_explicit_timestamp_kept() {
        let ledger = MemoryLedger::new();
        let mut record = make_record(1, 10);
        record.timestamp = 1_700_000_000;
        ledger.publish(record).await.unwrap();
        assert_eq!(ledger.all_records()[0].timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_duplicate_onetime_address_rejected() {
        let ledger = MemoryLedger::new();
        ledger.publish(make_record(7, 1)).await.unwrap();

        let result = ledger.publish(make_record(7, 2)).await;
        assert!(matches!(result, Err(CarrotError::DuplicateEnote(_))));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.stats().total_count, 1);
    }

    #[tokio::test]
    async fn test_get_range() {
        let ledger = MemoryLedger::new();
        for seed in 1..=5u8 {
            ledger.publish(make_record(seed, seed as u64)).await.unwrap();
        }

        let page = ledger.get_range(2, 2).await.unwrap();
        let ids: Vec<u64> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let tail = ledger.get_range(4, 100).await.unwrap();
        assert_eq!(tail.len(), 2);

        assert!(ledger.get_range(6, 10).await.unwrap().is_empty());
        assert!(ledger.get_range(1, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_block_range() {
        let ledger = MemoryLedger::new();
        ledger.publish(make_record(1, 100)).await.unwrap();
        ledger.publish(make_record(2, 200)).await.unwrap();
        ledger.publish(make_record(3, 200)).await.unwrap();
        ledger.publish(make_record(4, 300)).await.unwrap();

        let middle = ledger.get_by_block_range(150, 250).await.unwrap();
        let ids: Vec<u64> = middle.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);

        // Inclusive on both ends
        assert_eq!(ledger.get_by_block_range(100, 300).await.unwrap().len(), 4);
        assert!(ledger.get_by_block_range(300, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_and_stats() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.count().await.unwrap(), 0);

        ledger.publish(make_record(1, 5)).await.unwrap();
        ledger.publish(make_record(2, 9)).await.unwrap();
        assert_eq!(ledger.count().await.unwrap(), 2);

        let stats = ledger.stats();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.carrot_coinbase, 2);
        assert_eq!(stats.block_span(), 5);
    }

    #[tokio::test]
    async fn test_clear() {
        let ledger = MemoryLedger::new();
        ledger.publish(make_record(1, 1)).await.unwrap();
        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.stats(), LedgerStats::new());
        // Ids restart and the address can be published again
        assert_eq!(ledger.publish(make_record(1, 1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_export() {
        let source = MemoryLedger::new();
        source.publish(make_record(1, 1)).await.unwrap();
        source.publish(make_record(2, 2)).await.unwrap();

        let records = source.all_records();
        assert_eq!(records.len(), 2);

        let target = MemoryLedger::new();
        assert_eq!(target.import(records.clone()).unwrap(), 2);
        assert_eq!(target.all_records(), records);

        // Next id continues past the imported ones
        assert_eq!(target.publish(make_record(3, 3)).await.unwrap(), 3);

        // Re-importing collides
        assert!(matches!(
            target.import(records),
            Err(CarrotError::DuplicateEnote(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_publish() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let ledger = Arc::new(MemoryLedger::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u8 {
            let ledger = ledger.clone();
            tasks.spawn(async move { ledger.publish(make_record(i, i as u64)).await.unwrap() });
        }

        let mut ids = Vec::new();
        while let Some(result) = tasks.join_next().await {
            ids.push(result.unwrap());
        }

        ids.sort_unstable();
        assert_eq!(ids, (1..=100).collect::<Vec<u64>>());
        assert_eq!(ledger.len(), 100);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_admit_one() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let ledger = Arc::new(MemoryLedger::new());
        let mut tasks = JoinSet::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            tasks.spawn(async move { ledger.publish(make_record(42, 1)).await.is_ok() });
        }

        let mut accepted = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(ledger.len(), 1);
    }
}
