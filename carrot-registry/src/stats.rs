//! Ledger statistics.

use serde::{Deserialize, Serialize};

use carrot_core::{EnoteRecord, EnoteVariant};

/// Counts of the records a ledger holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// All records.
    pub total_count: u64,
    /// Carrot standard enotes.
    pub carrot: u64,
    /// Carrot coinbase enotes.
    pub carrot_coinbase: u64,
    /// Pre-Carrot enotes.
    pub legacy: u64,
    /// Seraphis standard enotes.
    pub seraphis: u64,
    /// Seraphis coinbase enotes.
    pub seraphis_coinbase: u64,
    /// Lowest block seen.
    pub min_block: Option<u64>,
    /// Highest block seen.
    pub max_block: Option<u64>,
}

impl LedgerStats {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one stored record.
    pub fn add(&mut self, record: &EnoteRecord) {
        self.total_count += 1;
        let counter = match record.enote {
            EnoteVariant::Carrot(_) => &mut self.carrot,
            EnoteVariant::CarrotCoinbase(_) => &mut self.carrot_coinbase,
            EnoteVariant::Legacy(_) => &mut self.legacy,
            EnoteVariant::Seraphis(_) => &mut self.seraphis,
            EnoteVariant::SeraphisCoinbase(_) => &mut self.seraphis_coinbase,
        };
        *counter += 1;

        let block = record.block_index;
        self.min_block = Some(self.min_block.map_or(block, |b| b.min(block)));
        self.max_block = Some(self.max_block.map_or(block, |b| b.max(block)));
    }

    /// Number of blocks spanned, zero when empty.
    pub fn block_span(&self) -> u64 {
        match (self.min_block, self.max_block) {
            (Some(lo), Some(hi)) => hi - lo + 1,
            _ => 0,
        }
    }
}
