//! # Carrot Registry
//!
//! Enote ledger storage for the Carrot scanner.
//!
//! Two backends implement [`EnoteLedger`]:
//!
//! - **Memory**: concurrent in-memory storage for tests and single-process use
//! - **File**: the memory ledger persisted to a single file
//!
//! ## Example
//!
//! ```rust,ignore
//! use carrot_core::EnoteRecord;
//! use carrot_registry::{EnoteLedger, MemoryLedger};
//!
//! let ledger = MemoryLedger::new();
//! let id = ledger.publish(EnoteRecord::new(block, enote)).await?;
//!
//! // Scanners page through the ledger by id
//! let page = ledger.get_range(id, 1024).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;
mod stats;

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use stats::LedgerStats;

pub use carrot_core::traits::EnoteLedger;
