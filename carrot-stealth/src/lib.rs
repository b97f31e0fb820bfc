//! # Carrot Stealth
//!
//! Enote construction and discovery for Carrot addressing.
//!
//! This crate provides:
//!
//! - **Construction**: Build Carrot, coinbase, legacy and Seraphis enotes from
//!   payment and self-send proposals
//! - **Scanning**: Recognize owned enotes and recover amount, subaddress and
//!   payment id
//! - **Janus Protection**: Reject enotes whose ephemeral key does not match
//!   the recovered address
//! - **Key Images**: Derive key images from opening hints, with or without
//!   the spend key
//! - **Spend Authority**: Hand onetime address openings to an external SA/L
//!   proof system
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use carrot_stealth::{make_carrot_enote, EnoteScanner, PaymentProposal};
//!
//! // Sender: pay a destination
//! let out = make_carrot_enote(&PaymentProposal::new(destination, 1_000), &first_key_image)?;
//! // Publish out.enote
//!
//! // Recipient: scan
//! let scanner = EnoteScanner::new(&devices);
//! if let Some(record) = scanner.scan_enote(&EnoteVariant::Carrot(out.enote))?.into_owned() {
//!     println!("Received {} at {}", record.amount, record.address_index.index);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod components;
pub mod hint;
pub mod janus;
pub mod key_image;
pub mod payment;
pub mod sal;
pub mod scan;

pub use hint::{BaseSet, OpeningHint};
pub use janus::{verify_janus, JanusClaim, JanusOutcome};
pub use key_image::{open_onetime_address, recover_dual_base_opening, DualBaseOpening, KeyImageDevice};
pub use payment::{
    make_carrot_enote, make_coinbase_enote, make_internal_self_send_enote, make_legacy_enote,
    make_seraphis_coinbase_enote, make_seraphis_enote, make_special_self_send_enote,
    make_two_out_transaction_enotes, random_ephemeral_pubkey, OutputEnote, PaymentProposal,
    PaymentProposalBuilder, SelfSendProposal,
};
pub use sal::{prove_spend, RerandomizedOutput, SalProof, SpendAuthorityProver, SpendAuthorityVerifier};
pub use scan::{
    EnoteOrigin, EnoteScanner, FullRecord, IntermediateRecord, ScanResult, ScanStats,
    SenderExtensions,
};
