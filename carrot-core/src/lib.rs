//! # Carrot Core
//!
//! Core types, errors, and traits for the Carrot stealth addressing protocol.
//!
//! This crate provides the foundational building blocks used by all other Carrot crates:
//!
//! - **Types**: fixed-size byte types, address indices, destinations and enotes
//! - **Errors**: one error enum shared by every layer, with classification helpers
//! - **Constants**: protocol sizes and hash domain separators
//! - **Traits**: the enote ledger interface consumed by the scanner
//!
//! Nothing in this crate touches curve arithmetic. Points and scalars travel as
//! 32-byte values and are only interpreted by `carrot-crypto`.
//!
//! ## Example
//!
//! ```rust
//! use carrot_core::{AddressIndex, DeriveType, InputContext, KeyImage};
//!
//! let index = AddressIndex::new(5, 16);
//! assert!(!index.is_main());
//! assert_eq!(AddressIndex::from_bytes(&index.to_bytes()).unwrap(), index);
//!
//! let context = InputContext::ringct(&KeyImage::default());
//! assert!(!context.is_coinbase());
//! assert_eq!(DeriveType::default(), DeriveType::Auto);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CarrotError, MismatchReason, Result};
pub use traits::*;
pub use types::*;
