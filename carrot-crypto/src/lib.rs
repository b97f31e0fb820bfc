//! # Carrot Cryptography
//!
//! Cryptographic primitives for the Carrot protocol.
//!
//! This crate provides:
//!
//! - **Hash**: length-prefixed transcripts, keyed BLAKE2b (`H_n`, `H_32`, ...),
//!   legacy Keccak hashing and hash-to-point
//! - **Generators**: `G`, `H`, `T`, `X`, `U`
//! - **Points**: byte-type conversions, X25519 exchange, Pedersen commitments
//! - **Address tags**: AES-256 encryption of subaddress indices
//! - **View tags**: computation, split primary/complementary filtering, statistics
//!
//! ## Security Properties
//!
//! - Secret scalars are held in [`SecretScalar`] and zeroized on drop
//! - View tag and padding comparisons are constant time
//! - Domain separators prevent cross-protocol attacks
//!
//! ## Example
//!
//! ```rust,ignore
//! use carrot_crypto::{derive_bytes, derive_scalar, Transcript};
//! use carrot_core::constants::{DOMAIN_PROVE_SPEND_KEY, DOMAIN_VIEW_BALANCE_SECRET};
//!
//! let master = [7u8; 32];
//! let k_ps = derive_scalar(&Transcript::new(DOMAIN_PROVE_SPEND_KEY), &master);
//! let s_vb: [u8; 32] = derive_bytes(&Transcript::new(DOMAIN_VIEW_BALANCE_SECRET), &master);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod address_tag;
pub mod generators;
pub mod hash;
pub mod point;
pub mod secret;
pub mod view_tag;

// Curve types used across the public API
pub use curve25519_dalek::edwards::EdwardsPoint;
pub use curve25519_dalek::scalar::Scalar;

// Re-export main functions at crate root
pub use address_tag::AddressTagCipher;
pub use generators::{generator_g, generator_h, generator_t, generator_u, generator_x};
pub use hash::{
    derive_bytes, derive_nonzero_scalar, derive_scalar, hash_to_point, hash_to_scalar, keccak256,
    nonzero, xor_bytes, Transcript,
};
pub use point::{clear_commit, commit, to_ephemeral_pubkey, x25519, x25519_base, EdwardsBytes};
pub use secret::SecretScalar;
pub use view_tag::{
    compute_internal_view_tag, compute_legacy_view_tag, compute_view_tag, view_tags_match,
    ViewTagSplit, ViewTagStats,
};
