//! Hashing utilities with domain separation.
//!
//! ## Carrot transcripts
//!
//! Every Carrot hash is a keyed BLAKE2b over a fixed-layout transcript:
//!
//! ```text
//! transcript = len(domain) as u8 || domain || field_1 || ... || field_n
//! H_x[key](transcript)  =  BLAKE2b(key, out_len = x)(transcript)
//! H_n[key](transcript)  =  BLAKE2b(key, out_len = 64)(transcript) mod l
//! ```
//!
//! Fields are always fixed width, so the length-prefixed domain is enough to
//! make every transcript unambiguous. An empty key means unkeyed BLAKE2b.
//!
//! ## Legacy hashing
//!
//! CryptoNote outputs use Keccak256 over plain concatenation (`H_s`) and a
//! hash-to-point map (`Hp`) for key images.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use sha3::{Digest, Keccak256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::{CarrotError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSCRIPT
// ═══════════════════════════════════════════════════════════════════════════════

/// Length-prefixed, domain-separated hash input.
///
/// Transcripts frequently hold secret fields (amounts, anchors), so the
/// buffer is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Transcript {
    buf: Vec<u8>,
}

impl Transcript {
    /// Starts a transcript with `len(domain) || domain`.
    ///
    /// # Panics
    /// Panics if the domain is 256 bytes or longer. Domains are compile-time
    /// constants, so this is a programming error.
    pub fn new(domain: &[u8]) -> Self {
        assert!(domain.len() < 256, "domain separator too long");
        let mut buf = Vec::with_capacity(1 + domain.len() + 128);
        buf.push(domain.len() as u8);
        buf.extend_from_slice(domain);
        Self { buf }
    }

    /// Appends a fixed-size field.
    pub fn append(mut self, field: impl AsRef<[u8]>) -> Self {
        self.buf.extend_from_slice(field.as_ref());
        self
    }

    /// Appends one byte.
    pub fn append_u8(mut self, value: u8) -> Self {
        self.buf.push(value);
        self
    }

    /// Appends a little-endian u32.
    pub fn append_u32(self, value: u32) -> Self {
        self.append(value.to_le_bytes())
    }

    /// Appends a little-endian u64.
    pub fn append_u64(self, value: u64) -> Self {
        self.append(value.to_le_bytes())
    }

    /// Returns the encoded transcript.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transcript({} bytes)", self.buf.len())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEYED BLAKE2b
// ═══════════════════════════════════════════════════════════════════════════════

/// `H_N[key](transcript)`: keyed BLAKE2b with an `N`-byte output (1..=64).
pub fn derive_bytes<const N: usize>(transcript: &Transcript, key: &[u8]) -> [u8; N] {
    let hash = blake2b_simd::Params::new()
        .hash_length(N)
        .key(key)
        .hash(transcript.as_bytes());

    let mut out = [0u8; N];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// `H_n[key](transcript)`: 64-byte keyed BLAKE2b reduced mod l.
pub fn derive_scalar(transcript: &Transcript, key: &[u8]) -> Scalar {
    let mut wide: [u8; 64] = derive_bytes(transcript, key);
    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    scalar
}

/// `H_n` that refuses to return the zero scalar.
///
/// # Errors
/// Returns `DerivationDegenerate` naming `what` if the hash reduced to zero.
pub fn derive_nonzero_scalar(
    transcript: &Transcript,
    key: &[u8],
    what: &'static str,
) -> Result<Scalar> {
    nonzero(derive_scalar(transcript, key), what)
}

/// Rejects the zero scalar.
pub fn nonzero(scalar: Scalar, what: &'static str) -> Result<Scalar> {
    if scalar == Scalar::ZERO {
        return Err(CarrotError::DerivationDegenerate(what));
    }
    Ok(scalar)
}

/// XORs two equal-length byte arrays (enote field encryption).
pub fn xor_bytes<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    for i in 0..N {
        out[i] = a[i] ^ b[i];
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// KECCAK256 (legacy CryptoNote)
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes Keccak256 hash.
///
/// Note: Keccak256 is NOT SHA3-256. They use different padding.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    Digest::update(&mut hasher, input);
    hasher.finalize().into()
}

/// Keccak256 over the plain concatenation of `parts`.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    hasher.finalize().into()
}

/// `H_s(parts...) = keccak(parts...) mod l`
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hash = keccak256_concat(parts);
    let scalar = Scalar::from_bytes_mod_order(hash);
    hash.zeroize();
    scalar
}

/// CryptoNote varint (7 bits per byte, high bit = continuation).
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

/// `Hp(data)`: CryptoNote `hash_to_ec`, landing in the prime-order subgroup.
pub fn hash_to_point(data: &[u8; 32]) -> EdwardsPoint {
    monero_ed25519::Point::biased_hash(*data).into()
}
