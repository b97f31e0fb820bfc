//! View tag computation for efficient scanning.
//!
//! View tags let recipients reject almost every foreign enote after one
//! scalar multiplication and one short hash:
//!
//! - Carrot enotes carry a 3-byte tag, `vt = H_3[s_sr'](input_context, Ko)`
//! - Internal self-sends use `vt = H_3[s_vb](input_context, Ko)`
//! - Legacy enotes carry 1 byte, `keccak("view_tag" || D || varint(i))[0]`
//!
//! ## Primary / complementary split
//!
//! The 24 tag bits are split at a configurable point. The high `primary_bits`
//! form the primary filter, cheap enough to hand to a delegated scanner; the
//! remaining bits form the complementary filter checked by the wallet itself.
//! A foreign enote passes the primary filter with probability
//! `2^-primary_bits` and both filters with probability `2^-24`.
//!
//! ## Security
//!
//! A view tag is a lossy pre-filter. Passing it never proves ownership.

use subtle::ConstantTimeEq;

use carrot_core::constants::{
    DEFAULT_VIEW_TAG_PRIMARY_BITS, DOMAIN_INTERNAL_VIEW_TAG, DOMAIN_VIEW_TAG,
    LEGACY_VIEW_TAG_PREFIX, VIEW_TAG_BITS,
};
use carrot_core::{
    CarrotError, EcdhSecret, InputContext, OnetimeAddress, Result, ViewBalanceSecret, ViewTag,
};

use crate::hash::{derive_bytes, encode_varint, keccak256_concat, Transcript};

// ═══════════════════════════════════════════════════════════════════════════════
// COMPUTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// `vt = H_3[s_sr'](input_context, Ko)`
pub fn compute_view_tag(
    ecdh: &EcdhSecret,
    input_context: &InputContext,
    onetime_address: &OnetimeAddress,
) -> ViewTag {
    let transcript = Transcript::new(DOMAIN_VIEW_TAG)
        .append(input_context)
        .append(onetime_address);
    ViewTag::from_array(derive_bytes(&transcript, ecdh.as_bytes()))
}

/// `vt = H_3[s_vb](input_context, Ko)`
pub fn compute_internal_view_tag(
    view_balance_secret: &ViewBalanceSecret,
    input_context: &InputContext,
    onetime_address: &OnetimeAddress,
) -> ViewTag {
    let transcript = Transcript::new(DOMAIN_INTERNAL_VIEW_TAG)
        .append(input_context)
        .append(onetime_address);
    ViewTag::from_array(derive_bytes(&transcript, view_balance_secret.as_bytes()))
}

/// Legacy 1-byte view tag from the key derivation `D = 8 k_v R`.
pub fn compute_legacy_view_tag(derivation: &[u8; 32], output_index: u64) -> u8 {
    let index = encode_varint(output_index);
    keccak256_concat(&[LEGACY_VIEW_TAG_PREFIX, &derivation[..], index.as_slice()])[0]
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPLIT FILTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Split point between primary and complementary view tag bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewTagSplit {
    primary_bits: u32,
}

impl Default for ViewTagSplit {
    fn default() -> Self {
        Self {
            primary_bits: DEFAULT_VIEW_TAG_PRIMARY_BITS,
        }
    }
}

impl ViewTagSplit {
    /// Creates a split with `primary_bits` in `1..=24`.
    pub fn new(primary_bits: u32) -> Result<Self> {
        if primary_bits == 0 || primary_bits > VIEW_TAG_BITS {
            return Err(CarrotError::ConfigError(format!(
                "view tag primary bits must be in 1..={}, got {}",
                VIEW_TAG_BITS, primary_bits
            )));
        }
        Ok(Self { primary_bits })
    }

    /// Number of primary bits.
    pub fn primary_bits(&self) -> u32 {
        self.primary_bits
    }

    /// Mask selecting the primary (high) bits of [`ViewTag::to_u32`].
    pub fn primary_mask(&self) -> u32 {
        let full = (1u32 << VIEW_TAG_BITS) - 1;
        let low = (1u32 << (VIEW_TAG_BITS - self.primary_bits)) - 1;
        full & !low
    }

    /// Mask selecting the complementary (low) bits.
    pub fn complementary_mask(&self) -> u32 {
        ((1u32 << VIEW_TAG_BITS) - 1) & !self.primary_mask()
    }

    /// Constant-time check of the primary bits.
    pub fn matches_primary(&self, expected: &ViewTag, actual: &ViewTag) -> bool {
        masked_eq(expected, actual, self.primary_mask())
    }

    /// Constant-time check of the complementary bits.
    pub fn matches_complementary(&self, expected: &ViewTag, actual: &ViewTag) -> bool {
        masked_eq(expected, actual, self.complementary_mask())
    }

    /// Expected false-positive rate of the primary filter.
    pub fn primary_false_positive_rate(&self) -> f64 {
        2f64.powi(-(self.primary_bits as i32))
    }
}

/// Constant-time comparison of all view tag bits.
pub fn view_tags_match(expected: &ViewTag, actual: &ViewTag) -> bool {
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}

fn masked_eq(a: &ViewTag, b: &ViewTag, mask: u32) -> bool {
    (a.to_u32() & mask).ct_eq(&(b.to_u32() & mask)).into()
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATISTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Distribution of the first view tag byte.
///
/// Useful for analyzing the tags stored in a ledger.
#[derive(Debug, Clone)]
pub struct ViewTagStats {
    /// Count of each first-byte value
    pub distribution: Vec<u64>,
    /// Total number of tags analyzed
    pub total: u64,
}

impl Default for ViewTagStats {
    fn default() -> Self {
        Self {
            distribution: vec![0; 256],
            total: 0,
        }
    }
}

impl ViewTagStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view tag.
    pub fn add(&mut self, tag: &ViewTag) {
        self.distribution[tag.as_bytes()[0] as usize] += 1;
        self.total += 1;
    }

    /// Returns the most common first byte.
    pub fn most_common(&self) -> Option<(u8, u64)> {
        self.distribution
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map(|(tag, &count)| (tag as u8, count))
    }

    /// Returns the expected count per value for a uniform distribution.
    pub fn expected_uniform_count(&self) -> f64 {
        self.total as f64 / 256.0
    }

    /// Computes chi-squared statistic for uniformity test.
    pub fn chi_squared(&self) -> f64 {
        let expected = self.expected_uniform_count();
        if expected == 0.0 {
            return 0.0;
        }

        self.distribution
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                (diff * diff) / expected
            })
            .sum()
    }
}
