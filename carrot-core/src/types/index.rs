//! Address indices, derive types and enote kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::ADDRESS_INDEX_SIZE;
use crate::error::{CarrotError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS INDEX
// ═══════════════════════════════════════════════════════════════════════════════

/// `(major, minor)` subaddress index. `(0, 0)` is the main address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressIndex {
    /// Account (major) index.
    pub major: u32,
    /// Subaddress (minor) index within the account.
    pub minor: u32,
}

impl AddressIndex {
    /// The main address.
    pub const MAIN: AddressIndex = AddressIndex { major: 0, minor: 0 };

    /// Creates an index.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns true for the main address.
    pub const fn is_main(&self) -> bool {
        self.major == 0 && self.minor == 0
    }

    /// Encodes as `major (u32 LE) || minor (u32 LE) || 8 zero bytes`.
    pub fn to_bytes(&self) -> [u8; ADDRESS_INDEX_SIZE] {
        let mut out = [0u8; ADDRESS_INDEX_SIZE];
        out[..4].copy_from_slice(&self.major.to_le_bytes());
        out[4..8].copy_from_slice(&self.minor.to_le_bytes());
        out
    }

    /// Decodes an index, rejecting non-zero padding.
    pub fn from_bytes(bytes: &[u8; ADDRESS_INDEX_SIZE]) -> Result<Self> {
        if bytes[8..].iter().any(|b| *b != 0) {
            return Err(CarrotError::InvalidAddressIndex(
                "non-zero padding in index encoding".into(),
            ));
        }
        let mut major = [0u8; 4];
        let mut minor = [0u8; 4];
        major.copy_from_slice(&bytes[..4]);
        minor.copy_from_slice(&bytes[4..8]);
        Ok(Self {
            major: u32::from_le_bytes(major),
            minor: u32::from_le_bytes(minor),
        })
    }
}

impl fmt::Display for AddressIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.major, self.minor)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DERIVE TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which key hierarchy an address or enote belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeriveType {
    /// Let the device pick. Never valid for key image derivation.
    #[default]
    Auto,
    /// Legacy CryptoNote hierarchy (single spend key).
    PreCarrot,
    /// Carrot hierarchy (master secret, dual-base spend key).
    Carrot,
}

impl DeriveType {
    /// Returns true for `PreCarrot` or `Carrot`.
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, DeriveType::Auto)
    }
}

impl fmt::Display for DeriveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeriveType::Auto => "Auto",
            DeriveType::PreCarrot => "PreCarrot",
            DeriveType::Carrot => "Carrot",
        };
        f.write_str(s)
    }
}

/// An address index tagged with the hierarchy it belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressIndexExtended {
    /// Subaddress index.
    pub index: AddressIndex,
    /// Hierarchy of the index.
    pub derive_type: DeriveType,
}

impl AddressIndexExtended {
    /// Creates an extended index.
    pub const fn new(index: AddressIndex, derive_type: DeriveType) -> Self {
        Self { index, derive_type }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENOTE KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Enote type bound into the amount blinding factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnoteType {
    /// Payment to someone (or a self-spend).
    Payment = 0,
    /// Change back to the sender.
    Change = 1,
}

impl EnoteType {
    /// Transcript encoding.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// All enote types, in trial order.
    pub const ALL: [EnoteType; 2] = [EnoteType::Payment, EnoteType::Change];
}

/// Kind of internal (view-balance keyed) self-send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelfSendType {
    /// Change output.
    Change,
    /// Deliberate payment to oneself.
    SelfSpend,
}

impl SelfSendType {
    /// All self-send types, in trial order.
    pub const ALL: [SelfSendType; 2] = [SelfSendType::Change, SelfSendType::SelfSpend];

    /// Enote type bound into the amount commitment.
    pub const fn enote_type(self) -> EnoteType {
        match self {
            SelfSendType::Change => EnoteType::Change,
            SelfSendType::SelfSpend => EnoteType::Payment,
        }
    }
}
