//! Error types for Carrot.
//!
//! One `thiserror` enum covers every layer. The "not mine" outcome of scanning
//! is a [`MismatchReason`], carried as a value by the scanners and only turned
//! into [`CarrotError::ScanMismatch`] when a caller asked for a hard result.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `CarrotError`.
pub type Result<T> = std::result::Result<T, CarrotError>;

/// Why an enote was found not to belong to the scanning account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MismatchReason {
    /// The view tag filter rejected the enote.
    ViewTag,
    /// The reconstructed onetime address differs from the on-chain one.
    OnetimeAddress,
    /// The recomputed amount commitment differs from the on-chain one.
    AmountCommitment,
    /// The enote carries an unusable point (not on curve, or torsioned).
    InvalidPoint,
    /// A key derivation for this enote produced the zero scalar.
    Degenerate,
    /// The recovered spend key is not in the legacy subaddress table.
    UnknownSubaddress,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MismatchReason::ViewTag => "view tag",
            MismatchReason::OnetimeAddress => "onetime address",
            MismatchReason::AmountCommitment => "amount commitment",
            MismatchReason::InvalidPoint => "invalid point",
            MismatchReason::Degenerate => "degenerate derivation",
            MismatchReason::UnknownSubaddress => "unknown subaddress",
        };
        f.write_str(s)
    }
}

/// Main error type for all Carrot operations.
#[derive(Debug, Error)]
pub enum CarrotError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION / WIRING ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// A device or operation was invoked with a derive type it was not built for.
    #[error("Unsupported derive type {derive_type} for {operation}")]
    UnsupportedDeriveType {
        /// Operation that rejected the call.
        operation: &'static str,
        /// Derive type that was passed in.
        derive_type: String,
    },

    /// A required capability device is not present in the device set.
    #[error("Capability missing: {0}")]
    CapabilityMissing(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// A key derivation step produced the zero scalar.
    #[error("Derivation produced a zero scalar: {0}")]
    DerivationDegenerate(&'static str),

    /// Bytes do not decode to a usable curve point.
    #[error("Invalid point: {0}")]
    InvalidPoint(&'static str),

    /// Invalid key size or format.
    #[error("Invalid key: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SCANNING / SECURITY REJECTIONS
    // ═══════════════════════════════════════════════════════════════════════════
    /// The enote does not belong to this account.
    #[error("Enote not owned: {0} mismatch")]
    ScanMismatch(MismatchReason),

    /// The ephemeral pubkey does not match the recovered destination.
    #[error("Janus protection rejected the enote")]
    JanusViolation,

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Address index outside the supported range.
    #[error("Invalid address index: {0}")]
    InvalidAddressIndex(String),

    /// Destination is malformed (e.g. a main address marked as subaddress).
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Enote fields are inconsistent with its declared kind.
    #[error("Invalid enote: {0}")]
    InvalidEnote(String),

    /// Payment proposal is invalid.
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // EXTERNAL COLLABORATORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// The external spend-authority proof system failed.
    #[error("Proof system error: {0}")]
    ProofSystem(String),

    /// Ledger storage error.
    #[error("Ledger error: {0}")]
    LedgerError(String),

    /// Enote with this onetime address was already published.
    #[error("Duplicate enote: {0}")]
    DuplicateEnote(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CarrotError {
    /// Builds an `UnsupportedDeriveType` error.
    pub fn unsupported(operation: &'static str, derive_type: impl fmt::Display) -> Self {
        CarrotError::UnsupportedDeriveType {
            operation,
            derive_type: derive_type.to_string(),
        }
    }

    /// Returns true if this error is recoverable (can retry).
    ///
    /// Only transport failures of external collaborators qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CarrotError::ProofSystem(_) | CarrotError::LedgerError(_))
    }

    /// Returns true if this is a per-enote security rejection.
    ///
    /// These must be handled locally and never escalate to a batch failure.
    pub fn is_security_rejection(&self) -> bool {
        matches!(self, CarrotError::JanusViolation | CarrotError::ScanMismatch(_))
    }

    /// Returns true if this error indicates a caller wiring bug.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CarrotError::UnsupportedDeriveType { .. }
                | CarrotError::CapabilityMissing(_)
                | CarrotError::ConfigError(_)
        )
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            CarrotError::DerivationDegenerate(_)
                | CarrotError::InvalidPoint(_)
                | CarrotError::InvalidKeySize { .. }
        )
    }
}
