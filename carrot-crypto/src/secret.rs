//! Zeroizing scalar wrapper for private keys.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::{CarrotError, Result};

/// A private scalar, wiped when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar(Scalar);

impl SecretScalar {
    /// Wraps a scalar.
    pub fn new(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Parses a canonical 32-byte scalar encoding.
    ///
    /// # Errors
    /// `InvalidKeySize` for non-canonical encodings, `DerivationDegenerate` for zero.
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Result<Self> {
        let scalar: Option<Scalar> = Scalar::from_canonical_bytes(bytes).into();
        let scalar = scalar.ok_or(CarrotError::InvalidKeySize {
            expected: 32,
            actual: 32,
        })?;
        if scalar == Scalar::ZERO {
            return Err(CarrotError::DerivationDegenerate("private key"));
        }
        Ok(Self(scalar))
    }

    /// Parses a hex-encoded canonical scalar.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = hex::decode(s)?;
        let arr: std::result::Result<[u8; 32], _> = bytes.as_slice().try_into();
        let len = bytes.len();
        bytes.zeroize();
        let arr = arr.map_err(|_| CarrotError::InvalidKeySize {
            expected: 32,
            actual: len,
        })?;
        Self::from_canonical_bytes(arr)
    }

    /// Borrows the scalar.
    ///
    /// # Security
    /// Do not copy the value out of the wrapper.
    pub fn expose(&self) -> &Scalar {
        &self.0
    }

    /// `k G`
    pub fn public_key(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.0)
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretScalar([REDACTED])")
    }
}

impl PartialEq for SecretScalar {
    fn eq(&self, other: &Self) -> bool {
        subtle::ConstantTimeEq::ct_eq(&self.0, &other.0).into()
    }
}

impl Eq for SecretScalar {}
