//! Conversions between the byte types of `carrot-core` and curve points,
//! plus the few group operations the protocol needs.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;

use carrot_core::{
    AddressSpendPubkey, AddressViewPubkey, AmountCommitment, CarrotError, EcdhSecret,
    EnoteEphemeralPubkey, KeyImage, OnetimeAddress, Result, TxPubkey,
};

use crate::generators::generator_h;

/// Byte types that hold a compressed edwards25519 point.
pub trait EdwardsBytes: Sized {
    /// Human-readable name for error messages.
    const NAME: &'static str;

    /// Raw compressed bytes.
    fn point_bytes(&self) -> &[u8; 32];

    /// Wraps compressed bytes.
    fn from_point_bytes(bytes: [u8; 32]) -> Self;

    /// Decompresses the point.
    ///
    /// # Errors
    /// `InvalidPoint` if the bytes are not a curve point.
    fn decompress(&self) -> Result<EdwardsPoint> {
        CompressedEdwardsY(*self.point_bytes())
            .decompress()
            .ok_or(CarrotError::InvalidPoint(Self::NAME))
    }

    /// Decompresses the point and requires it to be in the prime-order subgroup.
    fn decompress_torsion_free(&self) -> Result<EdwardsPoint> {
        let point = self.decompress()?;
        if !point.is_torsion_free() {
            return Err(CarrotError::InvalidPoint(Self::NAME));
        }
        Ok(point)
    }

    /// Compresses a point into this byte type.
    fn from_point(point: &EdwardsPoint) -> Self {
        Self::from_point_bytes(point.compress().to_bytes())
    }
}

macro_rules! impl_edwards_bytes {
    ($($ty:ident => $name:literal),* $(,)?) => {
        $(
            impl EdwardsBytes for $ty {
                const NAME: &'static str = $name;

                fn point_bytes(&self) -> &[u8; 32] {
                    self.as_bytes()
                }

                fn from_point_bytes(bytes: [u8; 32]) -> Self {
                    $ty::from_array(bytes)
                }
            }
        )*
    };
}

impl_edwards_bytes! {
    OnetimeAddress => "onetime address",
    AmountCommitment => "amount commitment",
    AddressSpendPubkey => "address spend pubkey",
    AddressViewPubkey => "address view pubkey",
    TxPubkey => "tx pubkey",
    KeyImage => "key image",
}

// ═══════════════════════════════════════════════════════════════════════════════
// MONTGOMERY (X25519)
// ═══════════════════════════════════════════════════════════════════════════════

/// `D_e` as a Montgomery point.
pub fn ephemeral_montgomery(pubkey: &EnoteEphemeralPubkey) -> MontgomeryPoint {
    MontgomeryPoint(*pubkey.as_bytes())
}

/// `ConvertPointE(P)`: edwards to X25519 u-coordinate.
pub fn to_ephemeral_pubkey(point: &EdwardsPoint) -> EnoteEphemeralPubkey {
    EnoteEphemeralPubkey::from_array(point.to_montgomery().to_bytes())
}

/// `s_sr' = k * D_e` on the Montgomery curve.
pub fn x25519(scalar: &Scalar, pubkey: &EnoteEphemeralPubkey) -> EcdhSecret {
    let shared = scalar * ephemeral_montgomery(pubkey);
    EcdhSecret::from_array(shared.to_bytes())
}

/// `k * B` on the Montgomery curve.
pub fn x25519_base(scalar: &Scalar) -> EnoteEphemeralPubkey {
    EnoteEphemeralPubkey::from_array(MontgomeryPoint::mul_base(scalar).to_bytes())
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMITMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// `C = k_a G + a H`
pub fn commit(amount: u64, blinding_factor: &Scalar) -> EdwardsPoint {
    EdwardsPoint::mul_base(blinding_factor) + generator_h() * Scalar::from(amount)
}

/// Coinbase commitment with blinding factor one: `C = G + a H`.
pub fn clear_commit(amount: u64) -> EdwardsPoint {
    commit(amount, &Scalar::ONE)
}
