//! Spend authority and linkability (SA/L) boundary.
//!
//! The SA/L proof system itself lives outside this crate. This module opens
//! owned enotes into `(x, y)` and hands them to a [`SpendAuthorityProver`],
//! then checks that the key image the prover bound into its proof is the one
//! the account derives for the enote.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use carrot_core::{AmountCommitment, CarrotError, KeyImage, OnetimeAddress, Result};
use carrot_crypto::{generator_t, EdwardsBytes, EdwardsPoint, SecretScalar};
use carrot_keys::AccountDevices;

use crate::hint::OpeningHint;
use crate::key_image::{open_onetime_address, KeyImageDevice};

/// A re-randomized input as it appears in the proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerandomizedOutput {
    /// Re-randomized `Ko`.
    pub onetime_address: OnetimeAddress,
    /// Re-randomized `C_a`.
    pub amount_commitment: AmountCommitment,
    /// Proof-system specific re-randomization data.
    #[serde(with = "hex")]
    pub rerandomization: Vec<u8>,
}

/// An opaque SA/L proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalProof(#[serde(with = "hex")] pub Vec<u8>);

/// Produces SA/L proofs from an opening of `Ko = x G + y T`.
pub trait SpendAuthorityProver {
    /// Proves knowledge of `(x, y)` for `output` and returns the proof with
    /// the key image it binds.
    fn prove_sal(
        &self,
        tx_hash: &[u8; 32],
        x: &SecretScalar,
        y: &SecretScalar,
        output: &RerandomizedOutput,
    ) -> Result<(SalProof, KeyImage)>;
}

/// Verifies SA/L proofs.
pub trait SpendAuthorityVerifier {
    /// Checks `proof` for `output` and `key_image`.
    fn verify_sal(
        &self,
        tx_hash: &[u8; 32],
        output: &RerandomizedOutput,
        key_image: &KeyImage,
        proof: &SalProof,
    ) -> Result<bool>;
}

/// Opens an owned enote and proves spend authority over it.
///
/// # Errors
/// `CapabilityMissing` without a spend key, `ProofSystem` if the prover
/// fails or binds a key image other than the account's.
pub fn prove_spend(
    devices: &AccountDevices,
    hint: &OpeningHint,
    prover: &dyn SpendAuthorityProver,
    tx_hash: &[u8; 32],
    output: &RerandomizedOutput,
) -> Result<(SalProof, KeyImage)> {
    let (x, y) = open_onetime_address(devices, hint)?;
    let reopened = EdwardsPoint::mul_base(x.expose()) + y.expose() * generator_t();
    if OnetimeAddress::from_point(&reopened) != *hint.onetime_address_ref() {
        return Err(CarrotError::InternalError(
            "spend device opening does not reproduce the onetime address".into(),
        ));
    }

    let expected = devices.derive_key_image(hint)?;
    let (proof, key_image) = prover.prove_sal(tx_hash, &x, &y, output)?;
    if !bool::from(key_image.as_bytes().ct_eq(expected.as_bytes())) {
        warn!(onetime_address = %hint.onetime_address_ref(), "Prover bound an unexpected key image");
        return Err(CarrotError::ProofSystem(
            "proof key image does not match the enote".into(),
        ));
    }

    info!(key_image = %key_image, "Proved spend authority");
    Ok((proof, key_image))
}
