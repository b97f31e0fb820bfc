//! Janus protection.
//!
//! A Janus attacker sends an enote whose ephemeral key was built for a
//! different address, or for the wrong address kind, than the one it pays,
//! and watches whether the victim's wallet reacts. The defense is to rebuild
//! the ephemeral pubkey an honest sender would have produced for the
//! recovered address and reject the enote when it differs.
//!
//! Special self-sends share `D_e` with another output and cannot pass that
//! check, so they carry `anchor_sp = H_16[k_v](D_e, input_context, Ko, K_s)`
//! instead, which only the account owner can compute.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use carrot_core::{
    AddressSpendPubkey, CarrotError, EnoteEphemeralPubkey, InputContext, JanusAnchor,
    OnetimeAddress, PaymentId, Result,
};
use carrot_crypto::EdwardsBytes;
use carrot_keys::ViewIncomingHandle;

use crate::components::{make_ephemeral_privkey, make_ephemeral_pubkey};

/// What an enote claims about its own construction.
#[derive(Clone, Copy, Debug)]
pub struct JanusClaim<'a> {
    /// `D_e` attached to the enote.
    pub ephemeral_pubkey: &'a EnoteEphemeralPubkey,
    /// Input context of the transaction.
    pub input_context: &'a InputContext,
    /// `Ko` of the enote.
    pub onetime_address: &'a OnetimeAddress,
    /// Decrypted anchor.
    pub anchor: &'a JanusAnchor,
    /// Recovered `K^j_s`.
    pub address_spend_pubkey: &'a AddressSpendPubkey,
    /// Whether the recovered index is a subaddress.
    pub is_subaddress: bool,
    /// Decrypted payment id.
    pub payment_id: PaymentId,
}

/// Result of the Janus check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JanusOutcome {
    /// `D_e` matches the honest derivation. A payment id that was not bound
    /// into `d_e` is reported as null.
    Normal {
        /// Payment id to attribute to the enote.
        payment_id: PaymentId,
    },
    /// The special self-send anchor matched.
    Special,
    /// Neither check passed.
    Rejected,
}

impl JanusOutcome {
    /// Returns true unless the enote was rejected.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, JanusOutcome::Rejected)
    }

    /// Turns a rejection into [`CarrotError::JanusViolation`].
    pub fn into_result(self) -> Result<Self> {
        match self {
            JanusOutcome::Rejected => Err(CarrotError::JanusViolation),
            other => Ok(other),
        }
    }
}

/// Recomputes `D_e` from the anchor and compares it with the attached one.
///
/// A degenerate or undecodable derivation counts as a mismatch.
pub fn verify_normal_ephemeral_pubkey(claim: &JanusClaim<'_>, payment_id: &PaymentId) -> bool {
    let Ok(spend_point) = claim.address_spend_pubkey.decompress() else {
        return false;
    };
    let Ok(d_e) = make_ephemeral_privkey(
        claim.anchor,
        claim.input_context,
        claim.address_spend_pubkey,
        payment_id,
    ) else {
        return false;
    };
    let expected = make_ephemeral_pubkey(&d_e, &spend_point, claim.is_subaddress);
    expected.as_bytes().ct_eq(claim.ephemeral_pubkey.as_bytes()).into()
}

/// Checks the special self-send anchor against the account spend key.
pub fn verify_special_anchor(
    claim: &JanusClaim<'_>,
    view: ViewIncomingHandle<'_>,
    account_spend_pubkey: &AddressSpendPubkey,
) -> Result<bool> {
    let expected = view.make_janus_anchor_special(
        view.derive_type,
        claim.ephemeral_pubkey,
        claim.input_context,
        claim.onetime_address,
        account_spend_pubkey,
    )?;
    Ok(expected.as_bytes().ct_eq(claim.anchor.as_bytes()).into())
}

/// Runs the full Janus check.
///
/// Tries the normal derivation with the decrypted payment id, then with the
/// null payment id, then the special anchor when `special` is given.
/// Coinbase enotes pass `None` since they have no special path.
///
/// # Errors
/// Only device errors; a failed check is [`JanusOutcome::Rejected`].
pub fn verify_janus(
    claim: &JanusClaim<'_>,
    special: Option<(ViewIncomingHandle<'_>, &AddressSpendPubkey)>,
) -> Result<JanusOutcome> {
    if verify_normal_ephemeral_pubkey(claim, &claim.payment_id) {
        return Ok(JanusOutcome::Normal {
            payment_id: claim.payment_id,
        });
    }
    if !claim.payment_id.is_null() && verify_normal_ephemeral_pubkey(claim, &PaymentId::NULL) {
        return Ok(JanusOutcome::Normal {
            payment_id: PaymentId::NULL,
        });
    }
    if let Some((view, account_spend_pubkey)) = special {
        if verify_special_anchor(claim, view, account_spend_pubkey)? {
            return Ok(JanusOutcome::Special);
        }
    }
    debug!(onetime_address = %claim.onetime_address, "Janus check rejected enote");
    Ok(JanusOutcome::Rejected)
}
