//! Enote construction (sender side).
//!
//! - [`make_carrot_enote`]: payment to any destination
//! - [`make_special_self_send_enote`]: self-send reusing another output's `D_e`
//! - [`make_internal_self_send_enote`]: self-send keyed by the view-balance secret
//! - [`make_two_out_transaction_enotes`]: payment plus self-send sharing one `D_e`
//! - [`make_coinbase_enote`], [`make_legacy_enote`], [`make_seraphis_enote`],
//!   [`make_seraphis_coinbase_enote`]: the other formats

use rand::RngCore;
use tracing::debug;

use carrot_core::{
    AddressIndexExtended, AmountCommitment, CarrotCoinbaseEnote, CarrotEnote, CarrotError,
    DeriveType, Destination, EnoteEphemeralPubkey, EnoteType, InputContext, JanusAnchor, KeyImage,
    LegacyEnote, PaymentId, Result, SelfSendType, SenderReceiverSecret, SeraphisCoinbaseEnote,
    SeraphisEnote,
};
use carrot_crypto::{
    clear_commit, commit, compute_legacy_view_tag, compute_view_tag, x25519_base, EdwardsBytes,
    EdwardsPoint, Scalar, SecretScalar,
};
use carrot_keys::AccountDevices;

use crate::components::*;

// ═══════════════════════════════════════════════════════════════════════════════
// PROPOSALS
// ═══════════════════════════════════════════════════════════════════════════════

/// A payment to someone else (or to one's own address, built externally).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentProposal {
    /// Where the funds go.
    pub destination: Destination,
    /// Amount in atomic units.
    pub amount: u64,
    /// Janus anchor from which the ephemeral key is derived.
    pub randomness: JanusAnchor,
}

impl PaymentProposal {
    /// Creates a proposal with a fresh random anchor.
    pub fn new(destination: Destination, amount: u64) -> Self {
        Self {
            destination,
            amount,
            randomness: random_anchor(),
        }
    }

    /// Replaces the anchor, for reproducible construction.
    pub fn with_randomness(mut self, randomness: JanusAnchor) -> Self {
        self.randomness = randomness;
        self
    }
}

/// Builder for [`PaymentProposal`].
#[derive(Debug, Default)]
pub struct PaymentProposalBuilder {
    destination: Option<Destination>,
    amount: Option<u64>,
    randomness: Option<JanusAnchor>,
    payment_id: Option<PaymentId>,
}

impl PaymentProposalBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the destination.
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the amount.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets a fixed anchor instead of a random one.
    pub fn randomness(mut self, randomness: JanusAnchor) -> Self {
        self.randomness = Some(randomness);
        self
    }

    /// Pays to the integrated form of a main address.
    pub fn payment_id(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    /// Builds the proposal.
    ///
    /// # Errors
    /// `InvalidProposal` without destination or amount, `InvalidDestination`
    /// for a malformed destination.
    pub fn build(self) -> Result<PaymentProposal> {
        let mut destination = self
            .destination
            .ok_or_else(|| CarrotError::InvalidProposal("destination is required".into()))?;
        let amount = self
            .amount
            .ok_or_else(|| CarrotError::InvalidProposal("amount is required".into()))?;
        if let Some(payment_id) = self.payment_id {
            destination = destination.integrated(payment_id)?;
        }
        destination.validate()?;

        Ok(PaymentProposal {
            destination,
            amount,
            randomness: self.randomness.unwrap_or_else(random_anchor),
        })
    }
}

/// A payment back to one of the account's own addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelfSendProposal {
    /// Receiving index; `Auto` lets the account choose the hierarchy.
    pub index: AddressIndexExtended,
    /// Amount in atomic units.
    pub amount: u64,
    /// Change or deliberate self-spend.
    pub self_send_type: SelfSendType,
}

impl SelfSendProposal {
    /// Change to the main address.
    pub fn change(amount: u64) -> Self {
        Self {
            index: AddressIndexExtended::default(),
            amount,
            self_send_type: SelfSendType::Change,
        }
    }
}

/// A constructed enote plus the secrets its sender needs to build the
/// transaction's balance proof.
#[derive(Clone, Debug)]
pub struct OutputEnote<E> {
    /// The enote as published.
    pub enote: E,
    /// Cleartext amount.
    pub amount: u64,
    /// Blinding factor of the amount commitment.
    pub amount_blinding_factor: SecretScalar,
}

fn random_anchor() -> JanusAnchor {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    JanusAnchor::from_array(bytes)
}

/// Random `D_e` for an internal self-send with no output to share a key with.
pub fn random_ephemeral_pubkey() -> EnoteEphemeralPubkey {
    let mut wide = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut wide);
    x25519_base(&Scalar::from_bytes_mod_order_wide(&wide))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED STEPS
// ═══════════════════════════════════════════════════════════════════════════════

/// `(k_a, C_a, Ko)` for a dual-base enote.
struct OnetimeParts {
    blinding_factor: Scalar,
    amount_commitment: AmountCommitment,
    onetime_address: carrot_core::OnetimeAddress,
}

fn make_onetime_parts(
    secret: &SenderReceiverSecret,
    spend_pubkey: &carrot_core::AddressSpendPubkey,
    spend_point: &EdwardsPoint,
    amount: u64,
    enote_type: EnoteType,
) -> Result<OnetimeParts> {
    let blinding_factor = make_amount_blinding_factor(secret, amount, spend_pubkey, enote_type)?;
    let amount_commitment = AmountCommitment::from_point(&commit(amount, &blinding_factor));
    let extensions = make_onetime_extensions(secret, &amount_commitment)?;
    Ok(OnetimeParts {
        onetime_address: make_onetime_address(spend_point, &extensions),
        blinding_factor,
        amount_commitment,
    })
}

fn require_null_payment_id(destination: &Destination, format: &str) -> Result<()> {
    if !destination.payment_id.is_null() {
        return Err(CarrotError::InvalidProposal(format!(
            "{} enotes cannot carry a payment id",
            format
        )));
    }
    Ok(())
}

fn require_main_address(destination: &Destination, format: &str) -> Result<()> {
    if destination.is_subaddress {
        return Err(CarrotError::InvalidProposal(format!(
            "{} enotes can only pay main addresses",
            format
        )));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// CARROT
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds the Carrot enote for a payment proposal.
pub fn make_carrot_enote(
    proposal: &PaymentProposal,
    tx_first_key_image: &KeyImage,
) -> Result<OutputEnote<CarrotEnote>> {
    let destination = &proposal.destination;
    destination.validate()?;
    let input_context = InputContext::ringct(tx_first_key_image);
    let spend_point = destination.spend_pubkey.decompress_torsion_free()?;

    let d_e = make_ephemeral_privkey(
        &proposal.randomness,
        &input_context,
        &destination.spend_pubkey,
        &destination.payment_id,
    )?;
    let ephemeral_pubkey = make_ephemeral_pubkey(&d_e, &spend_point, destination.is_subaddress);
    let ecdh = make_sender_ecdh(&d_e, &destination.view_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, &ephemeral_pubkey, &input_context);

    let parts = make_onetime_parts(
        &secret,
        &destination.spend_pubkey,
        &spend_point,
        proposal.amount,
        EnoteType::Payment,
    )?;
    let ko = &parts.onetime_address;
    let tag = destination.address_tag.unwrap_or_default();

    let enote = CarrotEnote {
        onetime_address: *ko,
        amount_commitment: parts.amount_commitment,
        amount_enc: encrypt_amount(proposal.amount, &secret, ko),
        anchor_enc: encrypt_anchor(&proposal.randomness, &secret, ko),
        address_tag_enc: encrypt_address_tag(&tag, &secret, ko),
        payment_id_enc: encrypt_payment_id(&destination.payment_id, &secret, ko),
        view_tag: compute_view_tag(&ecdh, &input_context, ko),
        ephemeral_pubkey,
        tx_first_key_image: *tx_first_key_image,
    };
    debug!(onetime_address = %enote.onetime_address, "Built carrot enote");

    Ok(OutputEnote {
        enote,
        amount: proposal.amount,
        amount_blinding_factor: SecretScalar::new(parts.blinding_factor),
    })
}

/// Builds a self-send on the external path, sharing `ephemeral_pubkey` with
/// another output of the same transaction.
///
/// The anchor is the special anchor, so the owner's Janus check passes even
/// though `D_e` was derived for someone else.
pub fn make_special_self_send_enote(
    proposal: &SelfSendProposal,
    devices: &AccountDevices,
    ephemeral_pubkey: &EnoteEphemeralPubkey,
    tx_first_key_image: &KeyImage,
) -> Result<OutputEnote<CarrotEnote>> {
    let input_context = InputContext::ringct(tx_first_key_image);
    let address = devices.address();
    let resolved = address.resolve(&proposal.index)?;
    let derive_type = resolved.index.derive_type;
    let view = devices.view_incoming(derive_type)?;
    let spend_point = resolved.spend_pubkey.decompress_torsion_free()?;

    let ecdh = view.view_key_scalar_mult_x25519(derive_type, ephemeral_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, ephemeral_pubkey, &input_context);
    let parts = make_onetime_parts(
        &secret,
        &resolved.spend_pubkey,
        &spend_point,
        proposal.amount,
        proposal.self_send_type.enote_type(),
    )?;
    let ko = &parts.onetime_address;
    let anchor = view.make_janus_anchor_special(
        derive_type,
        ephemeral_pubkey,
        &input_context,
        ko,
        &address.account_spend_pubkey(derive_type)?,
    )?;
    let tag = address.encrypt_address_index(&resolved.index)?;

    let enote = CarrotEnote {
        onetime_address: *ko,
        amount_commitment: parts.amount_commitment,
        amount_enc: encrypt_amount(proposal.amount, &secret, ko),
        anchor_enc: encrypt_anchor(&anchor, &secret, ko),
        address_tag_enc: encrypt_address_tag(&tag, &secret, ko),
        payment_id_enc: encrypt_payment_id(&PaymentId::NULL, &secret, ko),
        view_tag: compute_view_tag(&ecdh, &input_context, ko),
        ephemeral_pubkey: *ephemeral_pubkey,
        tx_first_key_image: *tx_first_key_image,
    };
    debug!(onetime_address = %enote.onetime_address, "Built special self-send enote");

    Ok(OutputEnote {
        enote,
        amount: proposal.amount,
        amount_blinding_factor: SecretScalar::new(parts.blinding_factor),
    })
}

/// Builds a self-send keyed by the view-balance secret. No key exchange is
/// performed; `ephemeral_pubkey` only contextualizes the secret.
pub fn make_internal_self_send_enote(
    proposal: &SelfSendProposal,
    devices: &AccountDevices,
    ephemeral_pubkey: &EnoteEphemeralPubkey,
    tx_first_key_image: &KeyImage,
) -> Result<OutputEnote<CarrotEnote>> {
    let input_context = InputContext::ringct(tx_first_key_image);
    let view_balance = devices.view_balance()?;
    let address = devices.address();
    let resolved = address.resolve(&proposal.index)?;
    let derive_type = resolved.index.derive_type;
    let spend_point = resolved.spend_pubkey.decompress_torsion_free()?;

    let secret = view_balance.make_internal_sender_receiver_secret(
        derive_type,
        proposal.self_send_type,
        ephemeral_pubkey,
        &input_context,
    )?;
    let parts = make_onetime_parts(
        &secret,
        &resolved.spend_pubkey,
        &spend_point,
        proposal.amount,
        proposal.self_send_type.enote_type(),
    )?;
    let ko = &parts.onetime_address;
    let tag = address.encrypt_address_index(&resolved.index)?;

    let enote = CarrotEnote {
        onetime_address: *ko,
        amount_commitment: parts.amount_commitment,
        amount_enc: encrypt_amount(proposal.amount, &secret, ko),
        anchor_enc: encrypt_anchor(&random_anchor(), &secret, ko),
        address_tag_enc: encrypt_address_tag(&tag, &secret, ko),
        payment_id_enc: encrypt_payment_id(&PaymentId::NULL, &secret, ko),
        view_tag: view_balance.make_internal_view_tag(derive_type, &input_context, ko)?,
        ephemeral_pubkey: *ephemeral_pubkey,
        tx_first_key_image: *tx_first_key_image,
    };
    debug!(
        onetime_address = %enote.onetime_address,
        self_send_type = ?proposal.self_send_type,
        "Built internal self-send enote"
    );

    Ok(OutputEnote {
        enote,
        amount: proposal.amount,
        amount_blinding_factor: SecretScalar::new(parts.blinding_factor),
    })
}

/// Builds both outputs of a 2-out transaction with one shared `D_e`.
///
/// The self-send takes the internal path when the account holds the
/// view-balance secret for its hierarchy, the special path otherwise.
/// Returns `(payment, self_send)`.
pub fn make_two_out_transaction_enotes(
    payment: &PaymentProposal,
    self_send: &SelfSendProposal,
    tx_first_key_image: &KeyImage,
    devices: &AccountDevices,
) -> Result<(OutputEnote<CarrotEnote>, OutputEnote<CarrotEnote>)> {
    let payment_enote = make_carrot_enote(payment, tx_first_key_image)?;
    let ephemeral_pubkey = payment_enote.enote.ephemeral_pubkey;

    let derive_type = devices.resolve_derive_type(self_send.index.derive_type)?;
    let internal = derive_type == DeriveType::Carrot && devices.view_balance().is_ok();
    let self_send_enote = if internal {
        make_internal_self_send_enote(self_send, devices, &ephemeral_pubkey, tx_first_key_image)?
    } else {
        make_special_self_send_enote(self_send, devices, &ephemeral_pubkey, tx_first_key_image)?
    };

    Ok((payment_enote, self_send_enote))
}

// ═══════════════════════════════════════════════════════════════════════════════
// COINBASE
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a coinbase enote: cleartext amount, main address, no payment id.
pub fn make_coinbase_enote(
    proposal: &PaymentProposal,
    block_index: u64,
) -> Result<CarrotCoinbaseEnote> {
    let destination = &proposal.destination;
    destination.validate()?;
    require_main_address(destination, "coinbase")?;
    require_null_payment_id(destination, "coinbase")?;

    let input_context = InputContext::coinbase(block_index);
    let spend_point = destination.spend_pubkey.decompress_torsion_free()?;
    let d_e = make_ephemeral_privkey(
        &proposal.randomness,
        &input_context,
        &destination.spend_pubkey,
        &PaymentId::NULL,
    )?;
    let ephemeral_pubkey = make_ephemeral_pubkey(&d_e, &spend_point, false);
    let ecdh = make_sender_ecdh(&d_e, &destination.view_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, &ephemeral_pubkey, &input_context);

    let commitment = AmountCommitment::from_point(&clear_commit(proposal.amount));
    let extensions = make_onetime_extensions(&secret, &commitment)?;
    let ko = make_onetime_address(&spend_point, &extensions);

    Ok(CarrotCoinbaseEnote {
        onetime_address: ko,
        amount: proposal.amount,
        anchor_enc: encrypt_anchor(&proposal.randomness, &secret, &ko),
        view_tag: compute_view_tag(&ecdh, &input_context, &ko),
        ephemeral_pubkey,
        block_index,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEGACY
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a pre-Carrot CryptoNote enote at `output_index`.
pub fn make_legacy_enote(
    proposal: &PaymentProposal,
    input_context: &InputContext,
    output_index: u64,
) -> Result<OutputEnote<LegacyEnote>> {
    let destination = &proposal.destination;
    destination.validate()?;
    require_null_payment_id(destination, "legacy")?;

    let spend_point = destination.spend_pubkey.decompress_torsion_free()?;
    let view_point = destination.view_pubkey.decompress_torsion_free()?;
    let r = make_legacy_ephemeral_privkey(
        &proposal.randomness,
        input_context,
        &destination.spend_pubkey,
    )?;
    let tx_pubkey = make_legacy_tx_pubkey(&r, &spend_point, destination.is_subaddress);
    let derivation = make_legacy_derivation(&(r * view_point));

    let k_o = make_legacy_onetime_extension(&derivation, output_index)?;
    let ko = carrot_core::OnetimeAddress::from_point(&(EdwardsPoint::mul_base(&k_o) + spend_point));
    let z = make_legacy_commitment_mask(&k_o)?;

    let enote = LegacyEnote {
        onetime_address: ko,
        amount_commitment: AmountCommitment::from_point(&commit(proposal.amount, &z)),
        amount_enc: encrypt_legacy_amount(proposal.amount, &k_o),
        view_tag: compute_legacy_view_tag(&derivation, output_index),
        tx_pubkey,
        output_index,
    };

    Ok(OutputEnote {
        enote,
        amount: proposal.amount,
        amount_blinding_factor: SecretScalar::new(z),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERAPHIS
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a Seraphis enote. Seraphis destinations carry no payment id.
pub fn make_seraphis_enote(
    proposal: &PaymentProposal,
    tx_first_key_image: &KeyImage,
) -> Result<OutputEnote<SeraphisEnote>> {
    let destination = &proposal.destination;
    destination.validate()?;
    require_null_payment_id(destination, "seraphis")?;

    let input_context = InputContext::ringct(tx_first_key_image);
    let spend_point = destination.spend_pubkey.decompress_torsion_free()?;
    let d_e = make_ephemeral_privkey(
        &proposal.randomness,
        &input_context,
        &destination.spend_pubkey,
        &PaymentId::NULL,
    )?;
    let ephemeral_pubkey = make_ephemeral_pubkey(&d_e, &spend_point, destination.is_subaddress);
    let ecdh = make_sender_ecdh(&d_e, &destination.view_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, &ephemeral_pubkey, &input_context);

    let blinding_factor = make_amount_blinding_factor(
        &secret,
        proposal.amount,
        &destination.spend_pubkey,
        EnoteType::Payment,
    )?;
    let amount_commitment = AmountCommitment::from_point(&commit(proposal.amount, &blinding_factor));
    let extensions = make_seraphis_sender_extensions(&secret, &amount_commitment)?;
    let ko = carrot_core::OnetimeAddress::from_point(&(spend_point + extensions.to_point()));
    let tag = destination.address_tag.unwrap_or_default();

    let enote = SeraphisEnote {
        onetime_address: ko,
        amount_commitment,
        amount_enc: encrypt_amount(proposal.amount, &secret, &ko),
        anchor_enc: encrypt_anchor(&proposal.randomness, &secret, &ko),
        address_tag_enc: encrypt_address_tag(&tag, &secret, &ko),
        view_tag: compute_view_tag(&ecdh, &input_context, &ko),
        ephemeral_pubkey,
        tx_first_key_image: *tx_first_key_image,
    };

    Ok(OutputEnote {
        enote,
        amount: proposal.amount,
        amount_blinding_factor: SecretScalar::new(blinding_factor),
    })
}

/// Builds a Seraphis coinbase enote to a main address.
pub fn make_seraphis_coinbase_enote(
    proposal: &PaymentProposal,
    block_index: u64,
) -> Result<SeraphisCoinbaseEnote> {
    let destination = &proposal.destination;
    destination.validate()?;
    require_main_address(destination, "seraphis coinbase")?;
    require_null_payment_id(destination, "seraphis coinbase")?;

    let input_context = InputContext::coinbase(block_index);
    let spend_point = destination.spend_pubkey.decompress_torsion_free()?;
    let d_e = make_ephemeral_privkey(
        &proposal.randomness,
        &input_context,
        &destination.spend_pubkey,
        &PaymentId::NULL,
    )?;
    let ephemeral_pubkey = make_ephemeral_pubkey(&d_e, &spend_point, false);
    let ecdh = make_sender_ecdh(&d_e, &destination.view_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, &ephemeral_pubkey, &input_context);

    let commitment = AmountCommitment::from_point(&clear_commit(proposal.amount));
    let extensions = make_seraphis_sender_extensions(&secret, &commitment)?;
    let ko = carrot_core::OnetimeAddress::from_point(&(spend_point + extensions.to_point()));

    Ok(SeraphisCoinbaseEnote {
        onetime_address: ko,
        amount: proposal.amount,
        anchor_enc: encrypt_anchor(&proposal.randomness, &secret, &ko),
        view_tag: compute_view_tag(&ecdh, &input_context, &ko),
        ephemeral_pubkey,
        block_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrot_core::{AddressIndex, MasterSecret};

    fn devices() -> AccountDevices {
        AccountDevices::from_master(&MasterSecret::from_array([0x21; 32])).unwrap()
    }

    fn destination(devices: &AccountDevices, minor: u32) -> Destination {
        devices
            .address()
            .make_destination(&AddressIndexExtended::new(
                AddressIndex::new(0, minor),
                DeriveType::Auto,
            ))
            .unwrap()
    }

    fn first_key_image() -> KeyImage {
        KeyImage::from_array([0x77; 32])
    }

    #[test]
    fn test_builder_requires_fields() {
        assert!(matches!(
            PaymentProposalBuilder::new().amount(5).build(),
            Err(CarrotError::InvalidProposal(_))
        ));
        let devices = devices();
        let sub = destination(&devices, 2);
        assert!(PaymentProposalBuilder::new()
            .destination(sub)
            .amount(5)
            .payment_id(PaymentId::from_array([1; 8]))
            .build()
            .is_err());

        let proposal = PaymentProposalBuilder::new()
            .destination(destination(&devices, 0))
            .amount(5)
            .payment_id(PaymentId::from_array([1; 8]))
            .build()
            .unwrap();
        assert_eq!(proposal.destination.payment_id, PaymentId::from_array([1; 8]));
    }

    #[test]
    fn test_construction_is_deterministic_in_anchor() {
        let devices = devices();
        let proposal = PaymentProposal::new(destination(&devices, 3), 1_000)
            .with_randomness(JanusAnchor::from_array([4; 16]));
        let a = make_carrot_enote(&proposal, &first_key_image()).unwrap();
        let b = make_carrot_enote(&proposal, &first_key_image()).unwrap();
        assert_eq!(a.enote, b.enote);
        assert_eq!(a.amount_blinding_factor, b.amount_blinding_factor);
    }

    #[test]
    fn test_independent_anchors_unlinkable() {
        let devices = devices();
        let dest = destination(&devices, 3);
        let a = make_carrot_enote(&PaymentProposal::new(dest, 1_000), &first_key_image()).unwrap();
        let b = make_carrot_enote(&PaymentProposal::new(dest, 1_000), &first_key_image()).unwrap();
        assert_ne!(a.enote.onetime_address, b.enote.onetime_address);
        assert_ne!(a.enote.ephemeral_pubkey, b.enote.ephemeral_pubkey);
        assert_ne!(a.enote.amount_enc, b.enote.amount_enc);
        assert_ne!(a.enote.address_tag_enc, b.enote.address_tag_enc);
        assert_ne!(a.enote.amount_commitment, b.enote.amount_commitment);
    }

    #[test]
    fn test_two_out_shares_ephemeral_pubkey() {
        let sender = devices();
        let receiver = AccountDevices::from_master(&MasterSecret::from_array([0x31; 32])).unwrap();
        let payment = PaymentProposal::new(destination(&receiver, 1), 700);
        let (paid, change) = make_two_out_transaction_enotes(
            &payment,
            &SelfSendProposal::change(300),
            &first_key_image(),
            &sender,
        )
        .unwrap();
        assert_eq!(paid.enote.ephemeral_pubkey, change.enote.ephemeral_pubkey);
        assert_ne!(paid.enote.onetime_address, change.enote.onetime_address);
        assert_eq!(change.amount, 300);
    }

    #[test]
    fn test_coinbase_rejects_subaddress() {
        let devices = devices();
        let proposal = PaymentProposal::new(destination(&devices, 1), 10);
        assert!(matches!(
            make_coinbase_enote(&proposal, 100),
            Err(CarrotError::InvalidProposal(_))
        ));

        let main = PaymentProposal::new(destination(&devices, 0), 10);
        let enote = make_coinbase_enote(&main, 100).unwrap();
        assert_eq!(enote.amount, 10);
        assert!(enote.input_context().is_coinbase());
    }

    #[test]
    fn test_legacy_rejects_payment_id() {
        let devices = devices();
        let dest = destination(&devices, 0)
            .integrated(PaymentId::from_array([2; 8]))
            .unwrap();
        let ctx = InputContext::ringct(&first_key_image());
        assert!(make_legacy_enote(&PaymentProposal::new(dest, 5), &ctx, 0).is_err());
    }

    #[test]
    fn test_random_ephemeral_pubkeys_differ() {
        assert_ne!(random_ephemeral_pubkey(), random_ephemeral_pubkey());
    }
}
