//! Enote building blocks shared by construction, scanning and key images.
//!
//! ```text
//! d_e   = H_n(anchor, input_context, K^j_s, pid)
//! D_e   = d_e B  |  ConvertPointE(d_e K^j_s)
//! s_sr' = d_e ConvertPointE(K^j_v)  =  k_v D_e
//! s_sr  = H_32[s_sr'](D_e, input_context)
//! k_a   = H_n[s_sr](a, K^j_s, enote_type)        C_a = k_a G + a H
//! k^o_g, k^o_t = H_n[s_sr](C_a)                  Ko  = K^j_s + k^o_g G + k^o_t T
//! ```
//!
//! Field masks are `H_16`/`H_8` of `(s_sr, Ko)` under their own domains.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::constants::*;
use carrot_core::{
    AddressSpendPubkey, AddressTag, AddressViewPubkey, AmountCommitment, EcdhSecret,
    EncryptedAddressTag, EncryptedAmount, EncryptedJanusAnchor, EncryptedPaymentId,
    EnoteEphemeralPubkey, EnoteType, InputContext, JanusAnchor, OnetimeAddress, PaymentId, Result,
    SenderReceiverSecret, TxPubkey,
};
use carrot_crypto::hash::{encode_varint, keccak256_concat};
use carrot_crypto::{
    derive_bytes, derive_nonzero_scalar, generator_t, hash_to_scalar, nonzero,
    to_ephemeral_pubkey, x25519_base, xor_bytes, EdwardsBytes, Transcript,
};
use carrot_keys::SeraphisExtensions;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY EXCHANGE
// ═══════════════════════════════════════════════════════════════════════════════

/// `d_e = H_n("Carrot sending key normal", anchor, input_context, K^j_s, pid)`
pub fn make_ephemeral_privkey(
    anchor: &JanusAnchor,
    input_context: &InputContext,
    spend_pubkey: &AddressSpendPubkey,
    payment_id: &PaymentId,
) -> Result<Scalar> {
    let transcript = Transcript::new(DOMAIN_EPHEMERAL_PRIVKEY)
        .append(anchor)
        .append(input_context)
        .append(spend_pubkey)
        .append(payment_id);
    derive_nonzero_scalar(&transcript, &[], "ephemeral privkey")
}

/// `D_e = d_e B` for main addresses, `ConvertPointE(d_e K^j_s)` for subaddresses.
pub fn make_ephemeral_pubkey(
    ephemeral_privkey: &Scalar,
    spend_point: &EdwardsPoint,
    is_subaddress: bool,
) -> EnoteEphemeralPubkey {
    if is_subaddress {
        to_ephemeral_pubkey(&(ephemeral_privkey * spend_point))
    } else {
        x25519_base(ephemeral_privkey)
    }
}

/// Sender side `s_sr' = d_e ConvertPointE(K^j_v)`.
///
/// # Errors
/// `InvalidPoint` if `K^j_v` is not in the prime-order subgroup.
pub fn make_sender_ecdh(
    ephemeral_privkey: &Scalar,
    view_pubkey: &AddressViewPubkey,
) -> Result<EcdhSecret> {
    let view_point = view_pubkey.decompress_torsion_free()?;
    let shared = to_ephemeral_pubkey(&(ephemeral_privkey * view_point));
    Ok(EcdhSecret::from_array(shared.to_array()))
}

/// `s_sr = H_32[s_sr'](D_e, input_context)`
pub fn make_sender_receiver_secret(
    ecdh: &EcdhSecret,
    ephemeral_pubkey: &EnoteEphemeralPubkey,
    input_context: &InputContext,
) -> SenderReceiverSecret {
    let transcript = Transcript::new(DOMAIN_SENDER_RECEIVER_SECRET)
        .append(ephemeral_pubkey)
        .append(input_context);
    SenderReceiverSecret::from_array(derive_bytes(&transcript, ecdh.as_bytes()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ONETIME ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_a = H_n[s_sr](a, K^j_s, enote_type)`
pub fn make_amount_blinding_factor(
    secret: &SenderReceiverSecret,
    amount: u64,
    spend_pubkey: &AddressSpendPubkey,
    enote_type: EnoteType,
) -> Result<Scalar> {
    let transcript = Transcript::new(DOMAIN_AMOUNT_BLINDING_FACTOR)
        .append_u64(amount)
        .append(spend_pubkey)
        .append_u8(enote_type.to_byte());
    derive_nonzero_scalar(&transcript, secret.as_bytes(), "amount blinding factor")
}

/// Sender extensions `(k^o_g, k^o_t)` of a dual-base onetime address.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OnetimeExtensions {
    /// `k^o_g`
    pub g: Scalar,
    /// `k^o_t`
    pub t: Scalar,
}

impl OnetimeExtensions {
    /// `k^o_g G + k^o_t T`
    pub fn to_point(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.g) + self.t * generator_t()
    }
}

impl std::fmt::Debug for OnetimeExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OnetimeExtensions([REDACTED])")
    }
}

/// `k^o_g = H_n[s_sr](C_a)`, `k^o_t = H_n[s_sr](C_a)`
pub fn make_onetime_extensions(
    secret: &SenderReceiverSecret,
    amount_commitment: &AmountCommitment,
) -> Result<OnetimeExtensions> {
    let derive = |domain: &[u8], what| {
        derive_nonzero_scalar(
            &Transcript::new(domain).append(amount_commitment),
            secret.as_bytes(),
            what,
        )
    };
    Ok(OnetimeExtensions {
        g: derive(DOMAIN_ONETIME_EXTENSION_G, "onetime extension g")?,
        t: derive(DOMAIN_ONETIME_EXTENSION_T, "onetime extension t")?,
    })
}

/// `Ko = K^j_s + k^o_g G + k^o_t T`
pub fn make_onetime_address(
    spend_point: &EdwardsPoint,
    extensions: &OnetimeExtensions,
) -> OnetimeAddress {
    OnetimeAddress::from_point(&(spend_point + extensions.to_point()))
}

/// Seraphis sender extensions `k^o_{g,x,u} = H_n[s_sr](C_a)`.
pub fn make_seraphis_sender_extensions(
    secret: &SenderReceiverSecret,
    amount_commitment: &AmountCommitment,
) -> Result<SeraphisExtensions> {
    let derive = |domain: &[u8], what| {
        derive_nonzero_scalar(
            &Transcript::new(domain).append(amount_commitment),
            secret.as_bytes(),
            what,
        )
    };
    Ok(SeraphisExtensions {
        g: derive(DOMAIN_SERAPHIS_SENDER_EXTENSION_G, "seraphis sender extension g")?,
        x: derive(DOMAIN_SERAPHIS_SENDER_EXTENSION_X, "seraphis sender extension x")?,
        u: derive(DOMAIN_SERAPHIS_SENDER_EXTENSION_U, "seraphis sender extension u")?,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD ENCRYPTION
// ═══════════════════════════════════════════════════════════════════════════════

fn mask<const N: usize>(
    domain: &[u8],
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> [u8; N] {
    derive_bytes(&Transcript::new(domain).append(onetime_address), secret.as_bytes())
}

/// `anchor_enc = anchor ⊕ H_16[s_sr](Ko)`
pub fn encrypt_anchor(
    anchor: &JanusAnchor,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> EncryptedJanusAnchor {
    let m = mask(DOMAIN_ENCRYPTION_MASK_ANCHOR, secret, onetime_address);
    EncryptedJanusAnchor::from_array(xor_bytes(anchor.as_bytes(), &m))
}

/// Inverse of [`encrypt_anchor`].
pub fn decrypt_anchor(
    anchor_enc: &EncryptedJanusAnchor,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> JanusAnchor {
    let m = mask(DOMAIN_ENCRYPTION_MASK_ANCHOR, secret, onetime_address);
    JanusAnchor::from_array(xor_bytes(anchor_enc.as_bytes(), &m))
}

/// `a_enc = a ⊕ H_8[s_sr](Ko)`
pub fn encrypt_amount(
    amount: u64,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> EncryptedAmount {
    let m = mask(DOMAIN_ENCRYPTION_MASK_AMOUNT, secret, onetime_address);
    EncryptedAmount::from_array(xor_bytes(&amount.to_le_bytes(), &m))
}

/// Inverse of [`encrypt_amount`].
pub fn decrypt_amount(
    amount_enc: &EncryptedAmount,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> u64 {
    let m = mask(DOMAIN_ENCRYPTION_MASK_AMOUNT, secret, onetime_address);
    u64::from_le_bytes(xor_bytes(amount_enc.as_bytes(), &m))
}

/// `pid_enc = pid ⊕ H_8[s_sr](Ko)`
pub fn encrypt_payment_id(
    payment_id: &PaymentId,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> EncryptedPaymentId {
    let m = mask(DOMAIN_ENCRYPTION_MASK_PAYMENT_ID, secret, onetime_address);
    EncryptedPaymentId::from_array(xor_bytes(payment_id.as_bytes(), &m))
}

/// Inverse of [`encrypt_payment_id`].
pub fn decrypt_payment_id(
    payment_id_enc: &EncryptedPaymentId,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> PaymentId {
    let m = mask(DOMAIN_ENCRYPTION_MASK_PAYMENT_ID, secret, onetime_address);
    PaymentId::from_array(xor_bytes(payment_id_enc.as_bytes(), &m))
}

/// `tag_enc = tag ⊕ H_16[s_sr](Ko)`
pub fn encrypt_address_tag(
    tag: &AddressTag,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> EncryptedAddressTag {
    let m = mask(DOMAIN_ENCRYPTION_MASK_ADDRESS_TAG, secret, onetime_address);
    EncryptedAddressTag::from_array(xor_bytes(tag.as_bytes(), &m))
}

/// Inverse of [`encrypt_address_tag`].
pub fn decrypt_address_tag(
    tag_enc: &EncryptedAddressTag,
    secret: &SenderReceiverSecret,
    onetime_address: &OnetimeAddress,
) -> AddressTag {
    let m = mask(DOMAIN_ENCRYPTION_MASK_ADDRESS_TAG, secret, onetime_address);
    AddressTag::from_array(xor_bytes(tag_enc.as_bytes(), &m))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEGACY FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// `r = H_n("Carrot legacy sending key", anchor, input_context, K^j_s)`
pub fn make_legacy_ephemeral_privkey(
    anchor: &JanusAnchor,
    input_context: &InputContext,
    spend_pubkey: &AddressSpendPubkey,
) -> Result<Scalar> {
    let transcript = Transcript::new(DOMAIN_LEGACY_EPHEMERAL_PRIVKEY)
        .append(anchor)
        .append(input_context)
        .append(spend_pubkey);
    derive_nonzero_scalar(&transcript, &[], "legacy ephemeral privkey")
}

/// `R = r G` for main addresses, `r K^j_s` for subaddresses.
pub fn make_legacy_tx_pubkey(
    ephemeral_privkey: &Scalar,
    spend_point: &EdwardsPoint,
    is_subaddress: bool,
) -> TxPubkey {
    let point = if is_subaddress {
        ephemeral_privkey * spend_point
    } else {
        EdwardsPoint::mul_base(ephemeral_privkey)
    };
    TxPubkey::from_point(&point)
}

/// `D = 8 P` where `P` is `r K^j_v` (sender) or `k_v R` (receiver).
pub fn make_legacy_derivation(shared_point: &EdwardsPoint) -> [u8; 32] {
    shared_point.mul_by_cofactor().compress().to_bytes()
}

/// `k^o = H_s(D || varint(i))`
pub fn make_legacy_onetime_extension(derivation: &[u8; 32], output_index: u64) -> Result<Scalar> {
    let index = encode_varint(output_index);
    nonzero(
        hash_to_scalar(&[&derivation[..], index.as_slice()]),
        "legacy onetime extension",
    )
}

/// `keccak("amount" || k^o)[..8]`
fn legacy_amount_mask(onetime_extension: &Scalar) -> [u8; 8] {
    let mut key = onetime_extension.to_bytes();
    let mut hash = keccak256_concat(&[LEGACY_AMOUNT_PREFIX, &key[..]]);
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    key.zeroize();
    hash.zeroize();
    out
}

/// Legacy `a_enc = a ⊕ keccak("amount" || k^o)[..8]`
pub fn encrypt_legacy_amount(amount: u64, onetime_extension: &Scalar) -> EncryptedAmount {
    EncryptedAmount::from_array(xor_bytes(
        &amount.to_le_bytes(),
        &legacy_amount_mask(onetime_extension),
    ))
}

/// Inverse of [`encrypt_legacy_amount`].
pub fn decrypt_legacy_amount(amount_enc: &EncryptedAmount, onetime_extension: &Scalar) -> u64 {
    u64::from_le_bytes(xor_bytes(
        amount_enc.as_bytes(),
        &legacy_amount_mask(onetime_extension),
    ))
}

/// `z = H_s("commitment_mask" || k^o)`
pub fn make_legacy_commitment_mask(onetime_extension: &Scalar) -> Result<Scalar> {
    let mut key = onetime_extension.to_bytes();
    let mask = hash_to_scalar(&[LEGACY_COMMITMENT_MASK_PREFIX, &key[..]]);
    key.zeroize();
    nonzero(mask, "legacy commitment mask")
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrot_core::KeyImage;
    use carrot_crypto::{commit, compute_view_tag, x25519, SecretScalar};
    use test_case::test_case;

    fn secret() -> SenderReceiverSecret {
        SenderReceiverSecret::from_array([0x55; 32])
    }

    // Shared carrot-rs convergence fixture.
    const AMOUNT: u64 = 23_000_000_000_000;
    const SPEND_PUBKEY: &str = "1ebcddd5d98e26788ed8d8510de7f520e973902238e107a070aad104e166b6a0";
    const INPUT_CONTEXT: &str = "9423f74f3e869dc8427d8b35bb24c917480409c3f4750bff3c742f8e4d5af7bef7";
    const EPHEMERAL_PRIVKEY: &str =
        "f57ff2d7c898b755137b69e8d826801945ed72e9951850de908e9d645a0bb00d";
    const EPHEMERAL_PUBKEY: &str =
        "d8b8ce01943edd05d7db66aeb15109c58ec270796f0c76c03d58a398926aca55";
    const ECDH: &str = "baa47cfc380374b15cb5a3048099968962a66e287d78654c75b550d711e58451";
    const SENDER_RECEIVER_SECRET: &str =
        "232e62041ee1262cb3fce0d10fdbd018cca5b941ff92283676d6112aa426f76c";
    const ONETIME_ADDRESS: &str =
        "4c93cf2d7ff8556eac73025ab3019a0db220b56bdf0387e0524724cc0e409d92";

    fn hex32(s: &str) -> [u8; 32] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    fn scalar(s: &str) -> Scalar {
        Scalar::from_canonical_bytes(hex32(s)).unwrap()
    }

    fn spend_pubkey() -> AddressSpendPubkey {
        AddressSpendPubkey::from_hex(SPEND_PUBKEY).unwrap()
    }

    fn input_context() -> InputContext {
        InputContext::from_hex(INPUT_CONTEXT).unwrap()
    }

    fn converged_secret() -> SenderReceiverSecret {
        SenderReceiverSecret::from_array(hex32(SENDER_RECEIVER_SECRET))
    }

    fn converged_onetime_address() -> OnetimeAddress {
        OnetimeAddress::from_hex(ONETIME_ADDRESS).unwrap()
    }

    #[test]
    fn test_converge_ephemeral_privkey() {
        let d_e = make_ephemeral_privkey(
            &JanusAnchor::from_hex("caee1381775487a0982557f0d2680b55").unwrap(),
            &input_context(),
            &spend_pubkey(),
            &PaymentId::from_hex("4321734f56621440").unwrap(),
        )
        .unwrap();
        assert_eq!(
            hex::encode(d_e.to_bytes()),
            "6d4645a0e398ff430f68eaa78240dd2c04051e9a50438cd9c9c3c0e12af68b0b"
        );
    }

    #[test]
    fn test_converge_ephemeral_pubkeys() {
        let d_e = scalar(EPHEMERAL_PRIVKEY);
        let spend_point = spend_pubkey().decompress().unwrap();
        assert_eq!(
            make_ephemeral_pubkey(&d_e, &spend_point, false).to_hex(),
            "2987777565c02409dfe871cc27b2334f5ade9d4ad014012c568367b80e99c666"
        );
        assert_eq!(
            make_ephemeral_pubkey(&d_e, &spend_point, true).to_hex(),
            EPHEMERAL_PUBKEY
        );
    }

    #[test]
    fn test_converge_ecdh() {
        let ephemeral = EnoteEphemeralPubkey::from_hex(EPHEMERAL_PUBKEY).unwrap();
        let receiver = x25519(
            &scalar("60eff3ec120a12bb44d4258816e015952fc5651040da8c8af58c17676485f200"),
            &ephemeral,
        );
        assert_eq!(receiver.to_hex(), ECDH);

        let view_pubkey = AddressViewPubkey::from_hex(
            "75b7bc7759da5d9ad5ff421650949b27a13ea369685eb4d1bd59abc518e25fe2",
        )
        .unwrap();
        let sender = make_sender_ecdh(&scalar(EPHEMERAL_PRIVKEY), &view_pubkey).unwrap();
        assert_eq!(sender, receiver);
    }

    #[test]
    fn test_converge_sender_receiver_secret() {
        let s_sr = make_sender_receiver_secret(
            &EcdhSecret::from_array(hex32(ECDH)),
            &EnoteEphemeralPubkey::from_hex(EPHEMERAL_PUBKEY).unwrap(),
            &input_context(),
        );
        assert_eq!(s_sr, converged_secret());
    }

    #[test_case(EnoteType::Payment, "9fc3581e926a844877479d829ff9deeae17ce77feaf2c3c972923510e04f1f02" ; "payment")]
    #[test_case(EnoteType::Change, "dda34eac46030e4084f5a2c808d0a82ffaa82cbf01d4a74d7ee0d4fe72c31a0f" ; "change")]
    fn test_converge_amount_blinding_factor(enote_type: EnoteType, expected: &str) {
        let k_a =
            make_amount_blinding_factor(&converged_secret(), AMOUNT, &spend_pubkey(), enote_type)
                .unwrap();
        assert_eq!(hex::encode(k_a.to_bytes()), expected);
    }

    #[test]
    fn test_converge_onetime_address() {
        let k_a = scalar("9fc3581e926a844877479d829ff9deeae17ce77feaf2c3c972923510e04f1f02");
        let commitment = AmountCommitment::from_point(&commit(AMOUNT, &k_a));
        assert_eq!(
            commitment.to_hex(),
            "ca5f0fc2fe7a4fe628e6f08b2c0eb44f3af3b87e1619b2ed2de296f7e425512b"
        );

        let extensions = make_onetime_extensions(&converged_secret(), &commitment).unwrap();
        let spend_point = spend_pubkey().decompress().unwrap();
        assert_eq!(
            make_onetime_address(&spend_point, &extensions),
            converged_onetime_address()
        );
    }

    #[test]
    fn test_converge_view_tag() {
        let tag = compute_view_tag(
            &EcdhSecret::from_array(hex32(ECDH)),
            &input_context(),
            &converged_onetime_address(),
        );
        assert_eq!(tag.to_hex(), "0176f6");
    }

    #[test]
    fn test_converge_encryption_masks() {
        let (s_sr, ko) = (converged_secret(), converged_onetime_address());
        let anchor_mask = encrypt_anchor(&JanusAnchor::from_array([0; 16]), &s_sr, &ko);
        assert_eq!(anchor_mask.to_hex(), "52d95a8e441f26a056f55094938cbfa8");
        let amount_mask = encrypt_amount(0, &s_sr, &ko);
        assert_eq!(amount_mask.to_hex(), "98d25d1db65b6a3e");
        let pid_mask = encrypt_payment_id(&PaymentId::NULL, &s_sr, &ko);
        assert_eq!(pid_mask.to_hex(), "b57a1560e82e2483");
    }

    #[test]
    fn test_sender_and_receiver_agree_on_main_address() {
        let k_v = SecretScalar::new(Scalar::from(4242u64));
        let view_pubkey = AddressViewPubkey::from_point(&k_v.public_key());
        let spend_point = EdwardsPoint::mul_base(&Scalar::from(99u64));

        let d_e = Scalar::from(31337u64);
        let ephemeral = make_ephemeral_pubkey(&d_e, &spend_point, false);
        let sender = make_sender_ecdh(&d_e, &view_pubkey).unwrap();
        let receiver = x25519(k_v.expose(), &ephemeral);
        assert_eq!(sender, receiver);
    }

    #[test]
    fn test_sender_and_receiver_agree_on_subaddress() {
        let k_v = Scalar::from(4242u64);
        let spend_point = EdwardsPoint::mul_base(&Scalar::from(99u64));
        let view_pubkey = AddressViewPubkey::from_point(&(k_v * spend_point));

        let d_e = Scalar::from(777u64);
        let ephemeral = make_ephemeral_pubkey(&d_e, &spend_point, true);
        assert_eq!(
            make_sender_ecdh(&d_e, &view_pubkey).unwrap(),
            x25519(&k_v, &ephemeral)
        );
    }

    #[test]
    fn test_torsioned_view_key_rejected() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0xec;
        bytes[31] = 0x7f;
        let err = make_sender_ecdh(&Scalar::ONE, &AddressViewPubkey::from_array(bytes));
        assert!(err.is_err());
    }

    #[test]
    fn test_ephemeral_privkey_binds_every_input() {
        let anchor = JanusAnchor::from_array([1; 16]);
        let ctx = InputContext::ringct(&KeyImage::from_array([2; 32]));
        let spend = AddressSpendPubkey::from_array([3; 32]);
        let base = make_ephemeral_privkey(&anchor, &ctx, &spend, &PaymentId::NULL).unwrap();

        let other_anchor = JanusAnchor::from_array([9; 16]);
        assert_ne!(
            base,
            make_ephemeral_privkey(&other_anchor, &ctx, &spend, &PaymentId::NULL).unwrap()
        );
        let pid = PaymentId::from_array([7; 8]);
        assert_ne!(base, make_ephemeral_privkey(&anchor, &ctx, &spend, &pid).unwrap());
        assert_eq!(
            base,
            make_ephemeral_privkey(&anchor, &ctx, &spend, &PaymentId::NULL).unwrap()
        );
    }

    #[test]
    fn test_blinding_factor_binds_enote_type() {
        let spend = AddressSpendPubkey::from_array([3; 32]);
        let payment = make_amount_blinding_factor(&secret(), 5, &spend, EnoteType::Payment).unwrap();
        let change = make_amount_blinding_factor(&secret(), 5, &spend, EnoteType::Change).unwrap();
        assert_ne!(payment, change);
    }

    #[test]
    fn test_field_encryption_roundtrip() {
        let ko = OnetimeAddress::from_array([8; 32]);
        let anchor = JanusAnchor::from_array([0xa5; 16]);
        assert_eq!(decrypt_anchor(&encrypt_anchor(&anchor, &secret(), &ko), &secret(), &ko), anchor);
        assert_eq!(decrypt_amount(&encrypt_amount(123_456, &secret(), &ko), &secret(), &ko), 123_456);

        let pid = PaymentId::from_array([4; 8]);
        assert_eq!(
            decrypt_payment_id(&encrypt_payment_id(&pid, &secret(), &ko), &secret(), &ko),
            pid
        );
        let tag = AddressTag::from_array([6; 16]);
        assert_eq!(
            decrypt_address_tag(&encrypt_address_tag(&tag, &secret(), &ko), &secret(), &ko),
            tag
        );
    }

    #[test]
    fn test_masks_are_domain_separated() {
        let ko = OnetimeAddress::from_array([8; 32]);
        let zero_pid = encrypt_payment_id(&PaymentId::NULL, &secret(), &ko);
        let zero_amount = encrypt_amount(0, &secret(), &ko);
        assert_ne!(zero_pid.as_bytes(), zero_amount.as_bytes());
    }

    #[test]
    fn test_onetime_address_reconstruction() {
        let spend_point = EdwardsPoint::mul_base(&Scalar::from(11u64));
        let commitment = AmountCommitment::from_point(&commit(10, &Scalar::from(3u64)));
        let extensions = make_onetime_extensions(&secret(), &commitment).unwrap();
        let ko = make_onetime_address(&spend_point, &extensions);
        assert_eq!(
            ko.decompress().unwrap() - extensions.to_point(),
            spend_point
        );
        assert_eq!(format!("{:?}", extensions), "OnetimeExtensions([REDACTED])");
    }

    #[test]
    fn test_legacy_derivation_symmetry() {
        let k_v = Scalar::from(17u64);
        let r = Scalar::from(23u64);
        let spend_point = EdwardsPoint::mul_base(&Scalar::from(5u64));
        let view_point = k_v * spend_point;

        let tx_pubkey = make_legacy_tx_pubkey(&r, &spend_point, true);
        let sender = make_legacy_derivation(&(r * view_point));
        let receiver = make_legacy_derivation(&(k_v * tx_pubkey.decompress().unwrap()));
        assert_eq!(sender, receiver);

        let k_o = make_legacy_onetime_extension(&sender, 1).unwrap();
        assert_ne!(k_o, make_legacy_onetime_extension(&sender, 2).unwrap());
        let amount_enc = encrypt_legacy_amount(900, &k_o);
        assert_eq!(decrypt_legacy_amount(&amount_enc, &k_o), 900);
        assert!(make_legacy_commitment_mask(&k_o).is_ok());
    }
}
