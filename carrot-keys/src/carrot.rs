//! Carrot key hierarchy.
//!
//! ```text
//! s_m                                       master secret
//! ├── k_ps = H_n[s_m]()                     prove-spend key
//! └── s_vb = H_32[s_m]()                    view-balance secret
//!     ├── k_gi = H_n[s_vb]()                generate-image key
//!     ├── k_vi = H_n[s_vb]()                incoming view key
//!     └── s_ga = H_32[s_vb]()               generate-address secret
//!         └── s_ct = H_32[s_ga]()           cipher-tag secret
//!
//! K_s   = k_gi G + k_ps T
//! K_v   = k_vi K_s
//! K^0_v = k_vi G
//!
//! s^j_gen     = H_32[s_ga](major, minor)
//! k^j_subscal = H_n[s^j_gen](K_s, major, minor)
//! K^j_s = k^j_subscal K_s
//! K^j_v = k^j_subscal K_v
//! ```
//!
//! Each level is a strictly weaker capability than its parent. The in-memory
//! devices below each hold a single node of this tree.

use std::sync::Arc;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::constants::{
    DOMAIN_ADDRESS_INDEX_GEN, DOMAIN_CIPHER_TAG_SECRET, DOMAIN_GENERATE_ADDRESS_SECRET,
    DOMAIN_GENERATE_IMAGE_KEY, DOMAIN_INCOMING_VIEW_KEY, DOMAIN_INTERNAL_SECRET_CHANGE,
    DOMAIN_INTERNAL_SECRET_SELF_SPEND, DOMAIN_PROVE_SPEND_KEY, DOMAIN_SUBADDRESS_SCALAR,
    DOMAIN_VIEW_BALANCE_SECRET,
};
use carrot_core::{
    AddressIndex, AddressIndexExtended, AddressIndexGenerator, AddressSpendPubkey, AddressTag,
    AddressViewPubkey, CarrotError, CipherTagSecret, DeriveType, EcdhSecret, EnoteEphemeralPubkey,
    GenerateAddressSecret, InputContext, JanusAnchor, MasterSecret, OnetimeAddress, Result,
    SelfSendType, SenderReceiverSecret, ViewBalanceSecret, ViewTag,
};
use carrot_crypto::{
    compute_internal_view_tag, derive_bytes, derive_nonzero_scalar, generator_t, hash_to_point,
    x25519, AddressTagCipher, EdwardsBytes, SecretScalar, Transcript,
};

use crate::device::{
    check_derive_type, AddressDevice, GenerateAddressSecretDevice, GenerateImageKeyDevice,
    ResolvedAddress, SpendKeyDevice, SubaddressOpening, ViewBalanceSecretDevice,
    ViewIncomingKeyDevice,
};
use crate::legacy::janus_anchor_special;

const DERIVE_TYPE: DeriveType = DeriveType::Carrot;

// ═══════════════════════════════════════════════════════════════════════════════
// DERIVATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_ps = H_n[s_m]()`
pub fn make_prove_spend_key(master: &MasterSecret) -> Result<SecretScalar> {
    derive_nonzero_scalar(
        &Transcript::new(DOMAIN_PROVE_SPEND_KEY),
        master.as_bytes(),
        "prove-spend key",
    )
    .map(SecretScalar::new)
}

/// `s_vb = H_32[s_m]()`
pub fn make_view_balance_secret(master: &MasterSecret) -> ViewBalanceSecret {
    ViewBalanceSecret::from_array(derive_bytes(
        &Transcript::new(DOMAIN_VIEW_BALANCE_SECRET),
        master.as_bytes(),
    ))
}

/// `k_gi = H_n[s_vb]()`
pub fn make_generate_image_key(view_balance: &ViewBalanceSecret) -> Result<SecretScalar> {
    derive_nonzero_scalar(
        &Transcript::new(DOMAIN_GENERATE_IMAGE_KEY),
        view_balance.as_bytes(),
        "generate-image key",
    )
    .map(SecretScalar::new)
}

/// `k_vi = H_n[s_vb]()`
pub fn make_view_incoming_key(view_balance: &ViewBalanceSecret) -> Result<SecretScalar> {
    derive_nonzero_scalar(
        &Transcript::new(DOMAIN_INCOMING_VIEW_KEY),
        view_balance.as_bytes(),
        "incoming view key",
    )
    .map(SecretScalar::new)
}

/// `s_ga = H_32[s_vb]()`
pub fn make_generate_address_secret(view_balance: &ViewBalanceSecret) -> GenerateAddressSecret {
    GenerateAddressSecret::from_array(derive_bytes(
        &Transcript::new(DOMAIN_GENERATE_ADDRESS_SECRET),
        view_balance.as_bytes(),
    ))
}

/// `s_ct = H_32[s_ga]()`
pub fn make_cipher_tag_secret(generate_address: &GenerateAddressSecret) -> CipherTagSecret {
    CipherTagSecret::from_array(derive_bytes(
        &Transcript::new(DOMAIN_CIPHER_TAG_SECRET),
        generate_address.as_bytes(),
    ))
}

/// `K_s = k_gi G + k_ps T`
pub fn make_spend_pubkey(generate_image_key: &Scalar, prove_spend_key: &Scalar) -> EdwardsPoint {
    EdwardsPoint::mul_base(generate_image_key) + prove_spend_key * generator_t()
}

/// `s^j_gen = H_32[s_ga](major, minor)`
pub fn make_index_extension_generator(
    generate_address: &GenerateAddressSecret,
    index: &AddressIndex,
) -> AddressIndexGenerator {
    let transcript = Transcript::new(DOMAIN_ADDRESS_INDEX_GEN)
        .append_u32(index.major)
        .append_u32(index.minor);
    AddressIndexGenerator::from_array(derive_bytes(&transcript, generate_address.as_bytes()))
}

/// `k^j_subscal = H_n[s^j_gen](K_s, major, minor)`
pub fn make_subaddress_scalar(
    generator: &AddressIndexGenerator,
    account_spend_pubkey: &AddressSpendPubkey,
    index: &AddressIndex,
) -> Result<Scalar> {
    let transcript = Transcript::new(DOMAIN_SUBADDRESS_SCALAR)
        .append(account_spend_pubkey)
        .append_u32(index.major)
        .append_u32(index.minor);
    derive_nonzero_scalar(&transcript, generator.as_bytes(), "subaddress scalar")
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT SECRETS
// ═══════════════════════════════════════════════════════════════════════════════

/// The Carrot secret tree, unlocked down to some level.
///
/// Secrets above the unlock level are `None`. Public keys are always present.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CarrotKeys {
    prove_spend_key: Option<SecretScalar>,
    view_balance_secret: Option<ViewBalanceSecret>,
    generate_image_key: Option<SecretScalar>,
    view_incoming_key: Option<SecretScalar>,
    generate_address_secret: GenerateAddressSecret,
    #[zeroize(skip)]
    spend_pubkey: AddressSpendPubkey,
    #[zeroize(skip)]
    view_pubkey: AddressViewPubkey,
    #[zeroize(skip)]
    main_view_pubkey: AddressViewPubkey,
}

impl CarrotKeys {
    /// Unlocks the whole tree from the master secret.
    pub fn from_master(master: &MasterSecret) -> Result<Self> {
        let prove_spend_key = make_prove_spend_key(master)?;
        let mut keys = Self::from_view_balance_with(
            make_view_balance_secret(master),
            |generate_image_key| {
                Ok(AddressSpendPubkey::from_point(&make_spend_pubkey(
                    generate_image_key,
                    prove_spend_key.expose(),
                )))
            },
        )?;
        keys.prove_spend_key = Some(prove_spend_key);
        Ok(keys)
    }

    /// View-balance wallet: sees every enote and amount, cannot sign.
    ///
    /// # Errors
    /// `InvalidPoint` if `spend_pubkey` is unusable.
    pub fn from_view_balance(
        view_balance_secret: ViewBalanceSecret,
        spend_pubkey: AddressSpendPubkey,
    ) -> Result<Self> {
        spend_pubkey.decompress_torsion_free()?;
        Self::from_view_balance_with(view_balance_secret, |_| Ok(spend_pubkey))
    }

    fn from_view_balance_with(
        view_balance_secret: ViewBalanceSecret,
        spend_pubkey: impl FnOnce(&Scalar) -> Result<AddressSpendPubkey>,
    ) -> Result<Self> {
        let generate_image_key = make_generate_image_key(&view_balance_secret)?;
        let spend_pubkey = spend_pubkey(generate_image_key.expose())?;
        let mut keys = Self::from_view_incoming(
            make_view_incoming_key(&view_balance_secret)?,
            make_generate_address_secret(&view_balance_secret),
            spend_pubkey,
        )?;
        keys.generate_image_key = Some(generate_image_key);
        keys.view_balance_secret = Some(view_balance_secret);
        Ok(keys)
    }

    /// Incoming-view wallet: scans external enotes, cannot see change.
    pub fn from_view_incoming(
        view_incoming_key: SecretScalar,
        generate_address_secret: GenerateAddressSecret,
        spend_pubkey: AddressSpendPubkey,
    ) -> Result<Self> {
        let spend_point = spend_pubkey.decompress_torsion_free()?;
        Ok(Self {
            prove_spend_key: None,
            view_balance_secret: None,
            generate_image_key: None,
            view_pubkey: AddressViewPubkey::from_point(&(view_incoming_key.expose() * spend_point)),
            main_view_pubkey: AddressViewPubkey::from_point(&view_incoming_key.public_key()),
            view_incoming_key: Some(view_incoming_key),
            generate_address_secret,
            spend_pubkey,
        })
    }

    /// Address-generation wallet: issues addresses, cannot scan.
    pub fn address_only(
        generate_address_secret: GenerateAddressSecret,
        spend_pubkey: AddressSpendPubkey,
        view_pubkey: AddressViewPubkey,
        main_view_pubkey: AddressViewPubkey,
    ) -> Result<Self> {
        spend_pubkey.decompress_torsion_free()?;
        view_pubkey.decompress_torsion_free()?;
        main_view_pubkey.decompress_torsion_free()?;
        Ok(Self {
            prove_spend_key: None,
            view_balance_secret: None,
            generate_image_key: None,
            view_incoming_key: None,
            generate_address_secret,
            spend_pubkey,
            view_pubkey,
            main_view_pubkey,
        })
    }

    /// `K_s`
    pub fn spend_pubkey(&self) -> AddressSpendPubkey {
        self.spend_pubkey
    }

    /// `K_v = k_vi K_s`
    pub fn view_pubkey(&self) -> AddressViewPubkey {
        self.view_pubkey
    }

    /// `K^0_v = k_vi G`
    pub fn main_view_pubkey(&self) -> AddressViewPubkey {
        self.main_view_pubkey
    }

    /// `s_vb`, for view-balance exports.
    pub fn view_balance_secret(&self) -> Option<&ViewBalanceSecret> {
        self.view_balance_secret.as_ref()
    }

    /// Whether the prove-spend key is present.
    pub fn can_spend(&self) -> bool {
        self.prove_spend_key.is_some()
    }

    /// Device holding `k_vi`.
    pub fn view_incoming_device(&self) -> Option<CarrotViewIncomingKey> {
        self.view_incoming_key.clone().map(CarrotViewIncomingKey::new)
    }

    /// Device holding `s_ga`.
    pub fn generate_address_device(&self) -> CarrotGenerateAddressSecret {
        CarrotGenerateAddressSecret::new(self.generate_address_secret.clone())
    }

    /// Device holding `s_vb`.
    pub fn view_balance_device(&self) -> Option<CarrotViewBalanceSecret> {
        self.view_balance_secret.clone().map(CarrotViewBalanceSecret::new)
    }

    /// Device holding `k_gi` only.
    pub fn generate_image_device(&self) -> Option<CarrotGenerateImageKey> {
        self.generate_image_key.clone().map(CarrotGenerateImageKey::new)
    }

    /// Device holding `k_gi` and `k_ps`.
    pub fn spend_device(&self) -> Option<CarrotSpendKey> {
        match (&self.generate_image_key, &self.prove_spend_key) {
            (Some(k_gi), Some(k_ps)) => Some(CarrotSpendKey::new(k_gi.clone(), k_ps.clone())),
            _ => None,
        }
    }

    /// Cipher-tag secret `s_ct`.
    pub fn cipher_tag_secret(&self) -> CipherTagSecret {
        make_cipher_tag_secret(&self.generate_address_secret)
    }

    /// Address device over fresh generate-address and view-incoming devices.
    pub fn address_device(&self) -> Result<CarrotAddressDevice> {
        CarrotAddressDevice::new(
            Arc::new(self.generate_address_device()),
            self.view_incoming_device()
                .map(|device| Arc::new(device) as Arc<dyn ViewIncomingKeyDevice>),
            self.spend_pubkey,
            self.view_pubkey,
            self.main_view_pubkey,
            &self.cipher_tag_secret(),
        )
    }
}

impl std::fmt::Debug for CarrotKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrotKeys")
            .field("spend_pubkey", &self.spend_pubkey)
            .field("view_pubkey", &self.view_pubkey)
            .field("main_view_pubkey", &self.main_view_pubkey)
            .field("can_spend", &self.can_spend())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICES
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory view-incoming device holding `k_vi`.
#[derive(Debug)]
pub struct CarrotViewIncomingKey {
    view_incoming_key: SecretScalar,
}

impl CarrotViewIncomingKey {
    /// Wraps `k_vi`.
    pub fn new(view_incoming_key: SecretScalar) -> Self {
        Self { view_incoming_key }
    }
}

impl ViewIncomingKeyDevice for CarrotViewIncomingKey {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret> {
        check_derive_type("view_key_scalar_mult_x25519", DERIVE_TYPE, derive_type)?;
        Ok(x25519(self.view_incoming_key.expose(), ephemeral_pubkey))
    }

    fn view_key_scalar_mult_ed25519(
        &self,
        derive_type: DeriveType,
        point: &EdwardsPoint,
    ) -> Result<EdwardsPoint> {
        check_derive_type("view_key_scalar_mult_ed25519", DERIVE_TYPE, derive_type)?;
        Ok(self.view_incoming_key.expose() * point)
    }

    fn make_janus_anchor_special(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
        input_context: &InputContext,
        onetime_address: &OnetimeAddress,
        account_spend_pubkey: &AddressSpendPubkey,
    ) -> Result<JanusAnchor> {
        check_derive_type("make_janus_anchor_special", DERIVE_TYPE, derive_type)?;
        Ok(janus_anchor_special(
            self.view_incoming_key.expose(),
            ephemeral_pubkey,
            input_context,
            onetime_address,
            account_spend_pubkey,
        ))
    }

    fn legacy_subaddress_extension(
        &self,
        derive_type: DeriveType,
        _index: &AddressIndex,
    ) -> Result<Scalar> {
        Err(CarrotError::unsupported("legacy_subaddress_extension", derive_type))
    }
}

/// In-memory generate-address device holding `s_ga`.
#[derive(Debug)]
pub struct CarrotGenerateAddressSecret {
    generate_address_secret: GenerateAddressSecret,
}

impl CarrotGenerateAddressSecret {
    /// Wraps `s_ga`.
    pub fn new(generate_address_secret: GenerateAddressSecret) -> Self {
        Self {
            generate_address_secret,
        }
    }
}

impl GenerateAddressSecretDevice for CarrotGenerateAddressSecret {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn make_index_extension_generator(
        &self,
        derive_type: DeriveType,
        index: &AddressIndex,
    ) -> Result<AddressIndexGenerator> {
        check_derive_type("make_index_extension_generator", DERIVE_TYPE, derive_type)?;
        Ok(make_index_extension_generator(
            &self.generate_address_secret,
            index,
        ))
    }
}

/// In-memory view-balance device holding `s_vb`.
#[derive(Debug)]
pub struct CarrotViewBalanceSecret {
    view_balance_secret: ViewBalanceSecret,
}

impl CarrotViewBalanceSecret {
    /// Wraps `s_vb`.
    pub fn new(view_balance_secret: ViewBalanceSecret) -> Self {
        Self {
            view_balance_secret,
        }
    }
}

impl ViewBalanceSecretDevice for CarrotViewBalanceSecret {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn make_internal_sender_receiver_secret(
        &self,
        derive_type: DeriveType,
        self_send_type: SelfSendType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
        input_context: &InputContext,
    ) -> Result<SenderReceiverSecret> {
        check_derive_type("make_internal_sender_receiver_secret", DERIVE_TYPE, derive_type)?;
        let domain = match self_send_type {
            SelfSendType::Change => DOMAIN_INTERNAL_SECRET_CHANGE,
            SelfSendType::SelfSpend => DOMAIN_INTERNAL_SECRET_SELF_SPEND,
        };
        let transcript = Transcript::new(domain)
            .append(ephemeral_pubkey)
            .append(input_context);
        Ok(SenderReceiverSecret::from_array(derive_bytes(
            &transcript,
            self.view_balance_secret.as_bytes(),
        )))
    }

    fn make_internal_view_tag(
        &self,
        derive_type: DeriveType,
        input_context: &InputContext,
        onetime_address: &OnetimeAddress,
    ) -> Result<ViewTag> {
        check_derive_type("make_internal_view_tag", DERIVE_TYPE, derive_type)?;
        Ok(compute_internal_view_tag(
            &self.view_balance_secret,
            input_context,
            onetime_address,
        ))
    }
}

/// In-memory generate-image device holding `k_gi`.
#[derive(Debug)]
pub struct CarrotGenerateImageKey {
    generate_image_key: SecretScalar,
}

impl CarrotGenerateImageKey {
    /// Wraps `k_gi`.
    pub fn new(generate_image_key: SecretScalar) -> Self {
        Self { generate_image_key }
    }
}

impl GenerateImageKeyDevice for CarrotGenerateImageKey {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn generate_image_key_mult(
        &self,
        derive_type: DeriveType,
        onetime_address: &OnetimeAddress,
    ) -> Result<EdwardsPoint> {
        check_derive_type("generate_image_key_mult", DERIVE_TYPE, derive_type)?;
        Ok(self.generate_image_key.expose() * hash_to_point(onetime_address.as_bytes()))
    }
}

/// In-memory spend device holding `k_gi` and `k_ps`.
#[derive(Debug)]
pub struct CarrotSpendKey {
    generate_image: CarrotGenerateImageKey,
    prove_spend_key: SecretScalar,
}

impl CarrotSpendKey {
    /// Wraps `k_gi` and `k_ps`.
    pub fn new(generate_image_key: SecretScalar, prove_spend_key: SecretScalar) -> Self {
        Self {
            generate_image: CarrotGenerateImageKey::new(generate_image_key),
            prove_spend_key,
        }
    }
}

impl GenerateImageKeyDevice for CarrotSpendKey {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn generate_image_key_mult(
        &self,
        derive_type: DeriveType,
        onetime_address: &OnetimeAddress,
    ) -> Result<EdwardsPoint> {
        self.generate_image
            .generate_image_key_mult(derive_type, onetime_address)
    }
}

impl SpendKeyDevice for CarrotSpendKey {
    fn onetime_address_opening(
        &self,
        derive_type: DeriveType,
        opening: &SubaddressOpening,
        sender_extension_g: &Scalar,
        sender_extension_t: &Scalar,
    ) -> Result<(SecretScalar, SecretScalar)> {
        check_derive_type("onetime_address_opening", DERIVE_TYPE, derive_type)?;
        let k_gi = self.generate_image.generate_image_key.expose();
        let x = opening.scalar * (k_gi + opening.extension) + sender_extension_g;
        let y = opening.scalar * self.prove_spend_key.expose() + sender_extension_t;
        Ok((SecretScalar::new(x), SecretScalar::new(y)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS DEVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Address device for the Carrot hierarchy.
pub struct CarrotAddressDevice {
    generate_address: Arc<dyn GenerateAddressSecretDevice>,
    view_incoming: Option<Arc<dyn ViewIncomingKeyDevice>>,
    spend_pubkey: AddressSpendPubkey,
    spend_point: EdwardsPoint,
    view_point: EdwardsPoint,
    main_view_pubkey: AddressViewPubkey,
    cipher: AddressTagCipher,
}

impl CarrotAddressDevice {
    /// Composes an address device. The view-incoming device is optional;
    /// without it the device issues addresses but cannot do key exchange.
    pub fn new(
        generate_address: Arc<dyn GenerateAddressSecretDevice>,
        view_incoming: Option<Arc<dyn ViewIncomingKeyDevice>>,
        spend_pubkey: AddressSpendPubkey,
        view_pubkey: AddressViewPubkey,
        main_view_pubkey: AddressViewPubkey,
        cipher_tag_secret: &CipherTagSecret,
    ) -> Result<Self> {
        check_derive_type(
            "CarrotAddressDevice::new",
            DERIVE_TYPE,
            generate_address.derive_type(),
        )?;
        if let Some(view) = &view_incoming {
            check_derive_type("CarrotAddressDevice::new", DERIVE_TYPE, view.derive_type())?;
        }
        Ok(Self {
            spend_point: spend_pubkey.decompress_torsion_free()?,
            view_point: view_pubkey.decompress_torsion_free()?,
            generate_address,
            view_incoming,
            spend_pubkey,
            main_view_pubkey,
            cipher: AddressTagCipher::new(cipher_tag_secret),
        })
    }
}

impl std::fmt::Debug for CarrotAddressDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrotAddressDevice")
            .field("spend_pubkey", &self.spend_pubkey)
            .field("main_view_pubkey", &self.main_view_pubkey)
            .field("can_scan", &self.view_incoming.is_some())
            .finish()
    }
}

impl AddressDevice for CarrotAddressDevice {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn resolve_derive_type(&self, derive_type: DeriveType) -> Result<DeriveType> {
        match derive_type {
            DeriveType::Auto | DeriveType::Carrot => Ok(DERIVE_TYPE),
            other => Err(CarrotError::unsupported("resolve_derive_type", other)),
        }
    }

    fn account_spend_pubkey(&self, derive_type: DeriveType) -> Result<AddressSpendPubkey> {
        self.resolve_derive_type(derive_type)?;
        Ok(self.spend_pubkey)
    }

    fn main_view_pubkey(&self, derive_type: DeriveType) -> Result<AddressViewPubkey> {
        self.resolve_derive_type(derive_type)?;
        Ok(self.main_view_pubkey)
    }

    fn resolve(&self, index: &AddressIndexExtended) -> Result<ResolvedAddress> {
        let derive_type = self.resolve_derive_type(index.derive_type)?;
        let extended = AddressIndexExtended::new(index.index, derive_type);

        if index.index.is_main() {
            return Ok(ResolvedAddress {
                index: extended,
                spend_pubkey: self.spend_pubkey,
                view_pubkey: self.main_view_pubkey,
                opening: SubaddressOpening::identity(),
            });
        }

        let generator = self
            .generate_address
            .make_index_extension_generator(derive_type, &index.index)?;
        let scalar = make_subaddress_scalar(&generator, &self.spend_pubkey, &index.index)?;

        Ok(ResolvedAddress {
            index: extended,
            spend_pubkey: AddressSpendPubkey::from_point(&(scalar * self.spend_point)),
            view_pubkey: AddressViewPubkey::from_point(&(scalar * self.view_point)),
            opening: SubaddressOpening::multiplicative(scalar),
        })
    }

    fn encrypt_address_index(&self, index: &AddressIndexExtended) -> Result<AddressTag> {
        self.resolve_derive_type(index.derive_type)?;
        Ok(self.cipher.encrypt(&index.index))
    }

    fn decrypt_address_tag(
        &self,
        derive_type: DeriveType,
        tag: &AddressTag,
    ) -> Result<Option<AddressIndex>> {
        self.resolve_derive_type(derive_type)?;
        Ok(self.cipher.decrypt(tag))
    }

    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret> {
        let derive_type = self.resolve_derive_type(derive_type)?;
        self.view_incoming
            .as_ref()
            .ok_or(CarrotError::CapabilityMissing("view-incoming key"))?
            .view_key_scalar_mult_x25519(derive_type, ephemeral_pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn master() -> MasterSecret {
        MasterSecret::from_hex("6e02e67b303dc713276bb1a4d70b0083b78e4f50e34e209da9f0377cdc3d376e")
            .unwrap()
    }

    #[test]
    fn test_prove_spend_key_is_keyed_by_master() {
        let transcript = Transcript::new(DOMAIN_PROVE_SPEND_KEY);
        assert_eq!(transcript.as_bytes(), b"\x16Carrot prove-spend key");

        let k_ps = make_prove_spend_key(&master()).unwrap();
        assert_eq!(
            *k_ps.expose(),
            carrot_crypto::derive_scalar(&transcript, master().as_bytes())
        );
        assert_ne!(
            *k_ps.expose(),
            carrot_crypto::derive_scalar(&transcript, &[0u8; 32])
        );
    }

    #[test]
    fn test_spend_pubkey_uses_fcmp_t() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let s_vb = make_view_balance_secret(&master());
        let k_gi = make_generate_image_key(&s_vb).unwrap();
        let k_ps = make_prove_spend_key(&master()).unwrap();
        assert_eq!(
            hex::encode(generator_t().compress().to_bytes()),
            "61b736ce93b62a3d3778ab204da85d3b4cdc07250f5da7e3df2629928134d526"
        );
        assert_eq!(
            keys.spend_pubkey(),
            AddressSpendPubkey::from_point(&make_spend_pubkey(k_gi.expose(), k_ps.expose()))
        );
    }

    #[test]
    fn test_hierarchy_levels_are_distinct() {
        let s_vb = make_view_balance_secret(&master());
        let k_gi = make_generate_image_key(&s_vb).unwrap();
        let k_vi = make_view_incoming_key(&s_vb).unwrap();
        let s_ga = make_generate_address_secret(&s_vb);
        assert_ne!(k_gi.expose(), k_vi.expose());
        assert_ne!(s_ga.as_bytes(), s_vb.as_bytes());
        assert_ne!(make_cipher_tag_secret(&s_ga).as_bytes(), s_ga.as_bytes());
    }

    #[test]
    fn test_public_keys() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let s_vb = make_view_balance_secret(&master());
        let k_gi = make_generate_image_key(&s_vb).unwrap();
        let k_vi = make_view_incoming_key(&s_vb).unwrap();
        let k_ps = make_prove_spend_key(&master()).unwrap();

        let spend = make_spend_pubkey(k_gi.expose(), k_ps.expose());
        assert_eq!(keys.spend_pubkey().decompress().unwrap(), spend);
        assert_eq!(keys.view_pubkey().decompress().unwrap(), k_vi.expose() * spend);
        assert_eq!(
            keys.main_view_pubkey().decompress().unwrap(),
            EdwardsPoint::mul_base(k_vi.expose())
        );
        assert!(keys.can_spend());
    }

    #[test]
    fn test_view_balance_unlock_matches_full() {
        let full = CarrotKeys::from_master(&master()).unwrap();
        let view = CarrotKeys::from_view_balance(
            full.view_balance_secret().unwrap().clone(),
            full.spend_pubkey(),
        )
        .unwrap();
        assert!(!view.can_spend());
        assert!(view.spend_device().is_none());
        assert!(view.generate_image_device().is_some());
        assert_eq!(view.view_pubkey(), full.view_pubkey());
        assert_eq!(view.main_view_pubkey(), full.main_view_pubkey());

        let index = AddressIndexExtended::new(AddressIndex::new(5, 16), DeriveType::Carrot);
        let a = full.address_device().unwrap().make_destination(&index).unwrap();
        let b = view.address_device().unwrap().make_destination(&index).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_subaddress_structure() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let device = keys.address_device().unwrap();
        let index = AddressIndex::new(5, 16);
        let resolved = device
            .resolve(&AddressIndexExtended::new(index, DeriveType::Auto))
            .unwrap();
        assert_eq!(resolved.index.derive_type, DeriveType::Carrot);

        let generator = make_index_extension_generator(
            &make_generate_address_secret(&make_view_balance_secret(&master())),
            &index,
        );
        let scalar = make_subaddress_scalar(&generator, &keys.spend_pubkey(), &index).unwrap();
        assert_eq!(resolved.opening.scalar, scalar);
        assert_eq!(resolved.opening.extension, Scalar::ZERO);
        assert_eq!(
            resolved.spend_pubkey.decompress().unwrap(),
            scalar * keys.spend_pubkey().decompress().unwrap()
        );
        assert_eq!(
            resolved.view_pubkey.decompress().unwrap(),
            scalar * keys.view_pubkey().decompress().unwrap()
        );
    }

    #[test]
    fn test_distinct_subaddresses() {
        let device = CarrotKeys::from_master(&master()).unwrap().address_device().unwrap();
        let a = device
            .resolve(&AddressIndexExtended::new(AddressIndex::new(0, 1), DeriveType::Carrot))
            .unwrap();
        let b = device
            .resolve(&AddressIndexExtended::new(AddressIndex::new(1, 0), DeriveType::Carrot))
            .unwrap();
        assert_ne!(a.spend_pubkey, b.spend_pubkey);
    }

    #[test]
    fn test_main_destination() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let destination = keys
            .address_device()
            .unwrap()
            .make_destination(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::Carrot))
            .unwrap();
        assert!(!destination.is_subaddress);
        assert_eq!(destination.spend_pubkey, keys.spend_pubkey());
        assert_eq!(destination.view_pubkey, keys.main_view_pubkey());
        assert!(destination.address_tag.is_none());
    }

    #[test]
    fn test_devices_reject_other_derive_types() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let view = keys.view_incoming_device().unwrap();
        let err = view
            .view_key_scalar_mult_x25519(DeriveType::PreCarrot, &EnoteEphemeralPubkey::default())
            .unwrap_err();
        assert!(matches!(err, CarrotError::UnsupportedDeriveType { .. }));
        assert!(view
            .legacy_subaddress_extension(DeriveType::Carrot, &AddressIndex::new(0, 1))
            .is_err());

        let generate = keys.generate_address_device();
        assert!(generate
            .make_index_extension_generator(DeriveType::Auto, &AddressIndex::MAIN)
            .is_err());

        let balance = keys.view_balance_device().unwrap();
        assert!(balance
            .make_internal_view_tag(
                DeriveType::PreCarrot,
                &InputContext::coinbase(0),
                &OnetimeAddress::default()
            )
            .is_err());

        let address = keys.address_device().unwrap();
        assert!(address
            .resolve(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::PreCarrot))
            .is_err());
    }

    #[test]
    fn test_internal_secrets_depend_on_type() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let balance = keys.view_balance_device().unwrap();
        let d_e = EnoteEphemeralPubkey::from_array([9; 32]);
        let ctx = InputContext::coinbase(3);
        let change = balance
            .make_internal_sender_receiver_secret(DeriveType::Carrot, SelfSendType::Change, &d_e, &ctx)
            .unwrap();
        let spend = balance
            .make_internal_sender_receiver_secret(
                DeriveType::Carrot,
                SelfSendType::SelfSpend,
                &d_e,
                &ctx,
            )
            .unwrap();
        assert_ne!(change, spend);
    }

    #[test]
    fn test_address_only_cannot_exchange() {
        let full = CarrotKeys::from_master(&master()).unwrap();
        let address_only = CarrotKeys::address_only(
            make_generate_address_secret(full.view_balance_secret().unwrap()),
            full.spend_pubkey(),
            full.view_pubkey(),
            full.main_view_pubkey(),
        )
        .unwrap();
        let device = address_only.address_device().unwrap();
        let err = device
            .view_key_scalar_mult_x25519(DeriveType::Carrot, &EnoteEphemeralPubkey::default())
            .unwrap_err();
        assert!(matches!(err, CarrotError::CapabilityMissing(_)));

        let index = AddressIndexExtended::new(AddressIndex::new(2, 2), DeriveType::Carrot);
        assert_eq!(
            device.make_destination(&index).unwrap(),
            full.address_device().unwrap().make_destination(&index).unwrap()
        );
    }

    #[test]
    fn test_spend_opening_matches_subaddress() {
        let keys = CarrotKeys::from_master(&master()).unwrap();
        let spend = keys.spend_device().unwrap();
        let resolved = keys
            .address_device()
            .unwrap()
            .resolve(&AddressIndexExtended::new(AddressIndex::new(1, 1), DeriveType::Carrot))
            .unwrap();
        let (x, y) = spend
            .onetime_address_opening(
                DeriveType::Carrot,
                &resolved.opening,
                &Scalar::ZERO,
                &Scalar::ZERO,
            )
            .unwrap();
        let opened = EdwardsPoint::mul_base(x.expose()) + y.expose() * generator_t();
        assert_eq!(opened, resolved.spend_pubkey.decompress().unwrap());
    }

    #[test]
    fn test_seeded_accounts_do_not_collide() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut spend_keys = std::collections::HashSet::new();
        for _ in 0..4 {
            let mut secret = [0u8; 32];
            rng.fill_bytes(&mut secret);
            let keys = CarrotKeys::from_master(&MasterSecret::from_array(secret)).unwrap();
            assert!(spend_keys.insert(keys.spend_pubkey()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_spend_opening_matches_any_subaddress(major in any::<u32>(), minor in any::<u32>()) {
            let keys = CarrotKeys::from_master(&master()).unwrap();
            let index = AddressIndex::new(major, minor);
            let resolved = keys
                .address_device()
                .unwrap()
                .resolve(&AddressIndexExtended::new(index, DeriveType::Carrot))
                .unwrap();
            let (x, y) = keys
                .spend_device()
                .unwrap()
                .onetime_address_opening(
                    DeriveType::Carrot,
                    &resolved.opening,
                    &Scalar::ZERO,
                    &Scalar::ZERO,
                )
                .unwrap();
            let opened = EdwardsPoint::mul_base(x.expose()) + y.expose() * generator_t();
            prop_assert_eq!(opened, resolved.spend_pubkey.decompress().unwrap());
            prop_assert_eq!(resolved.index.index, index);
        }
    }
}
