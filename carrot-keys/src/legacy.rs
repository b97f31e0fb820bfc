//! Legacy CryptoNote key hierarchy.
//!
//! ```text
//! k_s                         spend key
//! k_v = H_s(k_s)              view key (unless supplied)
//! K_s = k_s G,  K_v = k_v G
//!
//! m_j   = H_s("SubAddr\0" || k_v || major || minor)
//! K^j_s = K_s + m_j G
//! K^j_v = k_v K^j_s
//! ```
//!
//! Legacy accounts can receive Carrot enotes; the account's derive type is
//! then `PreCarrot`. The cipher-tag secret is derived from `k_v`.

use std::sync::Arc;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use dashmap::DashMap;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::constants::{
    DOMAIN_JANUS_ANCHOR_SPECIAL, DOMAIN_LEGACY_CIPHER_TAG_SECRET, LEGACY_SUBADDRESS_PREFIX,
};
use carrot_core::{
    AddressIndex, AddressIndexExtended, AddressSpendPubkey, AddressTag, AddressViewPubkey,
    CarrotError, CipherTagSecret, DeriveType, EcdhSecret, EnoteEphemeralPubkey, InputContext,
    JanusAnchor, OnetimeAddress, Result,
};
use carrot_crypto::{
    derive_bytes, hash_to_point, hash_to_scalar, nonzero, x25519, AddressTagCipher, EdwardsBytes,
    SecretScalar, Transcript,
};

use crate::device::{
    check_derive_type, AddressDevice, GenerateImageKeyDevice, ResolvedAddress, SpendKeyDevice,
    SubaddressOpening, ViewIncomingKeyDevice,
};

const DERIVE_TYPE: DeriveType = DeriveType::PreCarrot;

// ═══════════════════════════════════════════════════════════════════════════════
// DERIVATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_v = H_s(k_s)`
pub fn make_legacy_view_key(spend_key: &SecretScalar) -> Result<SecretScalar> {
    let mut bytes = spend_key.expose().to_bytes();
    let view_key = hash_to_scalar(&[&bytes[..]]);
    bytes.zeroize();
    Ok(SecretScalar::new(nonzero(view_key, "legacy view key")?))
}

/// `m_j = H_s("SubAddr\0" || k_v || major || minor)`, zero for the main address.
pub fn make_legacy_subaddress_extension(view_key: &Scalar, index: &AddressIndex) -> Scalar {
    if index.is_main() {
        return Scalar::ZERO;
    }
    let mut k_v = view_key.to_bytes();
    let extension = hash_to_scalar(&[
        LEGACY_SUBADDRESS_PREFIX,
        &k_v[..],
        &index.major.to_le_bytes()[..],
        &index.minor.to_le_bytes()[..],
    ]);
    k_v.zeroize();
    extension
}

/// `s_ct = H_32[k_v]()`
pub fn make_legacy_cipher_tag_secret(view_key: &Scalar) -> CipherTagSecret {
    let mut k_v = view_key.to_bytes();
    let secret = derive_bytes(&Transcript::new(DOMAIN_LEGACY_CIPHER_TAG_SECRET), &k_v);
    k_v.zeroize();
    CipherTagSecret::from_array(secret)
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Unlocked legacy account secrets.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LegacyKeys {
    spend_key: Option<SecretScalar>,
    view_key: SecretScalar,
    #[zeroize(skip)]
    spend_pubkey: AddressSpendPubkey,
    #[zeroize(skip)]
    view_pubkey: AddressViewPubkey,
}

impl LegacyKeys {
    /// Full account from the spend key; the view key is `H_s(k_s)`.
    pub fn from_spend_key(spend_key: SecretScalar) -> Result<Self> {
        let view_key = make_legacy_view_key(&spend_key)?;
        Self::from_keys(spend_key, view_key)
    }

    /// Full account with an explicitly supplied view key.
    pub fn from_keys(spend_key: SecretScalar, view_key: SecretScalar) -> Result<Self> {
        let spend_pubkey = AddressSpendPubkey::from_point(&spend_key.public_key());
        Ok(Self {
            view_pubkey: AddressViewPubkey::from_point(&view_key.public_key()),
            spend_key: Some(spend_key),
            view_key,
            spend_pubkey,
        })
    }

    /// View-only account.
    ///
    /// # Errors
    /// `InvalidPoint` if `spend_pubkey` is not a prime-order point.
    pub fn view_only(view_key: SecretScalar, spend_pubkey: AddressSpendPubkey) -> Result<Self> {
        spend_pubkey.decompress_torsion_free()?;
        Ok(Self {
            spend_key: None,
            view_pubkey: AddressViewPubkey::from_point(&view_key.public_key()),
            view_key,
            spend_pubkey,
        })
    }

    /// `K_s`
    pub fn spend_pubkey(&self) -> AddressSpendPubkey {
        self.spend_pubkey
    }

    /// `K_v`
    pub fn view_pubkey(&self) -> AddressViewPubkey {
        self.view_pubkey
    }

    /// Whether the spend key is present.
    pub fn can_spend(&self) -> bool {
        self.spend_key.is_some()
    }

    /// Device holding `k_v`.
    pub fn view_incoming_device(&self) -> LegacyViewIncomingKey {
        LegacyViewIncomingKey::new(self.view_key.clone())
    }

    /// Device holding `k_s`, if unlocked.
    pub fn spend_device(&self) -> Option<LegacySpendKey> {
        self.spend_key.clone().map(LegacySpendKey::new)
    }

    /// Address device composed over a fresh view-incoming device.
    pub fn address_device(&self) -> Result<LegacyAddressDevice> {
        LegacyAddressDevice::new(
            Arc::new(self.view_incoming_device()),
            self.spend_pubkey,
            self.view_pubkey,
            &make_legacy_cipher_tag_secret(self.view_key.expose()),
        )
    }
}

impl std::fmt::Debug for LegacyKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyKeys")
            .field("spend_pubkey", &self.spend_pubkey)
            .field("view_pubkey", &self.view_pubkey)
            .field("can_spend", &self.can_spend())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICES
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory view-incoming device holding the legacy `k_v`.
#[derive(Debug)]
pub struct LegacyViewIncomingKey {
    view_key: SecretScalar,
}

impl LegacyViewIncomingKey {
    /// Wraps `k_v`.
    pub fn new(view_key: SecretScalar) -> Self {
        Self { view_key }
    }
}

impl ViewIncomingKeyDevice for LegacyViewIncomingKey {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret> {
        check_derive_type("view_key_scalar_mult_x25519", DERIVE_TYPE, derive_type)?;
        Ok(x25519(self.view_key.expose(), ephemeral_pubkey))
    }

    fn view_key_scalar_mult_ed25519(
        &self,
        derive_type: DeriveType,
        point: &EdwardsPoint,
    ) -> Result<EdwardsPoint> {
        check_derive_type("view_key_scalar_mult_ed25519", DERIVE_TYPE, derive_type)?;
        Ok(self.view_key.expose() * point)
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
            self.view_key.expose(),
            ephemeral_pubkey,
            input_context,
            onetime_address,
            account_spend_pubkey,
        ))
    }

    fn legacy_subaddress_extension(
        &self,
        derive_type: DeriveType,
        index: &AddressIndex,
    ) -> Result<Scalar> {
        check_derive_type("legacy_subaddress_extension", DERIVE_TYPE, derive_type)?;
        Ok(make_legacy_subaddress_extension(self.view_key.expose(), index))
    }
}

/// `anchor_sp = H_16[k_v](D_e, input_context, Ko, K_s)`, shared by both hierarchies.
pub(crate) fn janus_anchor_special(
    view_key: &Scalar,
    ephemeral_pubkey: &EnoteEphemeralPubkey,
    input_context: &InputContext,
    onetime_address: &OnetimeAddress,
    account_spend_pubkey: &AddressSpendPubkey,
) -> JanusAnchor {
    let transcript = Transcript::new(DOMAIN_JANUS_ANCHOR_SPECIAL)
        .append(ephemeral_pubkey)
        .append(input_context)
        .append(onetime_address)
        .append(account_spend_pubkey);
    let mut key = view_key.to_bytes();
    let anchor = JanusAnchor::from_array(derive_bytes(&transcript, &key));
    key.zeroize();
    anchor
}

/// In-memory spend device holding the legacy `k_s`.
#[derive(Debug)]
pub struct LegacySpendKey {
    spend_key: SecretScalar,
}

impl LegacySpendKey {
    /// Wraps `k_s`.
    pub fn new(spend_key: SecretScalar) -> Self {
        Self { spend_key }
    }
}

impl GenerateImageKeyDevice for LegacySpendKey {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn generate_image_key_mult(
        &self,
        derive_type: DeriveType,
        onetime_address: &OnetimeAddress,
    ) -> Result<EdwardsPoint> {
        check_derive_type("generate_image_key_mult", DERIVE_TYPE, derive_type)?;
        Ok(self.spend_key.expose() * hash_to_point(onetime_address.as_bytes()))
    }
}

impl SpendKeyDevice for LegacySpendKey {
    fn onetime_address_opening(
        &self,
        derive_type: DeriveType,
        opening: &SubaddressOpening,
        sender_extension_g: &Scalar,
        sender_extension_t: &Scalar,
    ) -> Result<(SecretScalar, SecretScalar)> {
        check_derive_type("onetime_address_opening", DERIVE_TYPE, derive_type)?;
        let x = opening.scalar * (self.spend_key.expose() + opening.extension) + sender_extension_g;
        Ok((SecretScalar::new(x), SecretScalar::new(*sender_extension_t)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS DEVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Address device for the CryptoNote hierarchy.
///
/// Subaddress derivation needs `k_v`, so this device is composed over a
/// view-incoming device rather than holding the view key itself.
pub struct LegacyAddressDevice {
    view_incoming: Arc<dyn ViewIncomingKeyDevice>,
    spend_pubkey: AddressSpendPubkey,
    spend_point: EdwardsPoint,
    view_pubkey: AddressViewPubkey,
    cipher: AddressTagCipher,
}

impl LegacyAddressDevice {
    /// Composes an address device.
    ///
    /// # Errors
    /// `UnsupportedDeriveType` if the view device is not a legacy device,
    /// `InvalidPoint` if `spend_pubkey` is unusable.
    pub fn new(
        view_incoming: Arc<dyn ViewIncomingKeyDevice>,
        spend_pubkey: AddressSpendPubkey,
        view_pubkey: AddressViewPubkey,
        cipher_tag_secret: &CipherTagSecret,
    ) -> Result<Self> {
        check_derive_type("LegacyAddressDevice::new", DERIVE_TYPE, view_incoming.derive_type())?;
        Ok(Self {
            spend_point: spend_pubkey.decompress_torsion_free()?,
            view_incoming,
            spend_pubkey,
            view_pubkey,
            cipher: AddressTagCipher::new(cipher_tag_secret),
        })
    }
}

impl std::fmt::Debug for LegacyAddressDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyAddressDevice")
            .field("spend_pubkey", &self.spend_pubkey)
            .field("view_pubkey", &self.view_pubkey)
            .finish()
    }
}

impl AddressDevice for LegacyAddressDevice {
    fn derive_type(&self) -> DeriveType {
        DERIVE_TYPE
    }

    fn resolve_derive_type(&self, derive_type: DeriveType) -> Result<DeriveType> {
        match derive_type {
            DeriveType::Auto | DeriveType::PreCarrot => Ok(DERIVE_TYPE),
            other => Err(CarrotError::unsupported("resolve_derive_type", other)),
        }
    }

    fn account_spend_pubkey(&self, derive_type: DeriveType) -> Result<AddressSpendPubkey> {
        self.resolve_derive_type(derive_type)?;
        Ok(self.spend_pubkey)
    }

    fn main_view_pubkey(&self, derive_type: DeriveType) -> Result<AddressViewPubkey> {
        self.resolve_derive_type(derive_type)?;
        Ok(self.view_pubkey)
    }

    fn resolve(&self, index: &AddressIndexExtended) -> Result<ResolvedAddress> {
        let derive_type = self.resolve_derive_type(index.derive_type)?;
        let extended = AddressIndexExtended::new(index.index, derive_type);

        if index.index.is_main() {
            return Ok(ResolvedAddress {
                index: extended,
                spend_pubkey: self.spend_pubkey,
                view_pubkey: self.view_pubkey,
                opening: SubaddressOpening::identity(),
            });
        }

        let extension = self
            .view_incoming
            .legacy_subaddress_extension(derive_type, &index.index)?;
        let spend_point = self.spend_point + EdwardsPoint::mul_base(&extension);
        let view_point = self
            .view_incoming
            .view_key_scalar_mult_ed25519(derive_type, &spend_point)?;

        Ok(ResolvedAddress {
            index: extended,
            spend_pubkey: AddressSpendPubkey::from_point(&spend_point),
            view_pubkey: AddressViewPubkey::from_point(&view_point),
            opening: SubaddressOpening::additive(extension),
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
            .view_key_scalar_mult_x25519(derive_type, ephemeral_pubkey)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBADDRESS TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lookup from legacy subaddress spend keys to their indices.
///
/// Legacy-format enotes carry no address tag, so the scanner recovers
/// `K^j_s = Ko - k^o G` and looks it up here.
#[derive(Debug, Default)]
pub struct LegacySubaddressTable {
    entries: DashMap<AddressSpendPubkey, AddressIndex>,
}

impl LegacySubaddressTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates all indices `(0..majors) x (0..minors)`.
    pub fn generate(device: &dyn AddressDevice, majors: u32, minors: u32) -> Result<Self> {
        let table = Self::new();
        table.extend(device, majors, minors)?;
        Ok(table)
    }

    /// Adds any missing indices in `(0..majors) x (0..minors)`.
    pub fn extend(&self, device: &dyn AddressDevice, majors: u32, minors: u32) -> Result<()> {
        let before = self.entries.len();
        for major in 0..majors {
            for minor in 0..minors {
                let index = AddressIndexExtended::new(
                    AddressIndex::new(major, minor),
                    DeriveType::PreCarrot,
                );
                let resolved = device.resolve(&index)?;
                self.entries.insert(resolved.spend_pubkey, index.index);
            }
        }
        debug!(
            added = self.entries.len() - before,
            total = self.entries.len(),
            "Extended legacy subaddress table"
        );
        Ok(())
    }

    /// Records a single entry.
    pub fn insert(&self, spend_pubkey: AddressSpendPubkey, index: AddressIndex) {
        self.entries.insert(spend_pubkey, index);
    }

    /// Looks up a spend key.
    pub fn lookup(&self, spend_pubkey: &AddressSpendPubkey) -> Option<AddressIndex> {
        self.entries.get(spend_pubkey).map(|entry| *entry.value())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
