//! Capability devices.
//!
//! Each trait exposes exactly one capability over secrets it never reveals.
//! A wallet is a composition of devices, and what it can do (scan, see
//! change, compute key images, sign) follows from which devices it holds.
//!
//! Every method takes the [`DeriveType`] the caller believes it is operating
//! under. A device rejects any derive type other than the one it was built
//! for with [`CarrotError::UnsupportedDeriveType`]; this catches wiring bugs
//! where a legacy key is used against a Carrot enote or the reverse.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::{
    AddressIndex, AddressIndexExtended, AddressIndexGenerator, AddressSpendPubkey, AddressTag,
    AddressViewPubkey, CarrotError, DeriveType, Destination, EcdhSecret, EnoteEphemeralPubkey,
    InputContext, JanusAnchor, KeyImage, OnetimeAddress, Result, SelfSendType,
    SenderReceiverSecret, ViewTag,
};
use carrot_crypto::SecretScalar;

/// Fails unless `actual` is the derive type the device was built for.
pub fn check_derive_type(
    operation: &'static str,
    expected: DeriveType,
    actual: DeriveType,
) -> Result<()> {
    if expected != actual {
        return Err(CarrotError::unsupported(operation, actual));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW-INCOMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds the incoming view key (`k_vi` for Carrot, `k_v` for legacy).
pub trait ViewIncomingKeyDevice: Send + Sync {
    /// Hierarchy this device belongs to.
    fn derive_type(&self) -> DeriveType;

    /// `s_sr' = k_v * D_e` on the Montgomery curve.
    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret>;

    /// `k_v * P` on edwards25519.
    fn view_key_scalar_mult_ed25519(
        &self,
        derive_type: DeriveType,
        point: &EdwardsPoint,
    ) -> Result<EdwardsPoint>;

    /// `anchor_sp = H_16[k_v](D_e, input_context, Ko, K_s)`
    fn make_janus_anchor_special(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
        input_context: &InputContext,
        onetime_address: &OnetimeAddress,
        account_spend_pubkey: &AddressSpendPubkey,
    ) -> Result<JanusAnchor>;

    /// Legacy subaddress extension `m_j`. Only legacy devices support it.
    fn legacy_subaddress_extension(
        &self,
        derive_type: DeriveType,
        index: &AddressIndex,
    ) -> Result<Scalar>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATE-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds `s_ga`, the secret all Carrot subaddresses are generated from.
pub trait GenerateAddressSecretDevice: Send + Sync {
    /// Hierarchy this device belongs to.
    fn derive_type(&self) -> DeriveType;

    /// `s^j_gen = H_32[s_ga](major, minor)`
    fn make_index_extension_generator(
        &self,
        derive_type: DeriveType,
        index: &AddressIndex,
    ) -> Result<AddressIndexGenerator>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW-BALANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds `s_vb`, which recognizes internal (self-addressed) enotes.
pub trait ViewBalanceSecretDevice: Send + Sync {
    /// Hierarchy this device belongs to.
    fn derive_type(&self) -> DeriveType;

    /// `s_sr = H_32[s_vb](D_e, input_context)` for an internal self-send.
    fn make_internal_sender_receiver_secret(
        &self,
        derive_type: DeriveType,
        self_send_type: SelfSendType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
        input_context: &InputContext,
    ) -> Result<SenderReceiverSecret>;

    /// `vt = H_3[s_vb](input_context, Ko)`
    fn make_internal_view_tag(
        &self,
        derive_type: DeriveType,
        input_context: &InputContext,
        onetime_address: &OnetimeAddress,
    ) -> Result<ViewTag>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATE-IMAGE / SPEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds the key-image base key (`k_gi` for Carrot, `k_s` for legacy).
pub trait GenerateImageKeyDevice: Send + Sync {
    /// Hierarchy this device belongs to.
    fn derive_type(&self) -> DeriveType;

    /// `key * Hp(Ko)`
    fn generate_image_key_mult(
        &self,
        derive_type: DeriveType,
        onetime_address: &OnetimeAddress,
    ) -> Result<EdwardsPoint>;
}

/// Full spend authority: opens a onetime address as `Ko = x G + y T`.
pub trait SpendKeyDevice: GenerateImageKeyDevice {
    /// Returns `(x, y)` for an enote received at the subaddress described by
    /// `opening`, given the sender's extensions.
    fn onetime_address_opening(
        &self,
        derive_type: DeriveType,
        opening: &SubaddressOpening,
        sender_extension_g: &Scalar,
        sender_extension_t: &Scalar,
    ) -> Result<(SecretScalar, SecretScalar)>;
}

/// Seraphis key images: `KI = (z / y) U` for `Ko = x G + y X + z U`.
pub trait SeraphisKeyImageDevice: Send + Sync {
    /// Seraphis account spend pubkey `K_s = k_vb X + k_m U`.
    fn spend_pubkey(&self) -> AddressSpendPubkey;

    /// Key image for an enote whose `X` and `U` extensions (address plus
    /// sender) sum to `extension_x` and `extension_u`.
    fn make_key_image(&self, extension_x: &Scalar, extension_u: &Scalar) -> Result<KeyImage>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESSES
// ═══════════════════════════════════════════════════════════════════════════════

/// How a subaddress spend key relates to the account spend key:
/// `K^j_s = k_scal * (K_s + k_ext G)`.
///
/// Legacy subaddresses use `k_scal = 1`, Carrot subaddresses use `k_ext = 0`,
/// and main addresses use the identity opening.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SubaddressOpening {
    /// Additive `G` extension.
    pub extension: Scalar,
    /// Multiplicative scalar.
    pub scalar: Scalar,
}

impl SubaddressOpening {
    /// `k_ext = 0, k_scal = 1`
    pub fn identity() -> Self {
        Self {
            extension: Scalar::ZERO,
            scalar: Scalar::ONE,
        }
    }

    /// Legacy subaddress `K_s + m_j G`.
    pub fn additive(extension: Scalar) -> Self {
        Self {
            extension,
            scalar: Scalar::ONE,
        }
    }

    /// Carrot subaddress `k^j_subscal K_s`.
    pub fn multiplicative(scalar: Scalar) -> Self {
        Self {
            extension: Scalar::ZERO,
            scalar,
        }
    }
}

impl std::fmt::Debug for SubaddressOpening {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubaddressOpening([REDACTED])")
    }
}

/// A subaddress index resolved to its keys.
#[derive(Clone, Debug)]
pub struct ResolvedAddress {
    /// Index with a concrete derive type.
    pub index: AddressIndexExtended,
    /// `K^j_s`
    pub spend_pubkey: AddressSpendPubkey,
    /// `K^j_v`
    pub view_pubkey: AddressViewPubkey,
    /// Relation of `K^j_s` to the account spend key.
    pub opening: SubaddressOpening,
}

impl ResolvedAddress {
    /// Whether this is the main address.
    pub fn is_main(&self) -> bool {
        self.index.index.is_main()
    }
}

/// Resolves address indices to keys and issues destinations.
pub trait AddressDevice: Send + Sync {
    /// Derive type this device answers for; `Auto` only for hybrids.
    fn derive_type(&self) -> DeriveType;

    /// Maps `Auto` to the concrete hierarchy this device would use.
    fn resolve_derive_type(&self, derive_type: DeriveType) -> Result<DeriveType>;

    /// Account spend pubkey `K_s` of the given hierarchy.
    fn account_spend_pubkey(&self, derive_type: DeriveType) -> Result<AddressSpendPubkey>;

    /// Main address view pubkey `K^0_v` of the given hierarchy.
    fn main_view_pubkey(&self, derive_type: DeriveType) -> Result<AddressViewPubkey>;

    /// Resolves `(index, derive_type)` to `(K^j_s, K^j_v, opening)`.
    fn resolve(&self, index: &AddressIndexExtended) -> Result<ResolvedAddress>;

    /// Encrypts an index under the hierarchy's cipher-tag secret.
    fn encrypt_address_index(&self, index: &AddressIndexExtended) -> Result<AddressTag>;

    /// Decrypts an address tag. `Ok(None)` means the tag is not ours.
    fn decrypt_address_tag(
        &self,
        derive_type: DeriveType,
        tag: &AddressTag,
    ) -> Result<Option<AddressIndex>>;

    /// `k_v * D_e` through the held view-incoming device.
    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret>;

    /// Issues the public destination for an index.
    fn make_destination(&self, index: &AddressIndexExtended) -> Result<Destination> {
        let resolved = self.resolve(index)?;
        if resolved.is_main() {
            return Ok(Destination::main(resolved.spend_pubkey, resolved.view_pubkey));
        }
        let tag = self.encrypt_address_index(&resolved.index)?;
        Ok(Destination::subaddress(
            resolved.spend_pubkey,
            resolved.view_pubkey,
            tag,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_derive_type() {
        assert!(check_derive_type("op", DeriveType::Carrot, DeriveType::Carrot).is_ok());
        let err = check_derive_type("op", DeriveType::Carrot, DeriveType::PreCarrot).unwrap_err();
        assert!(matches!(
            err,
            CarrotError::UnsupportedDeriveType { operation: "op", .. }
        ));
        assert!(check_derive_type("op", DeriveType::PreCarrot, DeriveType::Auto).is_err());
    }

    #[test]
    fn test_openings() {
        let id = SubaddressOpening::identity();
        assert_eq!(id.extension, Scalar::ZERO);
        assert_eq!(id.scalar, Scalar::ONE);

        let add = SubaddressOpening::additive(Scalar::from(5u64));
        assert_eq!(add.scalar, Scalar::ONE);

        let mul = SubaddressOpening::multiplicative(Scalar::from(5u64));
        assert_eq!(mul.extension, Scalar::ZERO);
        assert_eq!(format!("{:?}", mul), "SubaddressOpening([REDACTED])");
    }
}
