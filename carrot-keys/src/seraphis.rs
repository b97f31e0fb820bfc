//! Seraphis key hierarchy.
//!
//! Seraphis shares the Carrot secret tree down to `s_ga` and adds two
//! scalars on the three-generator basis `(G, X, U)`:
//!
//! ```text
//! k_vb = H_n[s_vb]()          view-balance key
//! k_m  = H_n[s_m]()           master spend key
//! K_s  = k_vb X + k_m U
//!
//! k^j_{g,x,u} = H_n[s^j_gen](K_s)     zero for the main address
//! K^j_s = K_s + k^j_g G + k^j_x X + k^j_u U
//! K^j_v = k_vi K^j_s                  (K^0_v = k_vi G)
//! ```
//!
//! A key image is `KI = (z / y) U` for `Ko = x G + y X + z U`. Because
//! `k_m U = K_s - k_vb X`, the view-balance holder can compute key images
//! without the master key.

use std::sync::Arc;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::constants::{
    DOMAIN_SERAPHIS_ADDRESS_EXTENSION_G, DOMAIN_SERAPHIS_ADDRESS_EXTENSION_U,
    DOMAIN_SERAPHIS_ADDRESS_EXTENSION_X, DOMAIN_SERAPHIS_MASTER_KEY,
    DOMAIN_SERAPHIS_VIEW_BALANCE_KEY,
};
use carrot_core::{
    AddressIndex, AddressIndexGenerator, AddressSpendPubkey, AddressTag, AddressViewPubkey,
    CarrotError, CipherTagSecret, DeriveType, Destination, KeyImage, MasterSecret, Result,
    ViewBalanceSecret,
};
use carrot_crypto::{
    derive_nonzero_scalar, derive_scalar, generator_g, generator_u, generator_x, AddressTagCipher,
    EdwardsBytes, SecretScalar, Transcript,
};

use crate::device::{GenerateAddressSecretDevice, SeraphisKeyImageDevice, ViewIncomingKeyDevice};

/// Seraphis reuses the Carrot `s_ga` and `k_vi` devices.
const DEVICE_DERIVE_TYPE: DeriveType = DeriveType::Carrot;

// ═══════════════════════════════════════════════════════════════════════════════
// DERIVATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_vb = H_n[s_vb]()`
pub fn make_seraphis_view_balance_key(view_balance: &ViewBalanceSecret) -> Result<SecretScalar> {
    derive_nonzero_scalar(
        &Transcript::new(DOMAIN_SERAPHIS_VIEW_BALANCE_KEY),
        view_balance.as_bytes(),
        "seraphis view-balance key",
    )
    .map(SecretScalar::new)
}

/// `k_m = H_n[s_m]()`
pub fn make_seraphis_master_key(master: &MasterSecret) -> Result<SecretScalar> {
    derive_nonzero_scalar(
        &Transcript::new(DOMAIN_SERAPHIS_MASTER_KEY),
        master.as_bytes(),
        "seraphis master key",
    )
    .map(SecretScalar::new)
}

/// `K_s = k_vb X + k_m U`
pub fn make_seraphis_spend_pubkey(view_balance_key: &Scalar, master_key: &Scalar) -> EdwardsPoint {
    view_balance_key * generator_x() + master_key * generator_u()
}

/// Address extensions `(k^j_g, k^j_x, k^j_u)` on `(G, X, U)`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SeraphisExtensions {
    /// `G` component
    pub g: Scalar,
    /// `X` component
    pub x: Scalar,
    /// `U` component
    pub u: Scalar,
}

impl SeraphisExtensions {
    /// All-zero extensions.
    pub fn zero() -> Self {
        Self {
            g: Scalar::ZERO,
            x: Scalar::ZERO,
            u: Scalar::ZERO,
        }
    }

    /// `k_g G + k_x X + k_u U`
    pub fn to_point(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.g) + self.x * generator_x() + self.u * generator_u()
    }

    /// Componentwise sum.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            g: self.g + other.g,
            x: self.x + other.x,
            u: self.u + other.u,
        }
    }
}

impl std::fmt::Debug for SeraphisExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SeraphisExtensions([REDACTED])")
    }
}

/// `k^j_{g,x,u} = H_n[s^j_gen](K_s)`
pub fn make_seraphis_address_extensions(
    generator: &AddressIndexGenerator,
    spend_pubkey: &AddressSpendPubkey,
) -> SeraphisExtensions {
    let derive = |domain: &[u8]| {
        derive_scalar(
            &Transcript::new(domain).append(spend_pubkey),
            generator.as_bytes(),
        )
    };
    SeraphisExtensions {
        g: derive(DOMAIN_SERAPHIS_ADDRESS_EXTENSION_G),
        x: derive(DOMAIN_SERAPHIS_ADDRESS_EXTENSION_X),
        u: derive(DOMAIN_SERAPHIS_ADDRESS_EXTENSION_U),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY IMAGE DEVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory Seraphis key image device holding `k_vb`.
pub struct SeraphisKeyImageKey {
    view_balance_key: SecretScalar,
    master_key_image_base: EdwardsPoint,
    spend_pubkey: AddressSpendPubkey,
}

impl SeraphisKeyImageKey {
    /// Builds the device from `k_vb` and `K_s`.
    ///
    /// # Errors
    /// `InvalidPoint` if `K_s` is unusable.
    pub fn new(view_balance_key: SecretScalar, spend_pubkey: AddressSpendPubkey) -> Result<Self> {
        let spend_point = spend_pubkey.decompress_torsion_free()?;
        Ok(Self {
            master_key_image_base: spend_point - view_balance_key.expose() * generator_x(),
            view_balance_key,
            spend_pubkey,
        })
    }
}

impl std::fmt::Debug for SeraphisKeyImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeraphisKeyImageKey")
            .field("spend_pubkey", &self.spend_pubkey)
            .finish()
    }
}

impl SeraphisKeyImageDevice for SeraphisKeyImageKey {
    fn spend_pubkey(&self) -> AddressSpendPubkey {
        self.spend_pubkey
    }

    fn make_key_image(&self, extension_x: &Scalar, extension_u: &Scalar) -> Result<KeyImage> {
        let y = self.view_balance_key.expose() + extension_x;
        if y == Scalar::ZERO {
            return Err(CarrotError::DerivationDegenerate("seraphis key image denominator"));
        }
        let numerator = self.master_key_image_base + extension_u * generator_u();
        let key_image = y.invert() * numerator;
        if key_image.is_identity() {
            return Err(CarrotError::DerivationDegenerate("seraphis key image"));
        }
        Ok(KeyImage::from_point(&key_image))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS DEVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// A Seraphis subaddress resolved to its keys.
#[derive(Clone, Debug)]
pub struct SeraphisResolvedAddress {
    /// Subaddress index.
    pub index: AddressIndex,
    /// `K^j_s`
    pub spend_pubkey: AddressSpendPubkey,
    /// `K^j_v`
    pub view_pubkey: AddressViewPubkey,
    /// Address extensions, zero for the main address.
    pub extensions: SeraphisExtensions,
}

/// Address device for Seraphis, composed over the Carrot `s_ga` and `k_vi`
/// devices.
pub struct SeraphisAddressDevice {
    generate_address: Arc<dyn GenerateAddressSecretDevice>,
    view_incoming: Arc<dyn ViewIncomingKeyDevice>,
    spend_pubkey: AddressSpendPubkey,
    spend_point: EdwardsPoint,
    main_view_pubkey: AddressViewPubkey,
    cipher: AddressTagCipher,
}

impl SeraphisAddressDevice {
    /// Composes the device.
    pub fn new(
        generate_address: Arc<dyn GenerateAddressSecretDevice>,
        view_incoming: Arc<dyn ViewIncomingKeyDevice>,
        spend_pubkey: AddressSpendPubkey,
        cipher_tag_secret: &CipherTagSecret,
    ) -> Result<Self> {
        let spend_point = spend_pubkey.decompress_torsion_free()?;
        let main_view = view_incoming
            .view_key_scalar_mult_ed25519(DEVICE_DERIVE_TYPE, generator_g())?;
        Ok(Self {
            generate_address,
            view_incoming,
            spend_pubkey,
            spend_point,
            main_view_pubkey: AddressViewPubkey::from_point(&main_view),
            cipher: AddressTagCipher::new(cipher_tag_secret),
        })
    }

    /// Seraphis account spend pubkey.
    pub fn spend_pubkey(&self) -> AddressSpendPubkey {
        self.spend_pubkey
    }

    /// Resolves an index to its keys and extensions.
    pub fn resolve(&self, index: &AddressIndex) -> Result<SeraphisResolvedAddress> {
        if index.is_main() {
            return Ok(SeraphisResolvedAddress {
                index: *index,
                spend_pubkey: self.spend_pubkey,
                view_pubkey: self.main_view_pubkey,
                extensions: SeraphisExtensions::zero(),
            });
        }

        let generator = self
            .generate_address
            .make_index_extension_generator(DEVICE_DERIVE_TYPE, index)?;
        let extensions = make_seraphis_address_extensions(&generator, &self.spend_pubkey);
        let spend_point = self.spend_point + extensions.to_point();
        if spend_point.is_identity() {
            return Err(CarrotError::DerivationDegenerate("seraphis subaddress"));
        }
        let view_point = self
            .view_incoming
            .view_key_scalar_mult_ed25519(DEVICE_DERIVE_TYPE, &spend_point)?;

        Ok(SeraphisResolvedAddress {
            index: *index,
            spend_pubkey: AddressSpendPubkey::from_point(&spend_point),
            view_pubkey: AddressViewPubkey::from_point(&view_point),
            extensions,
        })
    }

    /// Issues the destination for an index.
    pub fn make_destination(&self, index: &AddressIndex) -> Result<Destination> {
        let resolved = self.resolve(index)?;
        if index.is_main() {
            return Ok(Destination::main(resolved.spend_pubkey, resolved.view_pubkey));
        }
        Ok(Destination::subaddress(
            resolved.spend_pubkey,
            resolved.view_pubkey,
            self.cipher.encrypt(index),
        ))
    }

    /// Decrypts an address tag.
    pub fn decrypt_address_tag(&self, tag: &AddressTag) -> Option<AddressIndex> {
        self.cipher.decrypt(tag)
    }

    /// The `k_vi` device used for key exchange.
    pub fn view_incoming(&self) -> &dyn ViewIncomingKeyDevice {
        self.view_incoming.as_ref()
    }
}

impl std::fmt::Debug for SeraphisAddressDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeraphisAddressDevice")
            .field("spend_pubkey", &self.spend_pubkey)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrot::{
        make_cipher_tag_secret, make_generate_address_secret, make_view_balance_secret,
        make_view_incoming_key, CarrotGenerateAddressSecret, CarrotViewIncomingKey,
    };

    fn master() -> MasterSecret {
        MasterSecret::from_array([0x42; 32])
    }

    struct Fixture {
        k_vb: SecretScalar,
        k_m: SecretScalar,
        device: SeraphisAddressDevice,
        key_images: SeraphisKeyImageKey,
    }

    fn fixture() -> Fixture {
        let s_vb = make_view_balance_secret(&master());
        let k_vb = make_seraphis_view_balance_key(&s_vb).unwrap();
        let k_m = make_seraphis_master_key(&master()).unwrap();
        let spend = AddressSpendPubkey::from_point(&make_seraphis_spend_pubkey(
            k_vb.expose(),
            k_m.expose(),
        ));
        let s_ga = make_generate_address_secret(&s_vb);
        let device = SeraphisAddressDevice::new(
            Arc::new(CarrotGenerateAddressSecret::new(s_ga.clone())),
            Arc::new(CarrotViewIncomingKey::new(make_view_incoming_key(&s_vb).unwrap())),
            spend,
            &make_cipher_tag_secret(&s_ga),
        )
        .unwrap();
        let key_images = SeraphisKeyImageKey::new(k_vb.clone(), spend).unwrap();
        Fixture {
            k_vb,
            k_m,
            device,
            key_images,
        }
    }

    #[test]
    fn test_main_address_has_zero_extensions() {
        let f = fixture();
        let main = f.device.resolve(&AddressIndex::MAIN).unwrap();
        assert_eq!(main.extensions.g, Scalar::ZERO);
        assert_eq!(main.extensions.x, Scalar::ZERO);
        assert_eq!(main.extensions.u, Scalar::ZERO);
        assert_eq!(main.spend_pubkey, f.device.spend_pubkey());
    }

    #[test]
    fn test_subaddress_keys() {
        let f = fixture();
        let sub = f.device.resolve(&AddressIndex::new(2, 3)).unwrap();
        let expected = f.device.spend_pubkey().decompress().unwrap() + sub.extensions.to_point();
        assert_eq!(sub.spend_pubkey.decompress().unwrap(), expected);
        assert_ne!(sub.spend_pubkey, f.device.spend_pubkey());

        let destination = f.device.make_destination(&AddressIndex::new(2, 3)).unwrap();
        assert_eq!(
            f.device.decrypt_address_tag(&destination.address_tag.unwrap()),
            Some(AddressIndex::new(2, 3))
        );
    }

    #[test]
    fn test_key_image_matches_direct_formula() {
        let f = fixture();
        let ext_x = Scalar::from(11u64);
        let ext_u = Scalar::from(13u64);

        let via_device = f.key_images.make_key_image(&ext_x, &ext_u).unwrap();
        let z = f.k_m.expose() + ext_u;
        let y = f.k_vb.expose() + ext_x;
        let direct = (z * y.invert()) * generator_u();
        assert_eq!(via_device, KeyImage::from_point(&direct));
    }

    #[test]
    fn test_degenerate_key_image_rejected() {
        let f = fixture();
        let ext_x = -f.k_vb.expose();
        assert!(matches!(
            f.key_images.make_key_image(&ext_x, &Scalar::ZERO),
            Err(CarrotError::DerivationDegenerate(_))
        ));
    }
}
