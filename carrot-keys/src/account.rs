//! Per-account device sets.
//!
//! [`AccountDevices`] is what a wallet holds while unlocked. It owns the
//! devices its unlock level allows and answers `CapabilityMissing` for the
//! rest. Dropping it locks the account: every secret inside is zeroized when
//! the last reference goes away.

use std::sync::Arc;

use tracing::info;

use carrot_core::{AddressSpendPubkey, CarrotError, DeriveType, MasterSecret, Result};
use carrot_crypto::EdwardsBytes;

use crate::carrot::CarrotKeys;
use crate::device::{
    AddressDevice, GenerateImageKeyDevice, SeraphisKeyImageDevice, SpendKeyDevice,
    ViewBalanceSecretDevice, ViewIncomingKeyDevice,
};
use crate::hybrid::HybridAddressDevice;
use crate::legacy::LegacyKeys;
use crate::seraphis::{
    make_seraphis_master_key, make_seraphis_spend_pubkey, make_seraphis_view_balance_key,
    SeraphisAddressDevice, SeraphisKeyImageKey,
};

/// One optional device per hierarchy.
struct PerHierarchy<T: ?Sized> {
    legacy: Option<Arc<T>>,
    carrot: Option<Arc<T>>,
}

impl<T: ?Sized> Default for PerHierarchy<T> {
    fn default() -> Self {
        Self {
            legacy: None,
            carrot: None,
        }
    }
}

impl<T: ?Sized> PerHierarchy<T> {
    fn get(&self, derive_type: DeriveType) -> Option<&T> {
        match derive_type {
            DeriveType::PreCarrot => self.legacy.as_deref(),
            DeriveType::Carrot => self.carrot.as_deref(),
            DeriveType::Auto => None,
        }
    }
}

/// The devices of one unlocked account.
pub struct AccountDevices {
    address: Arc<dyn AddressDevice>,
    view_incoming: PerHierarchy<dyn ViewIncomingKeyDevice>,
    generate_image: PerHierarchy<dyn GenerateImageKeyDevice>,
    spend: PerHierarchy<dyn SpendKeyDevice>,
    view_balance: Option<Arc<dyn ViewBalanceSecretDevice>>,
    seraphis_address: Option<Arc<SeraphisAddressDevice>>,
    seraphis_key_image: Option<Arc<dyn SeraphisKeyImageDevice>>,
}

impl AccountDevices {
    /// Unlocks a legacy account.
    pub fn from_legacy(keys: &LegacyKeys) -> Result<Self> {
        let mut devices = Self::bare(Arc::new(keys.address_device()?));
        devices.add_legacy(keys);
        info!(
            derive_type = %DeriveType::PreCarrot,
            spend = keys.can_spend(),
            "Unlocked legacy account"
        );
        Ok(devices)
    }

    /// Unlocks a Carrot account at whatever level `keys` was opened at.
    pub fn from_carrot(keys: &CarrotKeys) -> Result<Self> {
        let mut devices = Self::bare(Arc::new(keys.address_device()?));
        devices.add_carrot(keys);
        info!(
            derive_type = %DeriveType::Carrot,
            spend = keys.can_spend(),
            "Unlocked carrot account"
        );
        Ok(devices)
    }

    /// Unlocks a full Carrot account, with Seraphis key images.
    pub fn from_master(master: &MasterSecret) -> Result<Self> {
        let keys = CarrotKeys::from_master(master)?;
        let mut devices = Self::from_carrot(&keys)?;

        let view_balance = keys
            .view_balance_secret()
            .ok_or(CarrotError::CapabilityMissing("view-balance secret"))?;
        let k_vb = make_seraphis_view_balance_key(view_balance)?;
        let k_m = make_seraphis_master_key(master)?;
        let spend_pubkey = AddressSpendPubkey::from_point(
            &make_seraphis_spend_pubkey(k_vb.expose(), k_m.expose()),
        );
        devices.seraphis_key_image = Some(Arc::new(SeraphisKeyImageKey::new(k_vb, spend_pubkey)?));
        devices.seraphis_address = Some(Arc::new(SeraphisAddressDevice::new(
            Arc::new(keys.generate_address_device()),
            devices
                .view_incoming
                .carrot
                .clone()
                .ok_or(CarrotError::CapabilityMissing("view-incoming key"))?,
            spend_pubkey,
            &keys.cipher_tag_secret(),
        )?));
        Ok(devices)
    }

    /// Unlocks an account holding both hierarchies.
    pub fn hybrid(legacy: &LegacyKeys, carrot: &CarrotKeys) -> Result<Self> {
        let address = HybridAddressDevice::new(
            Some(Arc::new(legacy.address_device()?)),
            Some(Arc::new(carrot.address_device()?)),
        )?;
        let mut devices = Self::bare(Arc::new(address));
        devices.add_legacy(legacy);
        devices.add_carrot(carrot);
        info!(derive_type = %DeriveType::Auto, "Unlocked hybrid account");
        Ok(devices)
    }

    fn bare(address: Arc<dyn AddressDevice>) -> Self {
        Self {
            address,
            view_incoming: PerHierarchy::default(),
            generate_image: PerHierarchy::default(),
            spend: PerHierarchy::default(),
            view_balance: None,
            seraphis_address: None,
            seraphis_key_image: None,
        }
    }

    fn add_legacy(&mut self, keys: &LegacyKeys) {
        self.view_incoming.legacy = Some(Arc::new(keys.view_incoming_device()));
        if let Some(spend) = keys.spend_device() {
            let spend = Arc::new(spend);
            self.generate_image.legacy = Some(spend.clone());
            self.spend.legacy = Some(spend);
        }
    }

    fn add_carrot(&mut self, keys: &CarrotKeys) {
        if let Some(view) = keys.view_incoming_device() {
            self.view_incoming.carrot = Some(Arc::new(view));
        }
        if let Some(balance) = keys.view_balance_device() {
            self.view_balance = Some(Arc::new(balance));
        }
        if let Some(spend) = keys.spend_device() {
            let spend = Arc::new(spend);
            self.generate_image.carrot = Some(spend.clone());
            self.spend.carrot = Some(spend);
        } else if let Some(image) = keys.generate_image_device() {
            self.generate_image.carrot = Some(Arc::new(image));
        }
    }

    /// The account's address device.
    pub fn address(&self) -> &dyn AddressDevice {
        self.address.as_ref()
    }

    /// Maps `Auto` to the account's default hierarchy.
    pub fn resolve_derive_type(&self, derive_type: DeriveType) -> Result<DeriveType> {
        self.address.resolve_derive_type(derive_type)
    }

    /// View-incoming device for a hierarchy.
    pub fn view_incoming(&self, derive_type: DeriveType) -> Result<ViewIncomingHandle<'_>> {
        let derive_type = self.resolve_derive_type(derive_type)?;
        self.view_incoming
            .get(derive_type)
            .map(|device| ViewIncomingHandle {
                device,
                derive_type,
            })
            .ok_or(CarrotError::CapabilityMissing("view-incoming key"))
    }

    /// View-balance device.
    pub fn view_balance(&self) -> Result<&dyn ViewBalanceSecretDevice> {
        self.view_balance
            .as_deref()
            .ok_or(CarrotError::CapabilityMissing("view-balance secret"))
    }

    /// Generate-image device for a hierarchy.
    pub fn generate_image(&self, derive_type: DeriveType) -> Result<&dyn GenerateImageKeyDevice> {
        let derive_type = self.resolve_derive_type(derive_type)?;
        self.generate_image
            .get(derive_type)
            .ok_or(CarrotError::CapabilityMissing("generate-image key"))
    }

    /// Spend device for a hierarchy.
    pub fn spend(&self, derive_type: DeriveType) -> Result<&dyn SpendKeyDevice> {
        let derive_type = self.resolve_derive_type(derive_type)?;
        self.spend
            .get(derive_type)
            .ok_or(CarrotError::CapabilityMissing("spend key"))
    }

    /// Seraphis address device.
    pub fn seraphis_address(&self) -> Result<&SeraphisAddressDevice> {
        self.seraphis_address
            .as_deref()
            .ok_or(CarrotError::CapabilityMissing("seraphis address device"))
    }

    /// Seraphis key image device.
    pub fn seraphis_key_image(&self) -> Result<&dyn SeraphisKeyImageDevice> {
        self.seraphis_key_image
            .as_deref()
            .ok_or(CarrotError::CapabilityMissing("seraphis key image device"))
    }

    /// Names of the capabilities present, for display.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut out = vec!["address"];
        if self.view_incoming.legacy.is_some() || self.view_incoming.carrot.is_some() {
            out.push("view-incoming");
        }
        if self.view_balance.is_some() {
            out.push("view-balance");
        }
        if self.generate_image.legacy.is_some() || self.generate_image.carrot.is_some() {
            out.push("generate-image");
        }
        if self.spend.legacy.is_some() || self.spend.carrot.is_some() {
            out.push("spend");
        }
        if self.seraphis_key_image.is_some() {
            out.push("seraphis");
        }
        out
    }
}

impl std::fmt::Debug for AccountDevices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDevices")
            .field("derive_type", &self.address.derive_type())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// A view-incoming device paired with its concrete derive type.
#[derive(Clone, Copy)]
pub struct ViewIncomingHandle<'a> {
    /// The device.
    pub device: &'a dyn ViewIncomingKeyDevice,
    /// Resolved hierarchy.
    pub derive_type: DeriveType,
}

impl<'a> std::ops::Deref for ViewIncomingHandle<'a> {
    type Target = dyn ViewIncomingKeyDevice + 'a;

    fn deref(&self) -> &Self::Target {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrot_core::{AddressIndex, AddressIndexExtended};
    use carrot_crypto::{Scalar, SecretScalar};

    fn master() -> MasterSecret {
        MasterSecret::from_array([0x11; 32])
    }

    #[test]
    fn test_full_carrot_account() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        assert_eq!(
            devices.capabilities(),
            vec!["address", "view-incoming", "view-balance", "generate-image", "spend", "seraphis"]
        );
        assert!(devices.view_incoming(DeriveType::Auto).is_ok());
        assert!(devices.spend(DeriveType::Carrot).is_ok());
        assert!(devices.seraphis_address().is_ok());
        assert!(matches!(
            devices.spend(DeriveType::PreCarrot),
            Err(CarrotError::UnsupportedDeriveType { .. })
        ));
    }

    #[test]
    fn test_view_balance_account_cannot_spend() {
        let full = CarrotKeys::from_master(&master()).unwrap();
        let keys = CarrotKeys::from_view_balance(
            full.view_balance_secret().unwrap().clone(),
            full.spend_pubkey(),
        )
        .unwrap();
        let devices = AccountDevices::from_carrot(&keys).unwrap();
        assert!(devices.view_balance().is_ok());
        assert!(devices.generate_image(DeriveType::Carrot).is_ok());
        assert!(matches!(
            devices.spend(DeriveType::Carrot),
            Err(CarrotError::CapabilityMissing(_))
        ));
        assert!(devices.seraphis_key_image().is_err());
    }

    #[test]
    fn test_legacy_view_only_account() {
        let full = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(123u64))).unwrap();
        let view_only = LegacyKeys::view_only(
            crate::legacy::make_legacy_view_key(&SecretScalar::new(Scalar::from(123u64))).unwrap(),
            full.spend_pubkey(),
        )
        .unwrap();
        let devices = AccountDevices::from_legacy(&view_only).unwrap();
        assert_eq!(devices.capabilities(), vec!["address", "view-incoming"]);
        assert_eq!(
            devices.view_incoming(DeriveType::Auto).unwrap().derive_type,
            DeriveType::PreCarrot
        );
        assert!(devices.view_balance().is_err());
        assert!(devices.generate_image(DeriveType::PreCarrot).is_err());
    }

    #[test]
    fn test_hybrid_account() {
        let legacy = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(5u64))).unwrap();
        let carrot = CarrotKeys::from_master(&master()).unwrap();
        let devices = AccountDevices::hybrid(&legacy, &carrot).unwrap();

        assert_eq!(devices.resolve_derive_type(DeriveType::Auto).unwrap(), DeriveType::Carrot);
        assert!(devices.spend(DeriveType::PreCarrot).is_ok());
        assert!(devices.spend(DeriveType::Carrot).is_ok());

        let legacy_main = devices
            .address()
            .make_destination(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::PreCarrot))
            .unwrap();
        assert_eq!(legacy_main.spend_pubkey, legacy.spend_pubkey());
    }

    #[test]
    fn test_debug_lists_capabilities_only() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        let debug = format!("{:?}", devices);
        assert!(debug.contains("view-balance"));
        assert!(!debug.contains("secret:"));
    }
}
