//! Address device spanning both hierarchies.
//!
//! An account migrating from CryptoNote keeps receiving to its legacy
//! addresses while also issuing Carrot addresses. `Auto` resolves to Carrot
//! whenever a Carrot sub-device is present.

use std::sync::Arc;

use carrot_core::{
    AddressIndex, AddressIndexExtended, AddressSpendPubkey, AddressTag, AddressViewPubkey,
    CarrotError, DeriveType, EcdhSecret, EnoteEphemeralPubkey, Result,
};

use crate::device::{check_derive_type, AddressDevice, ResolvedAddress};

/// Dispatches to a legacy and/or Carrot address device.
pub struct HybridAddressDevice {
    legacy: Option<Arc<dyn AddressDevice>>,
    carrot: Option<Arc<dyn AddressDevice>>,
}

impl HybridAddressDevice {
    /// Composes the hybrid.
    ///
    /// # Errors
    /// `CapabilityMissing` if both sides are absent, `UnsupportedDeriveType`
    /// if a sub-device belongs to the wrong hierarchy.
    pub fn new(
        legacy: Option<Arc<dyn AddressDevice>>,
        carrot: Option<Arc<dyn AddressDevice>>,
    ) -> Result<Self> {
        if legacy.is_none() && carrot.is_none() {
            return Err(CarrotError::CapabilityMissing("address device"));
        }
        if let Some(device) = &legacy {
            check_derive_type("HybridAddressDevice::new", DeriveType::PreCarrot, device.derive_type())?;
        }
        if let Some(device) = &carrot {
            check_derive_type("HybridAddressDevice::new", DeriveType::Carrot, device.derive_type())?;
        }
        Ok(Self { legacy, carrot })
    }

    fn device(&self, derive_type: DeriveType) -> Result<(&dyn AddressDevice, DeriveType)> {
        let derive_type = self.resolve_derive_type(derive_type)?;
        let device = match derive_type {
            DeriveType::PreCarrot => self.legacy.as_deref(),
            DeriveType::Carrot => self.carrot.as_deref(),
            DeriveType::Auto => None,
        };
        device
            .map(|device| (device, derive_type))
            .ok_or_else(|| CarrotError::unsupported("HybridAddressDevice", derive_type))
    }
}

impl std::fmt::Debug for HybridAddressDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridAddressDevice")
            .field("legacy", &self.legacy.is_some())
            .field("carrot", &self.carrot.is_some())
            .finish()
    }
}

impl AddressDevice for HybridAddressDevice {
    fn derive_type(&self) -> DeriveType {
        DeriveType::Auto
    }

    fn resolve_derive_type(&self, derive_type: DeriveType) -> Result<DeriveType> {
        match derive_type {
            DeriveType::Auto if self.carrot.is_some() => Ok(DeriveType::Carrot),
            DeriveType::Auto => Ok(DeriveType::PreCarrot),
            DeriveType::Carrot if self.carrot.is_some() => Ok(DeriveType::Carrot),
            DeriveType::PreCarrot if self.legacy.is_some() => Ok(DeriveType::PreCarrot),
            other => Err(CarrotError::unsupported("resolve_derive_type", other)),
        }
    }

    fn account_spend_pubkey(&self, derive_type: DeriveType) -> Result<AddressSpendPubkey> {
        let (device, derive_type) = self.device(derive_type)?;
        device.account_spend_pubkey(derive_type)
    }

    fn main_view_pubkey(&self, derive_type: DeriveType) -> Result<AddressViewPubkey> {
        let (device, derive_type) = self.device(derive_type)?;
        device.main_view_pubkey(derive_type)
    }

    fn resolve(&self, index: &AddressIndexExtended) -> Result<ResolvedAddress> {
        let (device, derive_type) = self.device(index.derive_type)?;
        device.resolve(&AddressIndexExtended::new(index.index, derive_type))
    }

    fn encrypt_address_index(&self, index: &AddressIndexExtended) -> Result<AddressTag> {
        let (device, derive_type) = self.device(index.derive_type)?;
        device.encrypt_address_index(&AddressIndexExtended::new(index.index, derive_type))
    }

    fn decrypt_address_tag(
        &self,
        derive_type: DeriveType,
        tag: &AddressTag,
    ) -> Result<Option<AddressIndex>> {
        let (device, derive_type) = self.device(derive_type)?;
        device.decrypt_address_tag(derive_type, tag)
    }

    fn view_key_scalar_mult_x25519(
        &self,
        derive_type: DeriveType,
        ephemeral_pubkey: &EnoteEphemeralPubkey,
    ) -> Result<EcdhSecret> {
        let (device, derive_type) = self.device(derive_type)?;
        device.view_key_scalar_mult_x25519(derive_type, ephemeral_pubkey)
    }
}
