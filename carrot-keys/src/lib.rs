//! # Carrot Keys
//!
//! Key hierarchies and capability devices for Carrot accounts.
//!
//! This crate provides:
//!
//! - **Hierarchies**: legacy CryptoNote (`k_s`, `k_v`), Carrot (`s_m` down to
//!   `s_ga`) and the Seraphis extension on `(G, X, U)`
//! - **Devices**: one trait per capability (view-incoming, generate-address,
//!   view-balance, generate-image, spend, Seraphis key images)
//! - **Address devices**: resolve `(index, derive type)` to subaddress keys
//!   for legacy, Carrot and hybrid accounts
//! - **Account devices**: the set of devices an unlocked account holds
//!
//! ## Capabilities
//!
//! | Unlock level       | Scan external | See change | Key images | Spend |
//! |--------------------|---------------|------------|------------|-------|
//! | address only       | no            | no         | no         | no    |
//! | view-incoming      | yes           | no         | no         | no    |
//! | view-balance       | yes           | yes        | yes        | no    |
//! | master / spend key | yes           | yes        | yes        | yes   |
//!
//! ## Example
//!
//! ```rust,ignore
//! use carrot_core::{AddressIndex, AddressIndexExtended, DeriveType, MasterSecret};
//! use carrot_keys::AccountDevices;
//!
//! let devices = AccountDevices::from_master(&MasterSecret::from_array([7; 32]))?;
//! let index = AddressIndexExtended::new(AddressIndex::new(0, 1), DeriveType::Auto);
//! let destination = devices.address().make_destination(&index)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod account;
pub mod carrot;
pub mod device;
pub mod hybrid;
pub mod legacy;
pub mod seraphis;

pub use account::{AccountDevices, ViewIncomingHandle};
pub use carrot::{
    CarrotAddressDevice, CarrotGenerateAddressSecret, CarrotGenerateImageKey, CarrotKeys,
    CarrotSpendKey, CarrotViewBalanceSecret, CarrotViewIncomingKey,
};
pub use device::{
    check_derive_type, AddressDevice, GenerateAddressSecretDevice, GenerateImageKeyDevice,
    ResolvedAddress, SeraphisKeyImageDevice, SpendKeyDevice, SubaddressOpening,
    ViewBalanceSecretDevice, ViewIncomingKeyDevice,
};
pub use hybrid::HybridAddressDevice;
pub use legacy::{
    LegacyAddressDevice, LegacyKeys, LegacySpendKey, LegacySubaddressTable, LegacyViewIncomingKey,
};
pub use seraphis::{
    SeraphisAddressDevice, SeraphisExtensions, SeraphisKeyImageKey, SeraphisResolvedAddress,
};
