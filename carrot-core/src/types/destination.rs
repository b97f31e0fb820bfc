//! Destinations: the public bundle a sender pays to.

use serde::{Deserialize, Serialize};

use crate::error::{CarrotError, Result};
use crate::types::{AddressSpendPubkey, AddressTag, AddressViewPubkey, PaymentId};

/// A (sub)address as published by its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// `K^j_s`
    pub spend_pubkey: AddressSpendPubkey,
    /// `K^j_v`
    pub view_pubkey: AddressViewPubkey,
    /// Whether the ephemeral key must be built on `K^j_s` instead of `G`.
    pub is_subaddress: bool,
    /// Encrypted address index, optional for main addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_tag: Option<AddressTag>,
    /// Integrated-address payment id; null otherwise.
    #[serde(default)]
    pub payment_id: PaymentId,
}

impl Destination {
    /// Main address destination.
    pub fn main(spend_pubkey: AddressSpendPubkey, view_pubkey: AddressViewPubkey) -> Self {
        Self {
            spend_pubkey,
            view_pubkey,
            is_subaddress: false,
            address_tag: None,
            payment_id: PaymentId::NULL,
        }
    }

    /// Subaddress destination.
    pub fn subaddress(
        spend_pubkey: AddressSpendPubkey,
        view_pubkey: AddressViewPubkey,
        address_tag: AddressTag,
    ) -> Self {
        Self {
            spend_pubkey,
            view_pubkey,
            is_subaddress: true,
            address_tag: Some(address_tag),
            payment_id: PaymentId::NULL,
        }
    }

    /// Attaches an address tag.
    pub fn with_address_tag(mut self, tag: AddressTag) -> Self {
        self.address_tag = Some(tag);
        self
    }

    /// Turns a main address into an integrated address.
    ///
    /// # Errors
    /// Subaddresses cannot carry a payment id.
    pub fn integrated(mut self, payment_id: PaymentId) -> Result<Self> {
        if self.is_subaddress {
            return Err(CarrotError::InvalidDestination(
                "payment ids are only valid on main addresses".into(),
            ));
        }
        self.payment_id = payment_id;
        Ok(self)
    }

    /// Structural checks that do not need curve arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.is_subaddress && !self.payment_id.is_null() {
            return Err(CarrotError::InvalidDestination(
                "subaddress with payment id".into(),
            ));
        }
        if self.is_subaddress && self.address_tag.is_none() {
            return Err(CarrotError::InvalidDestination(
                "subaddress without address tag".into(),
            ));
        }
        if self.spend_pubkey == AddressSpendPubkey::default() {
            return Err(CarrotError::InvalidDestination("empty spend pubkey".into()));
        }
        Ok(())
    }
}
