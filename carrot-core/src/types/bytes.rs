//! Fixed-size public byte types.
//!
//! Points are carried compressed; nothing here checks that they decode.

use crate::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// POINTS
// ═══════════════════════════════════════════════════════════════════════════════

define_bytes_type! {
    /// `Ko`: onetime address of an enote.
    OnetimeAddress, POINT_SIZE
}

define_bytes_type! {
    /// `C_a`: Pedersen commitment to an enote amount.
    AmountCommitment, POINT_SIZE
}

define_bytes_type! {
    /// `K^j_s`: spend pubkey of a (sub)address.
    AddressSpendPubkey, POINT_SIZE
}

define_bytes_type! {
    /// `K^j_v`: view pubkey of a (sub)address.
    AddressViewPubkey, POINT_SIZE
}

define_bytes_type! {
    /// `D_e`: X25519 u-coordinate of the enote ephemeral pubkey.
    EnoteEphemeralPubkey, POINT_SIZE
}

define_bytes_type! {
    /// `R`: legacy transaction pubkey (edwards25519).
    TxPubkey, POINT_SIZE
}

define_bytes_type! {
    /// Double-spend nullifier.
    KeyImage, KEY_IMAGE_SIZE
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENOTE FIELDS
// ═══════════════════════════════════════════════════════════════════════════════

define_bytes_type! {
    /// Block-cipher encryption of an [`AddressIndex`](crate::AddressIndex).
    AddressTag, ADDRESS_TAG_SIZE
}

define_bytes_type! {
    /// Address tag XOR-encrypted for one enote.
    EncryptedAddressTag, ADDRESS_TAG_SIZE
}

define_bytes_type! {
    /// 3-byte Carrot view tag.
    ViewTag, VIEW_TAG_SIZE
}

define_bytes_type! {
    /// XOR-encrypted little-endian amount.
    EncryptedAmount, ENCRYPTED_AMOUNT_SIZE
}

define_bytes_type! {
    /// Integrated-address payment id.
    PaymentId, PAYMENT_ID_SIZE
}

define_bytes_type! {
    /// XOR-encrypted payment id.
    EncryptedPaymentId, PAYMENT_ID_SIZE
}

define_bytes_type! {
    /// Per-proposal randomness from which the ephemeral key is derived.
    JanusAnchor, JANUS_ANCHOR_SIZE
}

define_bytes_type! {
    /// XOR-encrypted Janus anchor.
    EncryptedJanusAnchor, JANUS_ANCHOR_SIZE
}

define_bytes_type! {
    /// Transaction-level context bound into every enote of a transaction.
    InputContext, INPUT_CONTEXT_SIZE
}

impl ViewTag {
    /// Returns the tag as a 24-bit integer (first byte most significant).
    pub fn to_u32(&self) -> u32 {
        (u32::from(self.0[0]) << 16) | (u32::from(self.0[1]) << 8) | u32::from(self.0[2])
    }
}

impl PaymentId {
    /// The null payment id.
    pub const NULL: PaymentId = PaymentId([0u8; PAYMENT_ID_SIZE]);

    /// Returns true for the null payment id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; PAYMENT_ID_SIZE]
    }
}

impl InputContext {
    /// `"C" || block_index (u64 LE) || zero padding`
    pub fn coinbase(block_index: u64) -> Self {
        let mut bytes = [0u8; INPUT_CONTEXT_SIZE];
        bytes[0] = INPUT_CONTEXT_COINBASE;
        bytes[1..9].copy_from_slice(&block_index.to_le_bytes());
        Self(bytes)
    }

    /// `"R" || first key image of the transaction`
    pub fn ringct(first_key_image: &KeyImage) -> Self {
        let mut bytes = [0u8; INPUT_CONTEXT_SIZE];
        bytes[0] = INPUT_CONTEXT_RINGCT;
        bytes[1..].copy_from_slice(first_key_image.as_bytes());
        Self(bytes)
    }

    /// Returns true for a coinbase context.
    pub fn is_coinbase(&self) -> bool {
        self.0[0] == INPUT_CONTEXT_COINBASE
    }
}
