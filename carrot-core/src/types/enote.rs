//! On-chain enote formats.
//!
//! - [`CarrotEnote`] / [`CarrotCoinbaseEnote`]: Carrot outputs (dual-base spend key)
//! - [`LegacyEnote`]: pre-Carrot CryptoNote outputs
//! - [`SeraphisEnote`] / [`SeraphisCoinbaseEnote`]: triple-base outputs
//! - [`EnoteRecord`]: an enote as stored by a ledger

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Carrot enote of a standard transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrotEnote {
    /// `Ko`
    pub onetime_address: OnetimeAddress,
    /// `C_a`
    pub amount_commitment: AmountCommitment,
    /// `a_enc`
    pub amount_enc: EncryptedAmount,
    /// `anchor_enc`
    pub anchor_enc: EncryptedJanusAnchor,
    /// `tag_enc`
    pub address_tag_enc: EncryptedAddressTag,
    /// `pid_enc`
    pub payment_id_enc: EncryptedPaymentId,
    /// `vt`
    pub view_tag: ViewTag,
    /// `D_e`
    pub ephemeral_pubkey: EnoteEphemeralPubkey,
    /// `L_0`, first key image of the transaction.
    pub tx_first_key_image: KeyImage,
}

impl CarrotEnote {
    /// `"R" || L_0`
    pub fn input_context(&self) -> InputContext {
        InputContext::ringct(&self.tx_first_key_image)
    }
}

/// Carrot coinbase enote: cleartext amount, main address only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrotCoinbaseEnote {
    /// `Ko`
    pub onetime_address: OnetimeAddress,
    /// Cleartext amount.
    pub amount: u64,
    /// `anchor_enc`
    pub anchor_enc: EncryptedJanusAnchor,
    /// `vt`
    pub view_tag: ViewTag,
    /// `D_e`
    pub ephemeral_pubkey: EnoteEphemeralPubkey,
    /// Height of the block this enote is mined in.
    pub block_index: u64,
}

impl CarrotCoinbaseEnote {
    /// `"C" || block_index`
    pub fn input_context(&self) -> InputContext {
        InputContext::coinbase(self.block_index)
    }
}

/// Legacy CryptoNote enote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEnote {
    /// `Ko = H_s(8 k_v R || i) G + K^j_s`
    pub onetime_address: OnetimeAddress,
    /// `C = z G + a H`
    pub amount_commitment: AmountCommitment,
    /// `a_enc`
    pub amount_enc: EncryptedAmount,
    /// 1-byte legacy view tag.
    pub view_tag: u8,
    /// `R`
    pub tx_pubkey: TxPubkey,
    /// Output position within the transaction.
    pub output_index: u64,
}

/// Seraphis enote of a standard transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeraphisEnote {
    /// `Ko`
    pub onetime_address: OnetimeAddress,
    /// `C_a`
    pub amount_commitment: AmountCommitment,
    /// `a_enc`
    pub amount_enc: EncryptedAmount,
    /// `anchor_enc`
    pub anchor_enc: EncryptedJanusAnchor,
    /// `tag_enc`
    pub address_tag_enc: EncryptedAddressTag,
    /// `vt`
    pub view_tag: ViewTag,
    /// `D_e`
    pub ephemeral_pubkey: EnoteEphemeralPubkey,
    /// `L_0`
    pub tx_first_key_image: KeyImage,
}

impl SeraphisEnote {
    /// `"R" || L_0`
    pub fn input_context(&self) -> InputContext {
        InputContext::ringct(&self.tx_first_key_image)
    }
}

/// Seraphis coinbase enote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeraphisCoinbaseEnote {
    /// `Ko`
    pub onetime_address: OnetimeAddress,
    /// Cleartext amount.
    pub amount: u64,
    /// `anchor_enc`
    pub anchor_enc: EncryptedJanusAnchor,
    /// `vt`
    pub view_tag: ViewTag,
    /// `D_e`
    pub ephemeral_pubkey: EnoteEphemeralPubkey,
    /// Block height.
    pub block_index: u64,
}

impl SeraphisCoinbaseEnote {
    /// `"C" || block_index`
    pub fn input_context(&self) -> InputContext {
        InputContext::coinbase(self.block_index)
    }
}

/// Any enote format the scanner understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "enote", rename_all = "snake_case")]
pub enum EnoteVariant {
    /// Carrot standard enote.
    Carrot(CarrotEnote),
    /// Carrot coinbase enote.
    CarrotCoinbase(CarrotCoinbaseEnote),
    /// Legacy enote.
    Legacy(LegacyEnote),
    /// Seraphis standard enote.
    Seraphis(SeraphisEnote),
    /// Seraphis coinbase enote.
    SeraphisCoinbase(SeraphisCoinbaseEnote),
}

impl EnoteVariant {
    /// `Ko` of the enote.
    pub fn onetime_address(&self) -> &OnetimeAddress {
        match self {
            EnoteVariant::Carrot(e) => &e.onetime_address,
            EnoteVariant::CarrotCoinbase(e) => &e.onetime_address,
            EnoteVariant::Legacy(e) => &e.onetime_address,
            EnoteVariant::Seraphis(e) => &e.onetime_address,
            EnoteVariant::SeraphisCoinbase(e) => &e.onetime_address,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EnoteVariant::Carrot(_) => "carrot",
            EnoteVariant::CarrotCoinbase(_) => "carrot_coinbase",
            EnoteVariant::Legacy(_) => "legacy",
            EnoteVariant::Seraphis(_) => "seraphis",
            EnoteVariant::SeraphisCoinbase(_) => "seraphis_coinbase",
        }
    }
}

/// An enote as published on a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnoteRecord {
    /// Ledger-assigned, strictly increasing id.
    pub id: u64,
    /// Block containing the enote.
    pub block_index: u64,
    /// Unix timestamp of publication.
    pub timestamp: u64,
    /// The enote itself.
    pub enote: EnoteVariant,
}

impl EnoteRecord {
    /// Creates a record with id 0; the ledger assigns the real id.
    pub fn new(block_index: u64, enote: EnoteVariant) -> Self {
        Self {
            id: 0,
            block_index,
            timestamp: 0,
            enote,
        }
    }
}
