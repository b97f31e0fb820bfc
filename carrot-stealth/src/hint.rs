//! Opening hints.
//!
//! An [`OpeningHint`] is everything a spend device needs, beyond its own
//! secrets, to open a owned enote: the enote itself and the subaddress it was
//! received at. Hints are plain data and safe to pass to hardware devices.

use serde::{Deserialize, Serialize};

use carrot_core::{
    AddressIndex, AddressIndexExtended, AmountCommitment, CarrotCoinbaseEnote, CarrotEnote,
    CarrotError, DeriveType, EnoteVariant, LegacyEnote, OnetimeAddress, Result,
    SeraphisCoinbaseEnote, SeraphisEnote,
};

use crate::scan::{EnoteOrigin, IntermediateRecord};

/// Which generator basis an enote's onetime address lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseSet {
    /// `Ko = x G`, CryptoNote enotes.
    LegacySingle,
    /// `Ko = x G + y T` under the given hierarchy.
    CarrotDual(DeriveType),
    /// `Ko = x G + y X + z U`.
    SeraphisTriple,
}

/// Data needed to open an owned enote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpeningHint {
    /// Pre-Carrot enote.
    Legacy {
        /// The enote.
        enote: LegacyEnote,
        /// Receiving legacy subaddress.
        subaddress_index: AddressIndex,
    },
    /// Carrot enote, external or self-send.
    Carrot {
        /// The enote.
        enote: CarrotEnote,
        /// Receiving subaddress and hierarchy.
        subaddress_index: AddressIndexExtended,
        /// How the sender-receiver secret is recovered.
        origin: EnoteOrigin,
    },
    /// Carrot coinbase enote, always at the main address.
    CarrotCoinbase {
        /// The enote.
        enote: CarrotCoinbaseEnote,
        /// Receiving hierarchy.
        derive_type: DeriveType,
    },
    /// Seraphis enote.
    Seraphis {
        /// The enote.
        enote: SeraphisEnote,
        /// Receiving subaddress.
        subaddress_index: AddressIndex,
    },
    /// Seraphis coinbase enote.
    SeraphisCoinbase {
        /// The enote.
        enote: SeraphisCoinbaseEnote,
    },
}

impl OpeningHint {
    /// `Ko` of the hinted enote.
    pub fn onetime_address_ref(&self) -> &OnetimeAddress {
        match self {
            OpeningHint::Legacy { enote, .. } => &enote.onetime_address,
            OpeningHint::Carrot { enote, .. } => &enote.onetime_address,
            OpeningHint::CarrotCoinbase { enote, .. } => &enote.onetime_address,
            OpeningHint::Seraphis { enote, .. } => &enote.onetime_address,
            OpeningHint::SeraphisCoinbase { enote } => &enote.onetime_address,
        }
    }

    /// Receiving subaddress index; coinbase enotes report the main address.
    pub fn subaddress_index_ref(&self) -> &AddressIndex {
        match self {
            OpeningHint::Legacy {
                subaddress_index, ..
            } => subaddress_index,
            OpeningHint::Carrot {
                subaddress_index, ..
            } => &subaddress_index.index,
            OpeningHint::Seraphis {
                subaddress_index, ..
            } => subaddress_index,
            OpeningHint::CarrotCoinbase { .. } | OpeningHint::SeraphisCoinbase { .. } => {
                &AddressIndex::MAIN
            }
        }
    }

    /// Amount commitment, `None` for cleartext coinbase amounts.
    pub fn amount_commitment_ref(&self) -> Option<&AmountCommitment> {
        match self {
            OpeningHint::Legacy { enote, .. } => Some(&enote.amount_commitment),
            OpeningHint::Carrot { enote, .. } => Some(&enote.amount_commitment),
            OpeningHint::Seraphis { enote, .. } => Some(&enote.amount_commitment),
            OpeningHint::CarrotCoinbase { .. } | OpeningHint::SeraphisCoinbase { .. } => None,
        }
    }

    /// Generator basis of the hinted enote.
    ///
    /// # Errors
    /// `UnsupportedDeriveType` when a Carrot hint still says `Auto`.
    pub fn base_set(&self) -> Result<BaseSet> {
        let derive_type = match self {
            OpeningHint::Legacy { .. } => return Ok(BaseSet::LegacySingle),
            OpeningHint::Seraphis { .. } | OpeningHint::SeraphisCoinbase { .. } => {
                return Ok(BaseSet::SeraphisTriple)
            }
            OpeningHint::Carrot {
                subaddress_index, ..
            } => subaddress_index.derive_type,
            OpeningHint::CarrotCoinbase { derive_type, .. } => *derive_type,
        };
        if !derive_type.is_concrete() {
            return Err(CarrotError::unsupported("opening hint", derive_type));
        }
        Ok(BaseSet::CarrotDual(derive_type))
    }

    /// Builds the hint for an enote the scanner recognized.
    ///
    /// # Errors
    /// `InvalidEnote` if the record does not describe `enote`.
    pub fn from_record(enote: &EnoteVariant, record: &IntermediateRecord) -> Result<Self> {
        if enote.onetime_address() != &record.onetime_address {
            return Err(CarrotError::InvalidEnote(
                "record does not belong to this enote".into(),
            ));
        }
        let index = record.address_index;
        Ok(match enote {
            EnoteVariant::Legacy(enote) => OpeningHint::Legacy {
                enote: *enote,
                subaddress_index: index.index,
            },
            EnoteVariant::Carrot(enote) => OpeningHint::Carrot {
                enote: *enote,
                subaddress_index: index,
                origin: record.origin,
            },
            EnoteVariant::CarrotCoinbase(enote) => OpeningHint::CarrotCoinbase {
                enote: *enote,
                derive_type: index.derive_type,
            },
            EnoteVariant::Seraphis(enote) => OpeningHint::Seraphis {
                enote: *enote,
                subaddress_index: index.index,
            },
            EnoteVariant::SeraphisCoinbase(enote) => OpeningHint::SeraphisCoinbase { enote: *enote },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrot_core::{
        EncryptedAmount, EncryptedJanusAnchor, EnoteEphemeralPubkey, TxPubkey, ViewTag,
    };

    fn coinbase() -> CarrotCoinbaseEnote {
        CarrotCoinbaseEnote {
            onetime_address: OnetimeAddress::from_array([4; 32]),
            amount: 600,
            anchor_enc: EncryptedJanusAnchor::default(),
            view_tag: ViewTag::default(),
            ephemeral_pubkey: EnoteEphemeralPubkey::default(),
            block_index: 12,
        }
    }

    #[test]
    fn test_base_sets() {
        let legacy = OpeningHint::Legacy {
            enote: LegacyEnote {
                onetime_address: OnetimeAddress::from_array([1; 32]),
                amount_commitment: AmountCommitment::from_array([2; 32]),
                amount_enc: EncryptedAmount::default(),
                view_tag: 0,
                tx_pubkey: TxPubkey::default(),
                output_index: 0,
            },
            subaddress_index: AddressIndex::new(0, 3),
        };
        assert_eq!(legacy.base_set().unwrap(), BaseSet::LegacySingle);
        assert_eq!(legacy.subaddress_index_ref(), &AddressIndex::new(0, 3));
        assert!(legacy.amount_commitment_ref().is_some());

        let cb = OpeningHint::CarrotCoinbase {
            enote: coinbase(),
            derive_type: DeriveType::Carrot,
        };
        assert_eq!(cb.base_set().unwrap(), BaseSet::CarrotDual(DeriveType::Carrot));
        assert_eq!(cb.subaddress_index_ref(), &AddressIndex::MAIN);
        assert!(cb.amount_commitment_ref().is_none());
    }

    #[test]
    fn test_auto_derive_type_rejected() {
        let hint = OpeningHint::CarrotCoinbase {
            enote: coinbase(),
            derive_type: DeriveType::Auto,
        };
        assert!(matches!(
            hint.base_set(),
            Err(CarrotError::UnsupportedDeriveType { .. })
        ));
    }

    #[test]
    fn test_json_tagging() {
        let hint = OpeningHint::SeraphisCoinbase {
            enote: SeraphisCoinbaseEnote {
                onetime_address: OnetimeAddress::from_array([7; 32]),
                amount: 1,
                anchor_enc: EncryptedJanusAnchor::default(),
                view_tag: ViewTag::default(),
                ephemeral_pubkey: EnoteEphemeralPubkey::default(),
                block_index: 3,
            },
        };
        let json = serde_json::to_string(&hint).unwrap();
        assert!(json.contains("\"kind\":\"seraphis_coinbase\""));
        let back: OpeningHint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hint);
        assert_eq!(back.onetime_address_ref(), &OnetimeAddress::from_array([7; 32]));
    }
}
