//! Key images and onetime address openings.
//!
//! For a dual-base enote received at a subaddress with opening
//! `K^j_s = k_scal (K_s + k_ext G)`:
//!
//! ```text
//! x  = k_scal (k_gi + k_ext) + k^o_g
//! KI = x Hp(Ko) = k_scal (k_gi Hp(Ko)) + (k_scal k_ext + k^o_g) Hp(Ko)
//! ```
//!
//! so a view-balance wallet holding only a generate-image device computes
//! the same key image as the full spend key. Legacy enotes are the special
//! case `k_scal = 1`, `k^o_t = 0` with `k_gi = k_s`.

use curve25519_dalek::traits::IsIdentity;
use zeroize::{Zeroize, ZeroizeOnDrop};

use carrot_core::{
    AddressIndex, AddressIndexExtended, AmountCommitment, CarrotError, DeriveType,
    EnoteEphemeralPubkey, InputContext, KeyImage, MismatchReason, OnetimeAddress, Result,
    SenderReceiverSecret,
};
use carrot_crypto::{clear_commit, hash_to_point, EdwardsBytes, EdwardsPoint, Scalar, SecretScalar};
use carrot_keys::{AccountDevices, SubaddressOpening};

use crate::components::*;
use crate::hint::{BaseSet, OpeningHint};
use crate::scan::EnoteOrigin;

/// Computes key images from opening hints.
pub trait KeyImageDevice {
    /// Key image of the hinted enote.
    fn derive_key_image(&self, hint: &OpeningHint) -> Result<KeyImage>;
}

impl KeyImageDevice for AccountDevices {
    fn derive_key_image(&self, hint: &OpeningHint) -> Result<KeyImage> {
        match hint.base_set()? {
            BaseSet::LegacySingle | BaseSet::CarrotDual(_) => {
                let opening = recover_dual_base_opening(self, hint)?;
                dual_base_key_image(self, &opening)
            }
            BaseSet::SeraphisTriple => seraphis_key_image(self, hint),
        }
    }
}

/// Everything but the account secret needed to open a dual-base `Ko`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DualBaseOpening {
    /// Hierarchy the enote was received under.
    #[zeroize(skip)]
    pub derive_type: DeriveType,
    /// `Ko`
    #[zeroize(skip)]
    pub onetime_address: OnetimeAddress,
    /// Subaddress opening.
    pub subaddress: SubaddressOpening,
    /// `k^o_g`
    pub sender_extension_g: Scalar,
    /// `k^o_t`
    pub sender_extension_t: Scalar,
}

impl std::fmt::Debug for DualBaseOpening {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualBaseOpening")
            .field("derive_type", &self.derive_type)
            .field("onetime_address", &self.onetime_address)
            .finish_non_exhaustive()
    }
}

/// Recomputes the sender extensions of a hinted dual-base enote and checks
/// them against `Ko`.
///
/// # Errors
/// `ScanMismatch(OnetimeAddress)` if the hint does not open `Ko`;
/// `InvalidEnote` for Seraphis hints.
pub fn recover_dual_base_opening(
    devices: &AccountDevices,
    hint: &OpeningHint,
) -> Result<DualBaseOpening> {
    match hint {
        OpeningHint::Legacy {
            enote,
            subaddress_index,
        } => {
            let derive_type = DeriveType::PreCarrot;
            let view = devices.view_incoming(derive_type)?;
            let shared =
                view.view_key_scalar_mult_ed25519(derive_type, &enote.tx_pubkey.decompress()?)?;
            let k_o =
                make_legacy_onetime_extension(&make_legacy_derivation(&shared), enote.output_index)?;

            let resolved = devices
                .address()
                .resolve(&AddressIndexExtended::new(*subaddress_index, derive_type))?;
            let expected = EdwardsPoint::mul_base(&k_o) + resolved.spend_pubkey.decompress()?;
            if OnetimeAddress::from_point(&expected) != enote.onetime_address {
                return Err(CarrotError::ScanMismatch(MismatchReason::OnetimeAddress));
            }
            Ok(DualBaseOpening {
                derive_type,
                onetime_address: enote.onetime_address,
                subaddress: resolved.opening,
                sender_extension_g: k_o,
                sender_extension_t: Scalar::ZERO,
            })
        }
        OpeningHint::Carrot {
            enote,
            subaddress_index,
            origin,
        } => {
            let derive_type = subaddress_index.derive_type;
            let input_context = enote.input_context();
            let secret = match origin {
                EnoteOrigin::External | EnoteOrigin::SpecialSelfSend => {
                    external_secret(devices, derive_type, &enote.ephemeral_pubkey, &input_context)?
                }
                EnoteOrigin::Internal(self_send_type) => {
                    devices.view_balance()?.make_internal_sender_receiver_secret(
                        derive_type,
                        *self_send_type,
                        &enote.ephemeral_pubkey,
                        &input_context,
                    )?
                }
                EnoteOrigin::Coinbase => {
                    return Err(CarrotError::InvalidEnote(
                        "non-coinbase enote hinted with coinbase origin".into(),
                    ))
                }
            };
            open_with_secret(
                devices,
                AddressIndexExtended::new(subaddress_index.index, derive_type),
                &secret,
                &enote.amount_commitment,
                &enote.onetime_address,
            )
        }
        OpeningHint::CarrotCoinbase { enote, derive_type } => {
            let input_context = enote.input_context();
            let secret =
                external_secret(devices, *derive_type, &enote.ephemeral_pubkey, &input_context)?;
            open_with_secret(
                devices,
                AddressIndexExtended::new(AddressIndex::MAIN, *derive_type),
                &secret,
                &AmountCommitment::from_point(&clear_commit(enote.amount)),
                &enote.onetime_address,
            )
        }
        OpeningHint::Seraphis { .. } | OpeningHint::SeraphisCoinbase { .. } => Err(
            CarrotError::InvalidEnote("seraphis enotes have no dual-base opening".into()),
        ),
    }
}

fn external_secret(
    devices: &AccountDevices,
    derive_type: DeriveType,
    ephemeral_pubkey: &EnoteEphemeralPubkey,
    input_context: &InputContext,
) -> Result<SenderReceiverSecret> {
    let ecdh = devices
        .address()
        .view_key_scalar_mult_x25519(derive_type, ephemeral_pubkey)?;
    Ok(make_sender_receiver_secret(&ecdh, ephemeral_pubkey, input_context))
}

fn open_with_secret(
    devices: &AccountDevices,
    index: AddressIndexExtended,
    secret: &SenderReceiverSecret,
    amount_commitment: &AmountCommitment,
    onetime_address: &OnetimeAddress,
) -> Result<DualBaseOpening> {
    let resolved = devices.address().resolve(&index)?;
    let extensions = make_onetime_extensions(secret, amount_commitment)?;
    if make_onetime_address(&resolved.spend_pubkey.decompress()?, &extensions) != *onetime_address
    {
        return Err(CarrotError::ScanMismatch(MismatchReason::OnetimeAddress));
    }
    Ok(DualBaseOpening {
        derive_type: resolved.index.derive_type,
        onetime_address: *onetime_address,
        subaddress: resolved.opening,
        sender_extension_g: extensions.g,
        sender_extension_t: extensions.t,
    })
}

fn dual_base_key_image(devices: &AccountDevices, opening: &DualBaseOpening) -> Result<KeyImage> {
    let derive_type = opening.derive_type;
    let base = devices
        .generate_image(derive_type)?
        .generate_image_key_mult(derive_type, &opening.onetime_address)?;
    let hp = hash_to_point(opening.onetime_address.as_bytes());
    let sub = &opening.subaddress;

    let key_image =
        sub.scalar * base + (sub.scalar * sub.extension + opening.sender_extension_g) * hp;
    if key_image.is_identity() {
        return Err(CarrotError::DerivationDegenerate("key image"));
    }
    Ok(KeyImage::from_point(&key_image))
}

fn seraphis_key_image(devices: &AccountDevices, hint: &OpeningHint) -> Result<KeyImage> {
    let device = devices.seraphis_address()?;
    let (index, enote_ko, ephemeral_pubkey, input_context, commitment) = match hint {
        OpeningHint::Seraphis {
            enote,
            subaddress_index,
        } => (
            *subaddress_index,
            enote.onetime_address,
            enote.ephemeral_pubkey,
            enote.input_context(),
            enote.amount_commitment,
        ),
        OpeningHint::SeraphisCoinbase { enote } => (
            AddressIndex::MAIN,
            enote.onetime_address,
            enote.ephemeral_pubkey,
            enote.input_context(),
            AmountCommitment::from_point(&clear_commit(enote.amount)),
        ),
        _ => {
            return Err(CarrotError::InvalidEnote(
                "expected a seraphis opening hint".into(),
            ))
        }
    };

    let ecdh = device
        .view_incoming()
        .view_key_scalar_mult_x25519(DeriveType::Carrot, &ephemeral_pubkey)?;
    let secret = make_sender_receiver_secret(&ecdh, &ephemeral_pubkey, &input_context);
    let sender = make_seraphis_sender_extensions(&secret, &commitment)?;
    let resolved = device.resolve(&index)?;
    let expected = resolved.spend_pubkey.decompress()? + sender.to_point();
    if OnetimeAddress::from_point(&expected) != enote_ko {
        return Err(CarrotError::ScanMismatch(MismatchReason::OnetimeAddress));
    }

    let total = resolved.extensions.combine(&sender);
    devices
        .seraphis_key_image()?
        .make_key_image(&total.x, &total.u)
}

/// Opens `Ko = x G + y T` with the account's spend device.
///
/// # Errors
/// `CapabilityMissing` without a spend key for the enote's hierarchy.
pub fn open_onetime_address(
    devices: &AccountDevices,
    hint: &OpeningHint,
) -> Result<(SecretScalar, SecretScalar)> {
    let opening = recover_dual_base_opening(devices, hint)?;
    devices.spend(opening.derive_type)?.onetime_address_opening(
        opening.derive_type,
        &opening.subaddress,
        &opening.sender_extension_g,
        &opening.sender_extension_t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::*;
    use crate::scan::EnoteScanner;
    use carrot_core::{EnoteVariant, MasterSecret};
    use carrot_crypto::generator_t;
    use carrot_keys::{CarrotKeys, LegacyKeys, LegacySubaddressTable};

    fn master() -> MasterSecret {
        MasterSecret::from_array([0x42; 32])
    }

    fn l0() -> KeyImage {
        KeyImage::from_array([0x19; 32])
    }

    fn hint_for(devices: &AccountDevices, enote: EnoteVariant) -> OpeningHint {
        let record = EnoteScanner::new(devices)
            .scan_enote(&enote)
            .unwrap()
            .into_owned()
            .unwrap();
        OpeningHint::from_record(&enote, &record).unwrap()
    }

    fn assert_key_image_matches_opening(devices: &AccountDevices, hint: &OpeningHint) {
        let (x, y) = open_onetime_address(devices, hint).unwrap();
        let ko = hint.onetime_address_ref();
        let reopened = EdwardsPoint::mul_base(x.expose()) + y.expose() * generator_t();
        assert_eq!(OnetimeAddress::from_point(&reopened), *ko);

        let expected = KeyImage::from_point(&(x.expose() * hash_to_point(ko.as_bytes())));
        assert_eq!(devices.derive_key_image(hint).unwrap(), expected);
    }

    #[test]
    fn test_carrot_subaddress_key_image() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        let destination = devices
            .address()
            .make_destination(&AddressIndexExtended::new(
                AddressIndex::new(2, 9),
                DeriveType::Auto,
            ))
            .unwrap();
        let out = make_carrot_enote(&PaymentProposal::new(destination, 5_000), &l0()).unwrap();
        let hint = hint_for(&devices, EnoteVariant::Carrot(out.enote));
        assert_key_image_matches_opening(&devices, &hint);
    }

    #[test]
    fn test_view_balance_wallet_agrees_with_spend_wallet() {
        let full_keys = CarrotKeys::from_master(&master()).unwrap();
        let full = AccountDevices::from_carrot(&full_keys).unwrap();
        let watch = AccountDevices::from_carrot(
            &CarrotKeys::from_view_balance(
                full_keys.view_balance_secret().unwrap().clone(),
                full_keys.spend_pubkey(),
            )
            .unwrap(),
        )
        .unwrap();

        let (_, change) = make_two_out_transaction_enotes(
            &PaymentProposal::new(
                full.address()
                    .make_destination(&AddressIndexExtended::new(
                        AddressIndex::new(0, 1),
                        DeriveType::Auto,
                    ))
                    .unwrap(),
                10,
            ),
            &SelfSendProposal::change(90),
            &l0(),
            &full,
        )
        .unwrap();
        let enote = EnoteVariant::Carrot(change.enote);
        let hint = hint_for(&watch, enote);
        assert_eq!(
            watch.derive_key_image(&hint).unwrap(),
            full.derive_key_image(&hint).unwrap()
        );
        assert!(open_onetime_address(&watch, &hint).is_err());
        assert_key_image_matches_opening(&full, &hint);
    }

    #[test]
    fn test_hybrid_key_images_agree_across_paths() {
        let legacy = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(77u64))).unwrap();
        let carrot = CarrotKeys::from_master(&master()).unwrap();
        let devices = AccountDevices::hybrid(&legacy, &carrot).unwrap();
        let table = LegacySubaddressTable::generate(devices.address(), 2, 8).unwrap();
        let scanner = EnoteScanner::new(&devices).with_legacy_table(&table);

        // Carrot subaddress: full scan vs a hint built from the index alone.
        let carrot_index = AddressIndexExtended::new(AddressIndex::new(1, 3), DeriveType::Carrot);
        let destination = devices.address().make_destination(&carrot_index).unwrap();
        let out = make_carrot_enote(&PaymentProposal::new(destination, 12), &l0()).unwrap();
        let full = scanner
            .scan_enote_full(&EnoteVariant::Carrot(out.enote))
            .unwrap()
            .into_owned()
            .unwrap();
        assert_eq!(full.record.address_index, carrot_index);
        let hint = OpeningHint::Carrot {
            enote: out.enote,
            subaddress_index: carrot_index,
            origin: EnoteOrigin::External,
        };
        assert_eq!(full.key_image, devices.derive_key_image(&hint).unwrap());

        // Legacy subaddress: table lookup in the scanner vs direct resolution.
        let legacy_index =
            AddressIndexExtended::new(AddressIndex::new(1, 5), DeriveType::PreCarrot);
        let resolved = devices.address().resolve(&legacy_index).unwrap();
        assert_eq!(table.lookup(&resolved.spend_pubkey), Some(legacy_index.index));

        let destination = devices.address().make_destination(&legacy_index).unwrap();
        let out = make_legacy_enote(
            &PaymentProposal::new(destination, 34),
            &InputContext::ringct(&l0()),
            3,
        )
        .unwrap();
        let full = scanner
            .scan_enote_full(&EnoteVariant::Legacy(out.enote))
            .unwrap()
            .into_owned()
            .unwrap();
        assert_eq!(full.record.address_index, legacy_index);
        let hint = OpeningHint::Legacy {
            enote: out.enote,
            subaddress_index: resolved.index.index,
        };
        assert_eq!(full.key_image, devices.derive_key_image(&hint).unwrap());
        assert_key_image_matches_opening(&devices, &hint);
    }

    #[test]
    fn test_legacy_key_image() {
        let keys = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(8675309u64))).unwrap();
        let devices = AccountDevices::from_legacy(&keys).unwrap();
        let destination = devices
            .address()
            .make_destination(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::Auto))
            .unwrap();
        let out = make_legacy_enote(
            &PaymentProposal::new(destination, 44),
            &InputContext::ringct(&l0()),
            1,
        )
        .unwrap();
        let hint = hint_for(&devices, EnoteVariant::Legacy(out.enote));
        assert_key_image_matches_opening(&devices, &hint);
    }

    #[test]
    fn test_coinbase_key_image() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        let destination = devices
            .address()
            .make_destination(&AddressIndexExtended::default())
            .unwrap();
        let enote = make_coinbase_enote(&PaymentProposal::new(destination, 600), 77).unwrap();
        let hint = hint_for(&devices, EnoteVariant::CarrotCoinbase(enote));
        assert_key_image_matches_opening(&devices, &hint);
    }

    #[test]
    fn test_seraphis_key_images_differ_per_enote() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        let destination = devices
            .seraphis_address()
            .unwrap()
            .make_destination(&AddressIndex::new(1, 1))
            .unwrap();
        let a = make_seraphis_enote(&PaymentProposal::new(destination, 3), &l0()).unwrap();
        let b = make_seraphis_enote(&PaymentProposal::new(destination, 3), &l0()).unwrap();
        let ki_a = devices
            .derive_key_image(&hint_for(&devices, EnoteVariant::Seraphis(a.enote)))
            .unwrap();
        let ki_b = devices
            .derive_key_image(&hint_for(&devices, EnoteVariant::Seraphis(b.enote)))
            .unwrap();
        assert_ne!(ki_a, ki_b);
    }

    #[test]
    fn test_wrong_index_hint_rejected() {
        let devices = AccountDevices::from_master(&master()).unwrap();
        let destination = devices
            .address()
            .make_destination(&AddressIndexExtended::new(
                AddressIndex::new(0, 4),
                DeriveType::Auto,
            ))
            .unwrap();
        let out = make_carrot_enote(&PaymentProposal::new(destination, 1), &l0()).unwrap();
        let hint = OpeningHint::Carrot {
            enote: out.enote,
            subaddress_index: AddressIndexExtended::new(AddressIndex::new(0, 5), DeriveType::Carrot),
            origin: EnoteOrigin::External,
        };
        assert!(matches!(
            devices.derive_key_image(&hint),
            Err(CarrotError::ScanMismatch(MismatchReason::OnetimeAddress))
        ));
    }
}
