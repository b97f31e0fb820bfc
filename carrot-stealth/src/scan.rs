//! Enote scanning (receiver side).
//!
//! [`EnoteScanner`] tries every hierarchy the account holds a view key for
//! and reports either an [`IntermediateRecord`] or why the enote is not
//! ours. "Not ours" is a value, not an error; only device and wiring
//! failures surface as `Err`.
//!
//! ## Scan pipeline (Carrot, external)
//!
//! ```text
//! 1. s_sr' = k_v D_e                         (view-incoming device)
//! 2. vt check, primary bits then complementary bits
//! 3. s_sr, decrypt tag, resolve j            (address device)
//! 4. Ko == K^j_s + k^o_g G + k^o_t T
//! 5. C_a == k_a G + a H  for some enote type
//! 6. Janus check
//! ```

use subtle::ConstantTimeEq;
use tracing::{debug, instrument, trace};
use zeroize::Zeroize;

use carrot_core::{
    AddressIndex, AddressIndexExtended, AddressSpendPubkey, AmountCommitment,
    CarrotCoinbaseEnote, CarrotEnote, CarrotError, DeriveType, EnoteType, EnoteVariant,
    InputContext, KeyImage, LegacyEnote, MismatchReason, OnetimeAddress, PaymentId, Result,
    SelfSendType, SenderReceiverSecret, SeraphisCoinbaseEnote, SeraphisEnote, ViewTag,
};
use carrot_crypto::{
    clear_commit, commit, compute_legacy_view_tag, compute_view_tag, view_tags_match,
    EdwardsBytes, EdwardsPoint, Scalar, SecretScalar, ViewTagSplit,
};
use carrot_keys::{
    AccountDevices, LegacySubaddressTable, SeraphisAddressDevice, SeraphisExtensions,
};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::hint::OpeningHint;
use crate::janus::{verify_janus, JanusClaim, JanusOutcome};
use crate::key_image::KeyImageDevice;

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of scanning one enote.
#[derive(Clone, Debug)]
pub enum ScanResult<R> {
    /// The enote belongs to the account.
    Owned(R),
    /// The enote does not belong to the account.
    NotOwned(MismatchReason),
    /// The enote passed every ownership check but failed Janus protection.
    JanusRejected,
    /// The account holds no device able to scan this enote format.
    Skipped,
}

impl<R> ScanResult<R> {
    /// Returns true if the enote is owned.
    pub fn is_owned(&self) -> bool {
        matches!(self, ScanResult::Owned(_))
    }

    /// Takes the owned record.
    pub fn into_owned(self) -> Option<R> {
        match self {
            ScanResult::Owned(r) => Some(r),
            _ => None,
        }
    }

    /// Converts to a hard result: non-ownership becomes an error.
    pub fn into_result(self) -> Result<R> {
        match self {
            ScanResult::Owned(r) => Ok(r),
            ScanResult::NotOwned(reason) => Err(CarrotError::ScanMismatch(reason)),
            ScanResult::JanusRejected => Err(CarrotError::JanusViolation),
            ScanResult::Skipped => Err(CarrotError::CapabilityMissing("scanner for enote format")),
        }
    }

    /// Maps the owned record.
    pub fn map<S>(self, f: impl FnOnce(R) -> S) -> ScanResult<S> {
        match self {
            ScanResult::Owned(r) => ScanResult::Owned(f(r)),
            ScanResult::NotOwned(reason) => ScanResult::NotOwned(reason),
            ScanResult::JanusRejected => ScanResult::JanusRejected,
            ScanResult::Skipped => ScanResult::Skipped,
        }
    }

    // How far the enote got through the pipeline.
    fn progress(&self) -> u8 {
        match self {
            ScanResult::Skipped => 0,
            ScanResult::NotOwned(MismatchReason::ViewTag) => 1,
            ScanResult::NotOwned(_) => 2,
            ScanResult::JanusRejected => 3,
            ScanResult::Owned(_) => 4,
        }
    }
}

/// Sorts an internal failure into a scan outcome. Enote-caused failures are
/// values, everything else propagates.
fn classify<R>(result: Result<R>) -> Result<ScanResult<R>> {
    match result {
        Ok(r) => Ok(ScanResult::Owned(r)),
        Err(CarrotError::ScanMismatch(reason)) => Ok(ScanResult::NotOwned(reason)),
        Err(CarrotError::InvalidPoint(_)) | Err(CarrotError::InvalidKeySize { .. }) => {
            Ok(ScanResult::NotOwned(MismatchReason::InvalidPoint))
        }
        Err(CarrotError::DerivationDegenerate(_)) => {
            Ok(ScanResult::NotOwned(MismatchReason::Degenerate))
        }
        Err(CarrotError::JanusViolation) => Ok(ScanResult::JanusRejected),
        Err(e) => Err(e),
    }
}

fn mismatch(reason: MismatchReason) -> CarrotError {
    CarrotError::ScanMismatch(reason)
}

/// How the receiver recovers an enote's sender-receiver secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnoteOrigin {
    /// Key exchange with the view-incoming key.
    External,
    /// Key exchange, authenticated by the special Janus anchor.
    SpecialSelfSend,
    /// Keyed by the view-balance secret.
    Internal(SelfSendType),
    /// Coinbase output.
    Coinbase,
}

/// Sender-side onetime address extensions.
#[derive(Clone, Zeroize)]
pub enum SenderExtensions {
    /// `(k^o_g, k^o_t)` on `(G, T)`. Legacy enotes have `k^o_t = 0`.
    Dual {
        /// `G` component
        g: Scalar,
        /// `T` component
        t: Scalar,
    },
    /// Seraphis `(k^o_g, k^o_x, k^o_u)`.
    Triple(SeraphisExtensions),
}

impl Drop for SenderExtensions {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl std::fmt::Debug for SenderExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenderExtensions::Dual { .. } => write!(f, "SenderExtensions::Dual([REDACTED])"),
            SenderExtensions::Triple(_) => write!(f, "SenderExtensions::Triple([REDACTED])"),
        }
    }
}

/// What the view-incoming (or view-balance) level learns about an owned enote.
#[derive(Clone, Debug)]
pub struct IntermediateRecord {
    /// `Ko`
    pub onetime_address: OnetimeAddress,
    /// Cleartext amount.
    pub amount: u64,
    /// `k_a`, one for coinbase enotes.
    pub amount_blinding_factor: SecretScalar,
    /// Sender extensions of `Ko`.
    pub sender_extensions: SenderExtensions,
    /// Receiving subaddress and hierarchy.
    pub address_index: AddressIndexExtended,
    /// Payment id, null unless bound by the sender.
    pub payment_id: PaymentId,
    /// Payment or change.
    pub enote_type: EnoteType,
    /// How the secret was recovered.
    pub origin: EnoteOrigin,
}

/// An intermediate record plus its key image.
#[derive(Clone, Debug)]
pub struct FullRecord {
    /// Scan output.
    pub record: IntermediateRecord,
    /// Key image of the enote.
    pub key_image: KeyImage,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total enotes scanned
    pub total_scanned: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// Number of owned enotes found
    pub discoveries: u64,
    /// Enotes dropped by Janus protection
    pub janus_rejections: u64,
    /// Enotes no held device could scan
    pub skipped: u64,
    /// Number of errors during scanning
    pub errors: u64,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scan outcome.
    pub fn record<R>(&mut self, result: &Result<ScanResult<R>>) {
        self.total_scanned += 1;
        match result {
            Ok(ScanResult::Owned(_)) => {
                self.view_tag_matches += 1;
                self.discoveries += 1;
            }
            Ok(ScanResult::JanusRejected) => {
                self.view_tag_matches += 1;
                self.janus_rejections += 1;
            }
            Ok(ScanResult::NotOwned(MismatchReason::ViewTag)) => {}
            Ok(ScanResult::NotOwned(_)) => self.view_tag_matches += 1,
            Ok(ScanResult::Skipped) => self.skipped += 1,
            Err(_) => self.errors += 1,
        }
    }

    /// Adds another tracker's counts into this one.
    pub fn merge(&mut self, other: &ScanStats) {
        self.total_scanned += other.total_scanned;
        self.view_tag_matches += other.view_tag_matches;
        self.discoveries += other.discoveries;
        self.janus_rejections += other.janus_rejections;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }

    /// Returns the scan rate (enotes per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Returns the filter efficiency (percentage rejected by the view tag).
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            ((self.total_scanned - self.view_tag_matches) as f64 / self.total_scanned as f64)
                * 100.0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Hierarchies tried for Carrot-format enotes, in order.
const CANDIDATE_DERIVE_TYPES: [DeriveType; 2] = [DeriveType::Carrot, DeriveType::PreCarrot];

/// Scans enotes against one account.
#[derive(Debug, Clone, Copy)]
pub struct EnoteScanner<'a> {
    devices: &'a AccountDevices,
    legacy_table: Option<&'a LegacySubaddressTable>,
    split: ViewTagSplit,
}

impl<'a> EnoteScanner<'a> {
    /// Creates a scanner with the default view tag split.
    pub fn new(devices: &'a AccountDevices) -> Self {
        Self {
            devices,
            legacy_table: None,
            split: ViewTagSplit::default(),
        }
    }

    /// Enables legacy subaddress lookup. Without a table only the main
    /// legacy address is recognized.
    pub fn with_legacy_table(mut self, table: &'a LegacySubaddressTable) -> Self {
        self.legacy_table = Some(table);
        self
    }

    /// Overrides the view tag split.
    pub fn with_view_tag_split(mut self, split: ViewTagSplit) -> Self {
        self.split = split;
        self
    }

    /// The account being scanned for.
    pub fn devices(&self) -> &'a AccountDevices {
        self.devices
    }

    /// Scans any enote format.
    pub fn scan_enote(&self, enote: &EnoteVariant) -> Result<ScanResult<IntermediateRecord>> {
        match enote {
            EnoteVariant::Carrot(e) => self.scan_carrot(e),
            EnoteVariant::CarrotCoinbase(e) => self.scan_carrot_coinbase(e),
            EnoteVariant::Legacy(e) => self.scan_legacy(e),
            EnoteVariant::Seraphis(e) => self.scan_seraphis(e),
            EnoteVariant::SeraphisCoinbase(e) => self.scan_seraphis_coinbase(e),
        }
    }

    /// Scans an enote and, if owned, computes its key image.
    ///
    /// # Errors
    /// `CapabilityMissing` when the account cannot compute key images.
    #[instrument(skip_all, fields(kind = enote.kind()))]
    pub fn scan_enote_full(&self, enote: &EnoteVariant) -> Result<ScanResult<FullRecord>> {
        let record = match self.scan_enote(enote)? {
            ScanResult::Owned(record) => record,
            ScanResult::NotOwned(reason) => return Ok(ScanResult::NotOwned(reason)),
            ScanResult::JanusRejected => return Ok(ScanResult::JanusRejected),
            ScanResult::Skipped => return Ok(ScanResult::Skipped),
        };
        let hint = OpeningHint::from_record(enote, &record)?;
        let key_image = self.devices.derive_key_image(&hint)?;
        debug!(key_image = %key_image, "Derived key image for owned enote");
        Ok(ScanResult::Owned(FullRecord { record, key_image }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Carrot
    // ─────────────────────────────────────────────────────────────────────────

    fn candidate_derive_types(&self) -> impl Iterator<Item = DeriveType> + '_ {
        CANDIDATE_DERIVE_TYPES
            .into_iter()
            .filter(move |dt| self.devices.view_incoming(*dt).is_ok())
    }

    /// Scans a Carrot enote: internal path first when the account holds the
    /// view-balance secret, then key exchange under each held hierarchy.
    pub fn scan_carrot(&self, enote: &CarrotEnote) -> Result<ScanResult<IntermediateRecord>> {
        let input_context = enote.input_context();
        let mut best = ScanResult::Skipped;
        let mut any_device = false;

        if self.devices.view_balance().is_ok() {
            any_device = true;
            let result = classify(self.scan_carrot_internal(enote, &input_context))?;
            if result.is_owned() {
                return Ok(result);
            }
            best = keep_best(best, result);
        }

        for derive_type in self.candidate_derive_types() {
            any_device = true;
            let result =
                classify(self.scan_carrot_external(enote, derive_type, &input_context))?;
            if result.is_owned() {
                return Ok(result);
            }
            best = keep_best(best, result);
        }

        if !any_device {
            return Err(CarrotError::CapabilityMissing("view-incoming key"));
        }
        Ok(best)
    }

    fn check_view_tag(&self, expected: &ViewTag, actual: &ViewTag) -> Result<()> {
        if !self.split.matches_primary(expected, actual)
            || !self.split.matches_complementary(expected, actual)
        {
            return Err(mismatch(MismatchReason::ViewTag));
        }
        Ok(())
    }

    fn scan_carrot_external(
        &self,
        enote: &CarrotEnote,
        derive_type: DeriveType,
        input_context: &InputContext,
    ) -> Result<IntermediateRecord> {
        let address = self.devices.address();
        let ko = &enote.onetime_address;

        let ecdh = address.view_key_scalar_mult_x25519(derive_type, &enote.ephemeral_pubkey)?;
        self.check_view_tag(&compute_view_tag(&ecdh, input_context, ko), &enote.view_tag)?;
        trace!(derive_type = %derive_type, "View tag matched");

        let secret = make_sender_receiver_secret(&ecdh, &enote.ephemeral_pubkey, input_context);
        let tag = decrypt_address_tag(&enote.address_tag_enc, &secret, ko);
        let index = address
            .decrypt_address_tag(derive_type, &tag)?
            .unwrap_or(AddressIndex::MAIN);
        let resolved = address.resolve(&AddressIndexExtended::new(index, derive_type))?;

        let extensions = make_onetime_extensions(&secret, &enote.amount_commitment)?;
        let spend_point = resolved.spend_pubkey.decompress()?;
        if make_onetime_address(&spend_point, &extensions) != *ko {
            return Err(mismatch(MismatchReason::OnetimeAddress));
        }

        let amount = decrypt_amount(&enote.amount_enc, &secret, ko);
        let (enote_type, blinding_factor) = recover_amount_opening(
            &secret,
            amount,
            &resolved.spend_pubkey,
            &enote.amount_commitment,
            &EnoteType::ALL,
        )?;

        let anchor = decrypt_anchor(&enote.anchor_enc, &secret, ko);
        let claim = JanusClaim {
            ephemeral_pubkey: &enote.ephemeral_pubkey,
            input_context,
            onetime_address: ko,
            anchor: &anchor,
            address_spend_pubkey: &resolved.spend_pubkey,
            is_subaddress: !resolved.is_main(),
            payment_id: decrypt_payment_id(&enote.payment_id_enc, &secret, ko),
        };
        let view = self.devices.view_incoming(derive_type)?;
        let account_spend_pubkey = address.account_spend_pubkey(derive_type)?;
        let (payment_id, origin) = match verify_janus(&claim, Some((view, &account_spend_pubkey)))? {
            JanusOutcome::Normal { payment_id } => (payment_id, EnoteOrigin::External),
            JanusOutcome::Special => (PaymentId::NULL, EnoteOrigin::SpecialSelfSend),
            JanusOutcome::Rejected => return Err(CarrotError::JanusViolation),
        };

        debug!(
            onetime_address = %ko,
            index = %resolved.index.index,
            derive_type = %derive_type,
            ?origin,
            "Found owned carrot enote"
        );
        Ok(IntermediateRecord {
            onetime_address: *ko,
            amount,
            amount_blinding_factor: SecretScalar::new(blinding_factor),
            sender_extensions: SenderExtensions::Dual {
                g: extensions.g,
                t: extensions.t,
            },
            address_index: resolved.index,
            payment_id,
            enote_type,
            origin,
        })
    }

    fn scan_carrot_internal(
        &self,
        enote: &CarrotEnote,
        input_context: &InputContext,
    ) -> Result<IntermediateRecord> {
        let view_balance = self.devices.view_balance()?;
        let derive_type = view_balance.derive_type();
        let address = self.devices.address();
        let ko = &enote.onetime_address;

        let expected = view_balance.make_internal_view_tag(derive_type, input_context, ko)?;
        if !view_tags_match(&expected, &enote.view_tag) {
            return Err(mismatch(MismatchReason::ViewTag));
        }

        for self_send_type in SelfSendType::ALL {
            let secret = view_balance.make_internal_sender_receiver_secret(
                derive_type,
                self_send_type,
                &enote.ephemeral_pubkey,
                input_context,
            )?;
            let tag = decrypt_address_tag(&enote.address_tag_enc, &secret, ko);
            let Some(index) = address.decrypt_address_tag(derive_type, &tag)? else {
                continue;
            };
            let resolved = address.resolve(&AddressIndexExtended::new(index, derive_type))?;
            let extensions = make_onetime_extensions(&secret, &enote.amount_commitment)?;
            if make_onetime_address(&resolved.spend_pubkey.decompress()?, &extensions) != *ko {
                continue;
            }

            let amount = decrypt_amount(&enote.amount_enc, &secret, ko);
            let (enote_type, blinding_factor) = recover_amount_opening(
                &secret,
                amount,
                &resolved.spend_pubkey,
                &enote.amount_commitment,
                &[self_send_type.enote_type()],
            )?;

            debug!(onetime_address = %ko, ?self_send_type, "Found internal enote");
            return Ok(IntermediateRecord {
                onetime_address: *ko,
                amount,
                amount_blinding_factor: SecretScalar::new(blinding_factor),
                sender_extensions: SenderExtensions::Dual {
                    g: extensions.g,
                    t: extensions.t,
                },
                address_index: resolved.index,
                payment_id: PaymentId::NULL,
                enote_type,
                origin: EnoteOrigin::Internal(self_send_type),
            });
        }

        Err(mismatch(MismatchReason::OnetimeAddress))
    }

    /// Scans a Carrot coinbase enote against each held hierarchy's main address.
    pub fn scan_carrot_coinbase(
        &self,
        enote: &CarrotCoinbaseEnote,
    ) -> Result<ScanResult<IntermediateRecord>> {
        let mut best = None;
        for derive_type in self.candidate_derive_types() {
            let result = classify(self.scan_carrot_coinbase_for(enote, derive_type))?;
            if result.is_owned() {
                return Ok(result);
            }
            best = Some(keep_best(best.unwrap_or(ScanResult::Skipped), result));
        }
        best.ok_or(CarrotError::CapabilityMissing("view-incoming key"))
    }

    fn scan_carrot_coinbase_for(
        &self,
        enote: &CarrotCoinbaseEnote,
        derive_type: DeriveType,
    ) -> Result<IntermediateRecord> {
        let address = self.devices.address();
        let input_context = enote.input_context();
        let ko = &enote.onetime_address;

        let ecdh = address.view_key_scalar_mult_x25519(derive_type, &enote.ephemeral_pubkey)?;
        self.check_view_tag(&compute_view_tag(&ecdh, &input_context, ko), &enote.view_tag)?;

        let secret = make_sender_receiver_secret(&ecdh, &enote.ephemeral_pubkey, &input_context);
        let resolved = address.resolve(&AddressIndexExtended::new(AddressIndex::MAIN, derive_type))?;
        let commitment = AmountCommitment::from_point(&clear_commit(enote.amount));
        let extensions = make_onetime_extensions(&secret, &commitment)?;
        if make_onetime_address(&resolved.spend_pubkey.decompress()?, &extensions) != *ko {
            return Err(mismatch(MismatchReason::OnetimeAddress));
        }

        let anchor = decrypt_anchor(&enote.anchor_enc, &secret, ko);
        let claim = JanusClaim {
            ephemeral_pubkey: &enote.ephemeral_pubkey,
            input_context: &input_context,
            onetime_address: ko,
            anchor: &anchor,
            address_spend_pubkey: &resolved.spend_pubkey,
            is_subaddress: false,
            payment_id: PaymentId::NULL,
        };
        verify_janus(&claim, None)?.into_result()?;

        debug!(onetime_address = %ko, amount = enote.amount, "Found coinbase enote");
        Ok(IntermediateRecord {
            onetime_address: *ko,
            amount: enote.amount,
            amount_blinding_factor: SecretScalar::new(Scalar::ONE),
            sender_extensions: SenderExtensions::Dual {
                g: extensions.g,
                t: extensions.t,
            },
            address_index: resolved.index,
            payment_id: PaymentId::NULL,
            enote_type: EnoteType::Payment,
            origin: EnoteOrigin::Coinbase,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Legacy
    // ─────────────────────────────────────────────────────────────────────────

    /// Scans a pre-Carrot enote. Accounts without a legacy view key skip it.
    pub fn scan_legacy(&self, enote: &LegacyEnote) -> Result<ScanResult<IntermediateRecord>> {
        if self.devices.view_incoming(DeriveType::PreCarrot).is_err() {
            return Ok(ScanResult::Skipped);
        }
        classify(self.scan_legacy_inner(enote))
    }

    fn scan_legacy_inner(&self, enote: &LegacyEnote) -> Result<IntermediateRecord> {
        let view = self.devices.view_incoming(DeriveType::PreCarrot)?;
        let tx_point = enote.tx_pubkey.decompress()?;
        let shared = view.view_key_scalar_mult_ed25519(DeriveType::PreCarrot, &tx_point)?;
        let derivation = make_legacy_derivation(&shared);

        let expected = compute_legacy_view_tag(&derivation, enote.output_index);
        if !bool::from(expected.ct_eq(&enote.view_tag)) {
            return Err(mismatch(MismatchReason::ViewTag));
        }

        let k_o = make_legacy_onetime_extension(&derivation, enote.output_index)?;
        let ko_point = enote.onetime_address.decompress()?;
        let spend_pubkey =
            AddressSpendPubkey::from_point(&(ko_point - EdwardsPoint::mul_base(&k_o)));
        let index = self.lookup_legacy_subaddress(&spend_pubkey)?;

        let amount = decrypt_legacy_amount(&enote.amount_enc, &k_o);
        let z = make_legacy_commitment_mask(&k_o)?;
        if AmountCommitment::from_point(&commit(amount, &z)) != enote.amount_commitment {
            return Err(mismatch(MismatchReason::AmountCommitment));
        }

        debug!(onetime_address = %enote.onetime_address, index = %index, "Found legacy enote");
        Ok(IntermediateRecord {
            onetime_address: enote.onetime_address,
            amount,
            amount_blinding_factor: SecretScalar::new(z),
            sender_extensions: SenderExtensions::Dual {
                g: k_o,
                t: Scalar::ZERO,
            },
            address_index: AddressIndexExtended::new(index, DeriveType::PreCarrot),
            payment_id: PaymentId::NULL,
            enote_type: EnoteType::Payment,
            origin: EnoteOrigin::External,
        })
    }

    fn lookup_legacy_subaddress(&self, spend_pubkey: &AddressSpendPubkey) -> Result<AddressIndex> {
        let main = self
            .devices
            .address()
            .account_spend_pubkey(DeriveType::PreCarrot)?;
        if *spend_pubkey == main {
            return Ok(AddressIndex::MAIN);
        }
        self.legacy_table
            .and_then(|table| table.lookup(spend_pubkey))
            .ok_or_else(|| mismatch(MismatchReason::UnknownSubaddress))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Seraphis
    // ─────────────────────────────────────────────────────────────────────────

    /// Scans a Seraphis enote. Accounts without a Seraphis address device skip it.
    pub fn scan_seraphis(&self, enote: &SeraphisEnote) -> Result<ScanResult<IntermediateRecord>> {
        let Ok(device) = self.devices.seraphis_address() else {
            return Ok(ScanResult::Skipped);
        };
        classify(self.scan_seraphis_inner(
            device,
            SeraphisParts {
                onetime_address: &enote.onetime_address,
                ephemeral_pubkey: &enote.ephemeral_pubkey,
                view_tag: &enote.view_tag,
                anchor_enc: &enote.anchor_enc,
                input_context: enote.input_context(),
                payload: SeraphisPayload::Standard(enote),
            },
        ))
    }

    /// Scans a Seraphis coinbase enote.
    pub fn scan_seraphis_coinbase(
        &self,
        enote: &SeraphisCoinbaseEnote,
    ) -> Result<ScanResult<IntermediateRecord>> {
        let Ok(device) = self.devices.seraphis_address() else {
            return Ok(ScanResult::Skipped);
        };
        classify(self.scan_seraphis_inner(
            device,
            SeraphisParts {
                onetime_address: &enote.onetime_address,
                ephemeral_pubkey: &enote.ephemeral_pubkey,
                view_tag: &enote.view_tag,
                anchor_enc: &enote.anchor_enc,
                input_context: enote.input_context(),
                payload: SeraphisPayload::Coinbase(enote.amount),
            },
        ))
    }

    fn scan_seraphis_inner(
        &self,
        device: &SeraphisAddressDevice,
        parts: SeraphisParts<'_>,
    ) -> Result<IntermediateRecord> {
        let ko = parts.onetime_address;
        let view = device.view_incoming();
        let ecdh = view.view_key_scalar_mult_x25519(DeriveType::Carrot, parts.ephemeral_pubkey)?;
        self.check_view_tag(
            &compute_view_tag(&ecdh, &parts.input_context, ko),
            parts.view_tag,
        )?;
        let secret = make_sender_receiver_secret(&ecdh, parts.ephemeral_pubkey, &parts.input_context);

        let index = match parts.payload {
            SeraphisPayload::Standard(enote) => {
                let tag = decrypt_address_tag(&enote.address_tag_enc, &secret, ko);
                device.decrypt_address_tag(&tag).unwrap_or(AddressIndex::MAIN)
            }
            SeraphisPayload::Coinbase(_) => AddressIndex::MAIN,
        };
        let resolved = device.resolve(&index)?;

        let commitment = match parts.payload {
            SeraphisPayload::Standard(enote) => enote.amount_commitment,
            SeraphisPayload::Coinbase(amount) => {
                AmountCommitment::from_point(&clear_commit(amount))
            }
        };
        let sender = make_seraphis_sender_extensions(&secret, &commitment)?;
        let expected = resolved.spend_pubkey.decompress()? + sender.to_point();
        if OnetimeAddress::from_point(&expected) != *ko {
            return Err(mismatch(MismatchReason::OnetimeAddress));
        }

        let (amount, blinding_factor, enote_type) = match parts.payload {
            SeraphisPayload::Standard(enote) => {
                let amount = decrypt_amount(&enote.amount_enc, &secret, ko);
                let (enote_type, k_a) = recover_amount_opening(
                    &secret,
                    amount,
                    &resolved.spend_pubkey,
                    &commitment,
                    &[EnoteType::Payment],
                )?;
                (amount, k_a, enote_type)
            }
            SeraphisPayload::Coinbase(amount) => (amount, Scalar::ONE, EnoteType::Payment),
        };

        let anchor = decrypt_anchor(parts.anchor_enc, &secret, ko);
        let claim = JanusClaim {
            ephemeral_pubkey: parts.ephemeral_pubkey,
            input_context: &parts.input_context,
            onetime_address: ko,
            anchor: &anchor,
            address_spend_pubkey: &resolved.spend_pubkey,
            is_subaddress: !index.is_main(),
            payment_id: PaymentId::NULL,
        };
        verify_janus(&claim, None)?.into_result()?;

        let origin = match parts.payload {
            SeraphisPayload::Standard(_) => EnoteOrigin::External,
            SeraphisPayload::Coinbase(_) => EnoteOrigin::Coinbase,
        };
        debug!(onetime_address = %ko, index = %index, "Found seraphis enote");
        Ok(IntermediateRecord {
            onetime_address: *ko,
            amount,
            amount_blinding_factor: SecretScalar::new(blinding_factor),
            sender_extensions: SenderExtensions::Triple(sender),
            address_index: AddressIndexExtended::new(index, DeriveType::Carrot),
            payment_id: PaymentId::NULL,
            enote_type,
            origin,
        })
    }
}

/// Fields shared by both Seraphis enote kinds.
struct SeraphisParts<'e> {
    onetime_address: &'e OnetimeAddress,
    ephemeral_pubkey: &'e carrot_core::EnoteEphemeralPubkey,
    view_tag: &'e ViewTag,
    anchor_enc: &'e carrot_core::EncryptedJanusAnchor,
    input_context: InputContext,
    payload: SeraphisPayload<'e>,
}

#[derive(Clone, Copy)]
enum SeraphisPayload<'e> {
    Standard(&'e SeraphisEnote),
    Coinbase(u64),
}

/// Finds the enote type whose blinding factor opens `commitment`.
fn recover_amount_opening(
    secret: &SenderReceiverSecret,
    amount: u64,
    spend_pubkey: &AddressSpendPubkey,
    commitment: &AmountCommitment,
    enote_types: &[EnoteType],
) -> Result<(EnoteType, Scalar)> {
    for enote_type in enote_types {
        let blinding_factor = make_amount_blinding_factor(secret, amount, spend_pubkey, *enote_type)?;
        if AmountCommitment::from_point(&commit(amount, &blinding_factor)) == *commitment {
            return Ok((*enote_type, blinding_factor));
        }
    }
    Err(mismatch(MismatchReason::AmountCommitment))
}

fn keep_best<R>(current: ScanResult<R>, candidate: ScanResult<R>) -> ScanResult<R> {
    if candidate.progress() > current.progress() {
        candidate
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::*;
    use carrot_core::{JanusAnchor, MasterSecret};
    use carrot_keys::carrot::{make_generate_address_secret, make_view_incoming_key};
    use carrot_keys::{CarrotKeys, LegacyKeys};
    use proptest::prelude::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;
    use test_case::test_case;

    fn devices() -> AccountDevices {
        AccountDevices::from_master(&MasterSecret::from_array([0x61; 32])).unwrap()
    }

    fn l0() -> KeyImage {
        KeyImage::from_array([0x0f; 32])
    }

    fn destination(
        devices: &AccountDevices,
        index: AddressIndex,
        derive_type: DeriveType,
    ) -> carrot_core::Destination {
        devices
            .address()
            .make_destination(&AddressIndexExtended::new(index, derive_type))
            .unwrap()
    }

    fn owned(devices: &AccountDevices, enote: EnoteVariant) -> IntermediateRecord {
        EnoteScanner::new(devices)
            .scan_enote(&enote)
            .unwrap()
            .into_owned()
            .expect("enote should be owned")
    }

    #[test]
    fn test_main_address_round_trip() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::MAIN, DeriveType::Auto);
        let out = make_carrot_enote(&PaymentProposal::new(dest, 1_234), &l0()).unwrap();

        let record = owned(&devices, EnoteVariant::Carrot(out.enote));
        assert_eq!(record.amount, 1_234);
        assert_eq!(record.amount_blinding_factor, out.amount_blinding_factor);
        assert_eq!(record.address_index.index, AddressIndex::MAIN);
        assert_eq!(record.address_index.derive_type, DeriveType::Carrot);
        assert_eq!(record.payment_id, PaymentId::NULL);
        assert_eq!(record.enote_type, EnoteType::Payment);
        assert_eq!(record.origin, EnoteOrigin::External);
    }

    #[test]
    fn test_subaddress_round_trip() {
        let devices = devices();
        let index = AddressIndex::new(3, 17);
        let dest = destination(&devices, index, DeriveType::Auto);
        let out = make_carrot_enote(&PaymentProposal::new(dest, 9), &l0()).unwrap();
        let record = owned(&devices, EnoteVariant::Carrot(out.enote));
        assert_eq!(record.address_index.index, index);
    }

    #[test]
    fn test_integrated_address_payment_id() {
        let devices = devices();
        let pid = PaymentId::from_array([0x5a; 8]);
        let proposal = PaymentProposalBuilder::new()
            .destination(destination(&devices, AddressIndex::MAIN, DeriveType::Auto))
            .amount(50)
            .payment_id(pid)
            .build()
            .unwrap();
        let out = make_carrot_enote(&proposal, &l0()).unwrap();
        assert_eq!(owned(&devices, EnoteVariant::Carrot(out.enote)).payment_id, pid);
    }

    #[test]
    fn test_foreign_enote_not_owned() {
        let other = AccountDevices::from_master(&MasterSecret::from_array([0x62; 32])).unwrap();
        let dest = destination(&other, AddressIndex::new(0, 1), DeriveType::Auto);
        let out = make_carrot_enote(&PaymentProposal::new(dest, 9), &l0()).unwrap();
        let result = EnoteScanner::new(&devices())
            .scan_enote(&EnoteVariant::Carrot(out.enote))
            .unwrap();
        assert!(!result.is_owned());
        assert!(matches!(result.into_result(), Err(CarrotError::ScanMismatch(_))));
    }

    #[test]
    fn test_tampered_amount_rejected() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::new(0, 2), DeriveType::Auto);
        let mut enote = make_carrot_enote(&PaymentProposal::new(dest, 77), &l0())
            .unwrap()
            .enote;
        let mut bytes = enote.amount_enc.to_array();
        bytes[0] ^= 1;
        enote.amount_enc = carrot_core::EncryptedAmount::from_array(bytes);

        let result = EnoteScanner::new(&devices)
            .scan_enote(&EnoteVariant::Carrot(enote))
            .unwrap();
        assert!(matches!(result, ScanResult::NotOwned(MismatchReason::AmountCommitment)));
    }

    #[test]
    fn test_tampered_anchor_fails_janus() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::new(1, 1), DeriveType::Auto);
        let mut enote = make_carrot_enote(&PaymentProposal::new(dest, 77), &l0())
            .unwrap()
            .enote;
        let mut bytes = enote.anchor_enc.to_array();
        bytes[5] ^= 0x80;
        enote.anchor_enc = carrot_core::EncryptedJanusAnchor::from_array(bytes);

        let mut stats = ScanStats::new();
        let result = EnoteScanner::new(&devices).scan_enote(&EnoteVariant::Carrot(enote));
        stats.record(&result);
        assert!(matches!(result.unwrap(), ScanResult::JanusRejected));
        assert_eq!(stats.janus_rejections, 1);
        assert_eq!(stats.discoveries, 0);
    }

    #[test]
    fn test_self_sends_round_trip() {
        let devices = devices();
        let ephemeral = random_ephemeral_pubkey();

        let special = make_special_self_send_enote(
            &SelfSendProposal::change(40),
            &devices,
            &ephemeral,
            &l0(),
        )
        .unwrap();
        let record = owned(&devices, EnoteVariant::Carrot(special.enote));
        assert_eq!(record.origin, EnoteOrigin::SpecialSelfSend);
        assert_eq!(record.enote_type, EnoteType::Change);

        let proposal = SelfSendProposal {
            index: AddressIndexExtended::new(AddressIndex::new(0, 3), DeriveType::Carrot),
            amount: 41,
            self_send_type: SelfSendType::SelfSpend,
        };
        let internal = make_internal_self_send_enote(&proposal, &devices, &ephemeral, &l0()).unwrap();
        let record = owned(&devices, EnoteVariant::Carrot(internal.enote));
        assert_eq!(record.origin, EnoteOrigin::Internal(SelfSendType::SelfSpend));
        assert_eq!(record.address_index.index, AddressIndex::new(0, 3));
        assert_eq!(record.amount, 41);
    }

    #[test]
    fn test_view_incoming_wallet_misses_internal_enotes() {
        let full_keys = CarrotKeys::from_master(&MasterSecret::from_array([0x61; 32])).unwrap();
        let full = AccountDevices::from_carrot(&full_keys).unwrap();
        let view_balance = full_keys.view_balance_secret().unwrap();
        let view_only = AccountDevices::from_carrot(
            &CarrotKeys::from_view_incoming(
                make_view_incoming_key(view_balance).unwrap(),
                make_generate_address_secret(view_balance),
                full_keys.spend_pubkey(),
            )
            .unwrap(),
        )
        .unwrap();

        let payment = PaymentProposal::new(
            destination(&full, AddressIndex::new(0, 1), DeriveType::Auto),
            5,
        );
        let (paid, change) =
            make_two_out_transaction_enotes(&payment, &SelfSendProposal::change(6), &l0(), &full)
                .unwrap();

        assert_eq!(owned(&view_only, EnoteVariant::Carrot(paid.enote)).amount, 5);
        let missed = EnoteScanner::new(&view_only)
            .scan_enote(&EnoteVariant::Carrot(change.enote))
            .unwrap();
        assert!(!missed.is_owned());
        assert_eq!(owned(&full, EnoteVariant::Carrot(change.enote)).amount, 6);
    }

    #[test]
    fn test_coinbase_round_trip() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::MAIN, DeriveType::Auto);
        let enote = make_coinbase_enote(&PaymentProposal::new(dest, 600_000), 1_000).unwrap();
        let record = owned(&devices, EnoteVariant::CarrotCoinbase(enote));
        assert_eq!(record.origin, EnoteOrigin::Coinbase);
        assert_eq!(record.amount, 600_000);
        assert_eq!(*record.amount_blinding_factor.expose(), Scalar::ONE);
    }

    #[test]
    fn test_legacy_subaddress_needs_table() {
        let keys = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(31u64))).unwrap();
        let devices = AccountDevices::from_legacy(&keys).unwrap();
        let index = AddressIndex::new(0, 4);
        let dest = destination(&devices, index, DeriveType::PreCarrot);
        let out = make_legacy_enote(
            &PaymentProposal::new(dest, 88),
            &InputContext::ringct(&l0()),
            2,
        )
        .unwrap();
        let enote = EnoteVariant::Legacy(out.enote);

        let without = EnoteScanner::new(&devices).scan_enote(&enote).unwrap();
        assert!(matches!(without, ScanResult::NotOwned(MismatchReason::UnknownSubaddress)));

        let table = LegacySubaddressTable::generate(devices.address(), 1, 8).unwrap();
        let record = EnoteScanner::new(&devices)
            .with_legacy_table(&table)
            .scan_enote(&enote)
            .unwrap()
            .into_owned()
            .unwrap();
        assert_eq!(record.address_index.index, index);
        assert_eq!(record.amount, 88);
    }

    #[test]
    fn test_carrot_account_skips_legacy_enotes() {
        let legacy = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(31u64))).unwrap();
        let legacy_devices = AccountDevices::from_legacy(&legacy).unwrap();
        let dest = destination(&legacy_devices, AddressIndex::MAIN, DeriveType::PreCarrot);
        let out = make_legacy_enote(&PaymentProposal::new(dest, 1), &InputContext::ringct(&l0()), 0)
            .unwrap();
        let result = EnoteScanner::new(&devices())
            .scan_enote(&EnoteVariant::Legacy(out.enote))
            .unwrap();
        assert!(matches!(result, ScanResult::Skipped));
    }

    #[test]
    fn test_hybrid_account_scans_both_hierarchies() {
        let legacy = LegacyKeys::from_spend_key(SecretScalar::new(Scalar::from(77u64))).unwrap();
        let carrot = CarrotKeys::from_master(&MasterSecret::from_array([0x63; 32])).unwrap();
        let devices = AccountDevices::hybrid(&legacy, &carrot).unwrap();

        for derive_type in [DeriveType::PreCarrot, DeriveType::Carrot] {
            let dest = destination(&devices, AddressIndex::new(0, 6), derive_type);
            let out = make_carrot_enote(&PaymentProposal::new(dest, 3), &l0()).unwrap();
            let record = owned(&devices, EnoteVariant::Carrot(out.enote));
            assert_eq!(record.address_index.derive_type, derive_type);
        }
    }

    #[test]
    fn test_seraphis_round_trip() {
        let devices = devices();
        let seraphis = devices.seraphis_address().unwrap();
        let dest = seraphis.make_destination(&AddressIndex::new(2, 2)).unwrap();
        let out = make_seraphis_enote(&PaymentProposal::new(dest, 13), &l0()).unwrap();
        let record = owned(&devices, EnoteVariant::Seraphis(out.enote));
        assert_eq!(record.address_index.index, AddressIndex::new(2, 2));
        assert!(matches!(record.sender_extensions, SenderExtensions::Triple(_)));

        let main = seraphis.make_destination(&AddressIndex::MAIN).unwrap();
        let coinbase = make_seraphis_coinbase_enote(&PaymentProposal::new(main, 70), 5).unwrap();
        assert_eq!(owned(&devices, EnoteVariant::SeraphisCoinbase(coinbase)).amount, 70);
    }

    #[test]
    fn test_narrow_view_tag_split_still_finds_enote() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::new(0, 9), DeriveType::Auto);
        let out = make_carrot_enote(
            &PaymentProposal::new(dest, 2).with_randomness(JanusAnchor::from_array([8; 16])),
            &l0(),
        )
        .unwrap();
        let scanner = EnoteScanner::new(&devices).with_view_tag_split(ViewTagSplit::new(4).unwrap());
        assert!(scanner.scan_enote(&EnoteVariant::Carrot(out.enote)).unwrap().is_owned());
    }

    #[test]
    fn test_scan_full_includes_key_image() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::new(0, 1), DeriveType::Auto);
        let out = make_carrot_enote(&PaymentProposal::new(dest, 21), &l0()).unwrap();
        let enote = EnoteVariant::Carrot(out.enote);
        let full = EnoteScanner::new(&devices)
            .scan_enote_full(&enote)
            .unwrap()
            .into_owned()
            .unwrap();
        let hint = OpeningHint::from_record(&enote, &full.record).unwrap();
        assert_eq!(full.key_image, devices.derive_key_image(&hint).unwrap());
    }

    #[test]
    fn test_stats_efficiency() {
        let mut stats = ScanStats::new();
        for _ in 0..3 {
            stats.record::<()>(&Ok(ScanResult::NotOwned(MismatchReason::ViewTag)));
        }
        stats.record::<()>(&Ok(ScanResult::Owned(())));
        stats.duration_ms = 2;
        assert_eq!(stats.filter_efficiency(), 75.0);
        assert_eq!(stats.rate(), 2000.0);
    }

    #[test_case(SelfSendType::Change, EnoteType::Change ; "change")]
    #[test_case(SelfSendType::SelfSpend, EnoteType::Payment ; "self spend")]
    fn test_special_self_send_enote_type(self_send_type: SelfSendType, expected: EnoteType) {
        let devices = devices();
        let proposal = SelfSendProposal {
            index: AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::Carrot),
            amount: 12,
            self_send_type,
        };
        let out = make_special_self_send_enote(
            &proposal,
            &devices,
            &random_ephemeral_pubkey(),
            &l0(),
        )
        .unwrap();
        let record = owned(&devices, EnoteVariant::Carrot(out.enote));
        assert_eq!(record.enote_type, expected);
        assert_eq!(record.origin, EnoteOrigin::SpecialSelfSend);
    }

    #[test]
    fn test_seeded_anchors_give_distinct_enotes() {
        let devices = devices();
        let dest = destination(&devices, AddressIndex::new(0, 4), DeriveType::Auto);
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..8 {
            let mut anchor = [0u8; 16];
            rng.fill_bytes(&mut anchor);
            let proposal =
                PaymentProposal::new(dest, 3).with_randomness(JanusAnchor::from_array(anchor));
            let out = make_carrot_enote(&proposal, &l0()).unwrap();
            assert!(seen.insert(out.enote.onetime_address));
            assert_eq!(owned(&devices, EnoteVariant::Carrot(out.enote)).amount, 3);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_payment_round_trip(major in 0u32..4, minor in 0u32..64, amount in any::<u64>()) {
            let devices = devices();
            let index = AddressIndex::new(major, minor);
            let dest = destination(&devices, index, DeriveType::Auto);
            let out = make_carrot_enote(&PaymentProposal::new(dest, amount), &l0()).unwrap();
            let enote = EnoteVariant::Carrot(out.enote);

            let full = EnoteScanner::new(&devices)
                .scan_enote_full(&enote)
                .unwrap()
                .into_owned()
                .unwrap();
            prop_assert_eq!(full.record.amount, amount);
            prop_assert_eq!(full.record.address_index.index, index);

            let hint = OpeningHint::from_record(&enote, &full.record).unwrap();
            prop_assert_eq!(full.key_image, devices.derive_key_image(&hint).unwrap());
        }
    }
}
