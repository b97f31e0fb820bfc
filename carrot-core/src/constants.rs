//! Protocol constants for Carrot.
//!
//! Byte sizes are fixed by the on-chain formats. Domain separators are the
//! ASCII strings hashed in front of every transcript; two different operations
//! never share one.

// ═══════════════════════════════════════════════════════════════════════════════
// GROUP ELEMENT SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a compressed edwards25519 point or a canonical scalar.
pub const POINT_SIZE: usize = 32;

/// Size of a scalar encoding.
pub const SCALAR_SIZE: usize = 32;

/// Size of every 32-byte symmetric secret (master, view-balance, sender-receiver...).
pub const SECRET_SIZE: usize = 32;

/// Size of a key image.
pub const KEY_IMAGE_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// ENOTE FIELD SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an encoded address index: major (4) + minor (4) + zero padding (8).
pub const ADDRESS_INDEX_SIZE: usize = 16;

/// Size of an address tag and of its encrypted form.
pub const ADDRESS_TAG_SIZE: usize = 16;

/// Size of a Carrot view tag.
pub const VIEW_TAG_SIZE: usize = 3;

/// Number of bits carried by a Carrot view tag.
pub const VIEW_TAG_BITS: u32 = (VIEW_TAG_SIZE * 8) as u32;

/// Default number of view tag bits checked by the primary filter.
/// The remaining bits form the complementary filter.
pub const DEFAULT_VIEW_TAG_PRIMARY_BITS: u32 = 8;

/// Size of an encrypted amount.
pub const ENCRYPTED_AMOUNT_SIZE: usize = 8;

/// Size of a payment id and of its encrypted form.
pub const PAYMENT_ID_SIZE: usize = 8;

/// Size of a Janus anchor and of its encrypted form.
pub const JANUS_ANCHOR_SIZE: usize = 16;

/// Size of an input context: 1-byte kind tag + 32-byte context.
pub const INPUT_CONTEXT_SIZE: usize = 1 + 32;

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT CONTEXT KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Input context tag for coinbase transactions, followed by the block index.
pub const INPUT_CONTEXT_COINBASE: u8 = b'C';

/// Input context tag for standard transactions, followed by the first key image.
pub const INPUT_CONTEXT_RINGCT: u8 = b'R';

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS: ACCOUNT SECRETS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_ps = H_n[s_m]()`
pub const DOMAIN_PROVE_SPEND_KEY: &[u8] = b"Carrot prove-spend key";

/// `s_vb = H_32[s_m]()`
pub const DOMAIN_VIEW_BALANCE_SECRET: &[u8] = b"Carrot view-balance secret";

/// `k_gi = H_n[s_vb]()`
pub const DOMAIN_GENERATE_IMAGE_KEY: &[u8] = b"Carrot generate-image key";

/// `k_vi = H_n[s_vb]()`
pub const DOMAIN_INCOMING_VIEW_KEY: &[u8] = b"Carrot incoming view key";

/// `s_ga = H_32[s_vb]()`
pub const DOMAIN_GENERATE_ADDRESS_SECRET: &[u8] = b"Carrot generate-address secret";

/// `s_ct = H_32[s_ga]()`, key of the address tag cipher.
pub const DOMAIN_CIPHER_TAG_SECRET: &[u8] = b"Carrot cipher tag secret";

/// `s_ct = H_32[k_v]()` for legacy accounts receiving Carrot enotes.
pub const DOMAIN_LEGACY_CIPHER_TAG_SECRET: &[u8] = b"Carrot legacy cipher tag secret";

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS: ADDRESSES
// ═══════════════════════════════════════════════════════════════════════════════

/// `s^j_gen = H_32[s_ga](j_major, j_minor)`
pub const DOMAIN_ADDRESS_INDEX_GEN: &[u8] = b"Carrot address index generator";

/// `k^j_subscal = H_n[s^j_gen](K_s, j_major, j_minor)`
pub const DOMAIN_SUBADDRESS_SCALAR: &[u8] = b"Carrot subaddress scalar";

/// Legacy subaddress extension prefix, hashed with Keccak (NUL terminated).
pub const LEGACY_SUBADDRESS_PREFIX: &[u8] = b"SubAddr\0";

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS: ENOTES
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_a = H_n[s_sr](a, K^j_s, enote_type)`
pub const DOMAIN_AMOUNT_BLINDING_FACTOR: &[u8] = b"Carrot commitment mask";

/// `k^o_g = H_n[s_sr](C_a)`
pub const DOMAIN_ONETIME_EXTENSION_G: &[u8] = b"Carrot key extension G";

/// `k^o_t = H_n[s_sr](C_a)`
pub const DOMAIN_ONETIME_EXTENSION_T: &[u8] = b"Carrot key extension T";

/// `m_anchor = H_16[s_sr](Ko)`
pub const DOMAIN_ENCRYPTION_MASK_ANCHOR: &[u8] = b"Carrot encryption mask anchor";

/// `m_a = H_8[s_sr](Ko)`
pub const DOMAIN_ENCRYPTION_MASK_AMOUNT: &[u8] = b"Carrot encryption mask a";

/// `m_pid = H_8[s_sr](Ko)`
pub const DOMAIN_ENCRYPTION_MASK_PAYMENT_ID: &[u8] = b"Carrot encryption mask pid";

/// `m_tag = H_16[s_sr](Ko)`
pub const DOMAIN_ENCRYPTION_MASK_ADDRESS_TAG: &[u8] = b"Carrot encryption mask address tag";

/// `anchor_sp = H_16[k_v](D_e, input_context, Ko, K_s)`
pub const DOMAIN_JANUS_ANCHOR_SPECIAL: &[u8] = b"Carrot janus anchor special";

/// `d_e = H_n(anchor, input_context, K^j_s, pid)`
pub const DOMAIN_EPHEMERAL_PRIVKEY: &[u8] = b"Carrot sending key normal";

/// `vt = H_3[s_sr'](input_context, Ko)`
pub const DOMAIN_VIEW_TAG: &[u8] = b"Carrot view tag";

/// `s_sr = H_32[s_sr'](D_e, input_context)`
pub const DOMAIN_SENDER_RECEIVER_SECRET: &[u8] = b"Carrot sender-receiver secret";

/// Internal self-send secret for change outputs.
pub const DOMAIN_INTERNAL_SECRET_CHANGE: &[u8] = b"Carrot internal secret change";

/// Internal self-send secret for self-spend outputs.
pub const DOMAIN_INTERNAL_SECRET_SELF_SPEND: &[u8] = b"Carrot internal secret self-spend";

/// `vt = H_3[s_vb](input_context, Ko)` for internal self-sends.
pub const DOMAIN_INTERNAL_VIEW_TAG: &[u8] = b"Carrot internal view tag";

/// `r = H_n(anchor, input_context, K^j_s)` for legacy-format enotes.
pub const DOMAIN_LEGACY_EPHEMERAL_PRIVKEY: &[u8] = b"Carrot legacy sending key";

/// Legacy view tag prefix, hashed with Keccak.
pub const LEGACY_VIEW_TAG_PREFIX: &[u8] = b"view_tag";

/// Legacy amount mask prefix, hashed with Keccak.
pub const LEGACY_AMOUNT_PREFIX: &[u8] = b"amount";

/// Legacy commitment mask prefix, hashed with Keccak.
pub const LEGACY_COMMITMENT_MASK_PREFIX: &[u8] = b"commitment_mask";

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS: SERAPHIS
// ═══════════════════════════════════════════════════════════════════════════════

/// `k_vb = H_n[s_vb]()`
pub const DOMAIN_SERAPHIS_VIEW_BALANCE_KEY: &[u8] = b"Seraphis view-balance key";

/// `k_m = H_n[s_m]()`
pub const DOMAIN_SERAPHIS_MASTER_KEY: &[u8] = b"Seraphis master key";

/// Address extension on `G`.
pub const DOMAIN_SERAPHIS_ADDRESS_EXTENSION_G: &[u8] = b"Seraphis address extension g";

/// Address extension on `X`.
pub const DOMAIN_SERAPHIS_ADDRESS_EXTENSION_X: &[u8] = b"Seraphis address extension x";

/// Address extension on `U`.
pub const DOMAIN_SERAPHIS_ADDRESS_EXTENSION_U: &[u8] = b"Seraphis address extension u";

/// Sender extension on `G`.
pub const DOMAIN_SERAPHIS_SENDER_EXTENSION_G: &[u8] = b"Seraphis sender extension g";

/// Sender extension on `X`.
pub const DOMAIN_SERAPHIS_SENDER_EXTENSION_X: &[u8] = b"Seraphis sender extension x";

/// Sender extension on `U`.
pub const DOMAIN_SERAPHIS_SENDER_EXTENSION_U: &[u8] = b"Seraphis sender extension u";

/// Hash-to-point label of generator `X`.
pub const SERAPHIS_GENERATOR_X_LABEL: &[u8] = b"Seraphis generator X";

/// Hash-to-point label of generator `U`.
pub const SERAPHIS_GENERATOR_U_LABEL: &[u8] = b"Seraphis generator U";

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNING DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of enotes per scan batch.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 256;

/// Default legacy subaddress lookahead (majors x minors).
pub const DEFAULT_LEGACY_LOOKAHEAD: (u32, u32) = (2, 50);
