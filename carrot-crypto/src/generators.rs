//! Fixed group generators.
//!
//! - `G`: the ed25519 basepoint
//! - `H`: Pedersen amount generator, as published by `monero-ed25519`
//! - `T`: second spend generator of Carrot keys (`K_s = k_gi G + k_ps T`),
//!   the FCMP++ `T`
//! - `X`, `U`: Seraphis spend generators, [`hash_to_point`] of `keccak(label)`

use std::sync::OnceLock;

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use monero_ed25519::CompressedPoint;

use carrot_core::constants::{SERAPHIS_GENERATOR_U_LABEL, SERAPHIS_GENERATOR_X_LABEL};

use crate::hash::{hash_to_point, keccak256};

/// Compressed `H`.
pub const H_BYTES: [u8; 32] = [
    0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf, 0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0, 0xea,
    0x6c, 0x72, 0x51, 0xd5, 0x41, 0x54, 0xcf, 0xa9, 0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c, 0x1f, 0x94,
];

/// Compressed `T`.
pub const T_BYTES: [u8; 32] = [
    0x61, 0xb7, 0x36, 0xce, 0x93, 0xb6, 0x2a, 0x3d, 0x37, 0x78, 0xab, 0x20, 0x4d, 0xa8, 0x5d, 0x3b,
    0x4c, 0xdc, 0x07, 0x25, 0x0f, 0x5d, 0xa7, 0xe3, 0xdf, 0x26, 0x29, 0x92, 0x81, 0x34, 0xd5, 0x26,
];

/// Decompresses a hardcoded generator. Both constants are pinned by tests.
fn decompress_constant(bytes: [u8; 32]) -> EdwardsPoint {
    CompressedEdwardsY(bytes)
        .decompress()
        .unwrap_or(ED25519_BASEPOINT_POINT)
}

/// `G`
pub fn generator_g() -> &'static EdwardsPoint {
    &ED25519_BASEPOINT_POINT
}

/// `H`
pub fn generator_h() -> &'static EdwardsPoint {
    static H: OnceLock<EdwardsPoint> = OnceLock::new();
    H.get_or_init(|| match CompressedPoint::H.decompress() {
        Some(point) => point.into(),
        None => decompress_constant(H_BYTES),
    })
}

/// `T`
pub fn generator_t() -> &'static EdwardsPoint {
    static T: OnceLock<EdwardsPoint> = OnceLock::new();
    T.get_or_init(|| decompress_constant(T_BYTES))
}

/// `X`
pub fn generator_x() -> &'static EdwardsPoint {
    static X: OnceLock<EdwardsPoint> = OnceLock::new();
    X.get_or_init(|| hash_to_point(&keccak256(SERAPHIS_GENERATOR_X_LABEL)))
}

/// `U`
pub fn generator_u() -> &'static EdwardsPoint {
    static U: OnceLock<EdwardsPoint> = OnceLock::new();
    U.get_or_init(|| hash_to_point(&keccak256(SERAPHIS_GENERATOR_U_LABEL)))
}
