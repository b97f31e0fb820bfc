//! Address tag cipher.
//!
//! An address tag is the single-block AES-256 encryption of the 16-byte
//! [`AddressIndex`] encoding under the cipher-tag secret `s_ct`:
//!
//! ```text
//! tag = AES-256-Enc[s_ct](major_le || minor_le || 0^8)
//! ```
//!
//! For a fixed key this is a bijection. Deciphering only yields an index when
//! the 8 padding bytes come back as zero, so a random or foreign tag is
//! rejected with probability `1 - 2^-64`.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes256, Block};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use carrot_core::{AddressIndex, AddressTag, CipherTagSecret, ADDRESS_INDEX_SIZE};

/// AES-256 keyed by a cipher-tag secret.
pub struct AddressTagCipher {
    cipher: Aes256,
}

impl AddressTagCipher {
    /// Expands the key schedule for `s_ct`.
    pub fn new(secret: &CipherTagSecret) -> Self {
        Self {
            cipher: Aes256::new(GenericArray::from_slice(secret.as_bytes())),
        }
    }

    /// Encrypts an address index into its tag.
    pub fn encrypt(&self, index: &AddressIndex) -> AddressTag {
        let mut block = Block::from(index.to_bytes());
        self.cipher.encrypt_block(&mut block);

        let mut out = [0u8; ADDRESS_INDEX_SIZE];
        out.copy_from_slice(&block);
        AddressTag::from_array(out)
    }

    /// Decrypts a tag. Returns `None` unless the padding is zero.
    pub fn decrypt(&self, tag: &AddressTag) -> Option<AddressIndex> {
        let mut block = Block::from(tag.to_array());
        self.cipher.decrypt_block(&mut block);

        let mut plain = [0u8; ADDRESS_INDEX_SIZE];
        plain.copy_from_slice(&block);

        let padding_ok: bool = plain[8..].ct_eq(&[0u8; 8]).into();
        let index = if padding_ok {
            AddressIndex::from_bytes(&plain).ok()
        } else {
            None
        };
        plain.zeroize();
        index
    }
}

impl std::fmt::Debug for AddressTagCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AddressTagCipher([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cipher(byte: u8) -> AddressTagCipher {
        AddressTagCipher::new(&CipherTagSecret::from_array([byte; 32]))
    }

    #[test]
    fn test_roundtrip_main_and_sub() {
        let c = cipher(7);
        for index in [AddressIndex::MAIN, AddressIndex::new(5, 16), AddressIndex::new(u32::MAX, 1)] {
            assert_eq!(c.decrypt(&c.encrypt(&index)), Some(index));
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let tag = cipher(1).encrypt(&AddressIndex::new(3, 4));
        assert_eq!(cipher(2).decrypt(&tag), None);
    }

    #[test]
    fn test_tags_are_distinct() {
        let c = cipher(9);
        assert_ne!(
            c.encrypt(&AddressIndex::new(0, 1)),
            c.encrypt(&AddressIndex::new(1, 0))
        );
    }

    proptest! {
        #[test]
        fn prop_cipher_roundtrip(key in any::<[u8; 32]>(), major in any::<u32>(), minor in any::<u32>()) {
            let c = AddressTagCipher::new(&CipherTagSecret::from_array(key));
            let index = AddressIndex::new(major, minor);
            prop_assert_eq!(c.decrypt(&c.encrypt(&index)), Some(index));
        }
    }
}
