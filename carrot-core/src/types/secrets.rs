//! 32-byte symmetric secrets of the key hierarchy and of the enote exchange.
//!
//! Every type here is wiped when dropped and never prints its content.

use crate::constants::SECRET_SIZE;

define_secret_type! {
    /// `s_m`: Carrot account master secret.
    MasterSecret, SECRET_SIZE
}

define_secret_type! {
    /// `s_vb`: view-balance secret. Sees every enote, cannot spend.
    ViewBalanceSecret, SECRET_SIZE
}

define_secret_type! {
    /// `s_ga`: generate-address secret. Issues addresses, cannot scan.
    GenerateAddressSecret, SECRET_SIZE
}

define_secret_type! {
    /// `s_ct`: key of the address tag block cipher.
    CipherTagSecret, SECRET_SIZE
}

define_secret_type! {
    /// `s^j_gen`: per-index address generator.
    AddressIndexGenerator, SECRET_SIZE
}

define_secret_type! {
    /// `s_sr'`: uncontextualized X25519 exchange result.
    EcdhSecret, SECRET_SIZE
}

define_secret_type! {
    /// `s_sr`: contextualized sender-receiver secret.
    SenderReceiverSecret, SECRET_SIZE
}
