//! Domain types for Carrot.
//!
//! - [`bytes`]: fixed-size public byte values (points, tags, encrypted fields)
//! - [`secrets`]: 32-byte symmetric secrets, zeroized on drop
//! - [`index`]: address indices, derive types and enote kinds
//! - [`destination`]: what a sender pays to
//! - [`enote`]: on-chain enote formats and ledger records

#[macro_use]
mod macros;

mod bytes;
mod destination;
mod enote;
mod index;
mod secrets;

pub use bytes::*;
pub use destination::*;
pub use enote::*;
pub use index::*;
pub use secrets::*;
