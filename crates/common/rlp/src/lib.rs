//! Recursive-length-prefix encoding, scoped to what contract-address
//! derivation needs: integers, fixed-width hashes/addresses, byte strings and
//! list framing. The decoder exists so encodings can be checked against a real
//! parser rather than by eyeballing bytes.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
