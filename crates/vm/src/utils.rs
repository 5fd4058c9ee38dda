use ember_rlp::structs::Encoder;
use ethereum_types::{Address, U256};
use keccak_hash::keccak;

use crate::errors::ExceptionalHalt;

/// Truncates a word to its low 160 bits.
pub fn word_to_address(word: U256) -> Address {
    Address::from_slice(&word.to_big_endian()[12..])
}

pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

/// Splits a word into its (high, low) 128-bit halves.
pub fn word_to_halves(word: U256) -> (u128, u128) {
    ((word >> 128usize).low_u128(), word.low_u128())
}

pub fn word_from_halves(high: u128, low: u128) -> U256 {
    (U256::from(high) << 128usize) | U256::from(low)
}

pub fn u256_to_usize(value: U256) -> Result<usize, ExceptionalHalt> {
    value
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)
}

/// Converts a (size, offset) operand pair. A zero size short-circuits to
/// `(0, 0)` since the offset of an empty access is never dereferenced.
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), ExceptionalHalt> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    Ok((u256_to_usize(size)?, u256_to_usize(offset)?))
}

/// CREATE address: `keccak(rlp([sender, nonce]))[12..]`.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    let mut buf = Vec::new();
    Encoder::new(&mut buf)
        .encode_field(&sender)
        .encode_field(&nonce)
        .finish();
    Address::from_slice(&keccak(&buf).as_bytes()[12..])
}

/// CREATE2 address: `keccak(0xff ∥ sender ∥ salt ∥ keccak(init_code))[12..]`.
pub fn calculate_create2_address(sender: Address, init_code: &[u8], salt: U256) -> Address {
    let init_code_hash = keccak(init_code);
    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(&salt.to_big_endian());
    preimage.extend_from_slice(init_code_hash.as_bytes());
    Address::from_slice(&keccak(&preimage).as_bytes()[12..])
}
