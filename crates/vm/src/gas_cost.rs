//! Gas costs of the instructions the engine dispatches.

use crate::{
    constants::WORD_SIZE_IN_BYTES_U64,
    errors::{ExceptionalHalt, VMError},
    memory,
};
use ExceptionalHalt::OutOfGas;

// Baseline opcodes
pub const POP: u64 = 2;
pub const PUSH0: u64 = 2;
pub const PUSHN: u64 = 3;
pub const JUMPDEST: u64 = 1;
pub const GAS: u64 = 2;
pub const NUMBER: u64 = 2;
pub const TIMESTAMP: u64 = 2;
pub const MLOAD_STATIC: u64 = 3;
pub const MSTORE_STATIC: u64 = 3;
pub const MSTORE8_STATIC: u64 = 3;
pub const SLOAD: u64 = 100;
pub const SSTORE: u64 = 100;

// Logging
pub const LOGN_STATIC: u64 = 375;
pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;

// System operations
pub const SELFDESTRUCT_STATIC: u64 = 5000;
pub const INIT_CODE_WORD_COST: u64 = 2;
pub const KECCAK256_WORD_COST: u64 = 6;
pub const CODE_DEPOSIT_COST: u64 = 200;

pub fn mload(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    mem_expansion_behavior(new_memory_size, current_memory_size, MLOAD_STATIC)
}

pub fn mstore(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    mem_expansion_behavior(new_memory_size, current_memory_size, MSTORE_STATIC)
}

pub fn mstore8(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    mem_expansion_behavior(new_memory_size, current_memory_size, MSTORE8_STATIC)
}

// Used by RETURN and REVERT.
pub fn exit_opcode(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory::expansion_cost(new_memory_size, current_memory_size)
}

/// Memory-expansion share of a call-family opcode; the forwarded gas is
/// reserved separately once the cap is known.
pub fn call(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory::expansion_cost(new_memory_size, current_memory_size)
}

pub fn log(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    number_of_topics: usize,
) -> Result<u64, VMError> {
    let memory_expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;

    let topics_cost = LOGN_DYNAMIC_BASE
        .checked_mul(number_of_topics as u64)
        .ok_or(OutOfGas)?;
    let size: u64 = size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let bytes_cost = LOGN_DYNAMIC_BYTE_BASE.checked_mul(size).ok_or(OutOfGas)?;

    topics_cost
        .checked_add(LOGN_STATIC)
        .ok_or(OutOfGas)?
        .checked_add(bytes_cost)
        .ok_or(OutOfGas)?
        .checked_add(memory_expansion_cost)
        .ok_or(OutOfGas.into())
}

pub fn create(
    new_memory_size: usize,
    current_memory_size: usize,
    code_size: usize,
) -> Result<u64, VMError> {
    let memory_expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;
    let init_code_cost = INIT_CODE_WORD_COST
        .checked_mul(word_count(code_size)?)
        .ok_or(OutOfGas)?;

    memory_expansion_cost
        .checked_add(init_code_cost)
        .ok_or(OutOfGas.into())
}

pub fn create_2(
    new_memory_size: usize,
    current_memory_size: usize,
    code_size: usize,
) -> Result<u64, VMError> {
    // CREATE2 additionally hashes the init code
    let hash_cost = KECCAK256_WORD_COST
        .checked_mul(word_count(code_size)?)
        .ok_or(OutOfGas)?;

    create(new_memory_size, current_memory_size, code_size)?
        .checked_add(hash_cost)
        .ok_or(OutOfGas.into())
}

/// The 63/64 rule: the most gas a frame may hand to a sub-context.
pub fn max_message_call_gas(gas_remaining: u64) -> u64 {
    gas_remaining - gas_remaining / 64
}

fn word_count(size: usize) -> Result<u64, VMError> {
    let size: u64 = size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    Ok(size
        .checked_add(WORD_SIZE_IN_BYTES_U64 - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_U64)
}

fn mem_expansion_behavior(
    new_memory_size: usize,
    current_memory_size: usize,
    static_cost: u64,
) -> Result<u64, VMError> {
    let memory_expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;

    static_cost
        .checked_add(memory_expansion_cost)
        .ok_or(OutOfGas.into())
}
