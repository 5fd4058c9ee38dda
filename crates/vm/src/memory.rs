use bytes::Bytes;
use ethereum_types::U256;

use crate::{
    constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_USIZE},
    errors::{ExceptionalHalt, InternalError, VMError},
};
use ExceptionalHalt::OutOfGas;

/// Byte-addressable frame memory, grown in 32-byte words.
///
/// Growth happens on access; the gas for it is charged separately through
/// [`expansion_cost`] before the access runs.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Current size in bytes; always a multiple of 32.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Grows the buffer so `new_size` bytes are addressable.
    pub fn resize(&mut self, new_size: usize) -> Result<(), VMError> {
        if new_size <= self.buffer.len() {
            return Ok(());
        }
        let aligned = new_size
            .checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.buffer.resize(aligned, 0);
        Ok(())
    }

    /// Copies `size` bytes starting at `offset`, zero-filling past the
    /// current length.
    pub fn load_range(&mut self, offset: usize, size: usize) -> Result<Bytes, VMError> {
        if size == 0 {
            return Ok(Bytes::new());
        }
        let new_size = offset
            .checked_add(size)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(new_size)?;

        let slice = self
            .buffer
            .get(offset..new_size)
            .ok_or(InternalError::Slicing)?;
        Ok(Bytes::copy_from_slice(slice))
    }

    pub fn load_word(&mut self, offset: usize) -> Result<U256, VMError> {
        let bytes = self.load_range(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        Ok(U256::from_big_endian(&bytes))
    }

    pub fn store_data(&mut self, offset: usize, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        let new_size = offset
            .checked_add(data.len())
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(new_size)?;

        self.buffer
            .get_mut(offset..new_size)
            .ok_or(InternalError::Slicing)?
            .copy_from_slice(data);
        Ok(())
    }

    pub fn store_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        self.store_data(offset, &word.to_big_endian())
    }
}

/// Gas charged when the memory high-water mark grows. Only the delta between
/// the new and the old total cost is paid.
pub fn expansion_cost(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    let cost = if new_memory_size <= current_memory_size {
        0
    } else {
        cost(new_memory_size)?
            .checked_sub(cost(current_memory_size)?)
            .ok_or(InternalError::Underflow)?
    };
    Ok(cost)
}

/// Total cost of a memory of `memory_size` bytes: `3·w + w²/512`.
fn cost(memory_size: usize) -> Result<u64, VMError> {
    let memory_size_word = memory_size
        .checked_add(WORD_SIZE_IN_BYTES_USIZE - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_USIZE;

    let gas_cost = (memory_size_word.checked_pow(2).ok_or(OutOfGas)? / MEMORY_EXPANSION_QUOTIENT)
        .checked_add(3usize.checked_mul(memory_size_word).ok_or(OutOfGas)?)
        .ok_or(OutOfGas)?;

    gas_cost
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

/// Word-aligned end of an access of `size` bytes at `offset`. Zero-sized
/// accesses never grow memory, whatever their offset.
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }

    offset
        .checked_add(size)
        .and_then(|end| end.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or(OutOfGas.into())
}
