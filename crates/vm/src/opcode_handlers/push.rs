//! # Push operations
//!
//! Includes the following opcodes:
//!   - `PUSH0`
//!   - `PUSH1` to `PUSH32`

use ethereum_types::U256;

use crate::{
    constants::WORD_SIZE_IN_BYTES_USIZE,
    errors::{OpcodeResult, VMError},
    gas_cost,
    vm::VM,
};

impl VM {
    /// Pushes the next `n_bytes` immediate bytes, big-endian. Immediates past
    /// the end of the bytecode read as zeros.
    pub fn op_push(&mut self, n_bytes: usize) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::PUSHN)?;

        // the program counter already points at the first immediate byte
        let available = frame.bytecode.get(frame.pc..).unwrap_or(&[]);
        let take = n_bytes.min(available.len());

        let mut padded = [0u8; WORD_SIZE_IN_BYTES_USIZE];
        padded[..take].copy_from_slice(&available[..take]);
        let value = U256::from_big_endian(&padded[..n_bytes]);

        frame.stack.push(value)?;

        Ok(OpcodeResult::Continue {
            pc_increment: n_bytes,
        })
    }

    pub fn op_push0(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::PUSH0)?;
        frame.stack.push(U256::zero())?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}
