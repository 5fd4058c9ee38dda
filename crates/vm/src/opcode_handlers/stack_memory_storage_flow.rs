//! # Stack, memory, storage and flow operations
//!
//! Includes the following opcodes:
//!   - `POP`
//!   - `GAS`
//!   - `NUMBER` / `TIMESTAMP`
//!   - `MLOAD` / `MSTORE` / `MSTORE8`
//!   - `SLOAD` / `SSTORE`
//!   - `JUMPDEST`

use crate::{
    constants::WORD_SIZE_IN_BYTES_USIZE,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::u256_to_usize,
    vm::VM,
};

impl VM {
    pub fn op_pop(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::POP)?;
        frame.stack.pop1()?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_gas(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::GAS)?;
        frame.stack.push(frame.gas_remaining.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_number(&mut self) -> Result<OpcodeResult, VMError> {
        let block_number = self.env.block_number;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::NUMBER)?;
        frame.stack.push(block_number)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_timestamp(&mut self) -> Result<OpcodeResult, VMError> {
        let block_timestamp = self.env.block_timestamp;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::TIMESTAMP)?;
        frame.stack.push(block_timestamp)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_mload(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let offset = u256_to_usize(frame.stack.pop1()?)?;

        frame.increase_consumed_gas(gas_cost::mload(
            calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?,
            frame.memory.len(),
        )?)?;

        let value = frame.memory.load_word(offset)?;
        frame.stack.push(value)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_mstore(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, value] = frame.stack.pop()?;
        let offset = u256_to_usize(offset)?;

        frame.increase_consumed_gas(gas_cost::mstore(
            calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?,
            frame.memory.len(),
        )?)?;

        frame.memory.store_word(offset, value)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_mstore8(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, value] = frame.stack.pop()?;
        let offset = u256_to_usize(offset)?;

        frame.increase_consumed_gas(gas_cost::mstore8(
            calculate_memory_size(offset, 1)?,
            frame.memory.len(),
        )?)?;

        frame.memory.store_data(offset, &[value.byte(0)])?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_sload(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let key = frame.stack.pop1()?;
        frame.increase_consumed_gas(gas_cost::SLOAD)?;

        let address = frame.to;
        let value = frame
            .state
            .get_account(address)?
            .storage
            .get(&key)
            .copied()
            .unwrap_or_default();
        frame.stack.push(value)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_sstore(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        if frame.is_static {
            return Err(ExceptionalHalt::StateModification.into());
        }

        let [key, value] = frame.stack.pop()?;
        frame.increase_consumed_gas(gas_cost::SSTORE)?;

        let address = frame.to;
        frame
            .state
            .get_account_mut(address)?
            .storage
            .insert(key, value);

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_jumpdest(&mut self) -> Result<OpcodeResult, VMError> {
        self.current_call_frame
            .increase_consumed_gas(gas_cost::JUMPDEST)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}
