//! # Logging operations
//!
//! Includes the following opcodes:
//!   - `LOG0` to `LOG4`

use ethereum_types::H256;

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    state::Log,
    utils::size_offset_to_usize,
    vm::VM,
};

impl VM {
    pub fn op_log(&mut self, number_of_topics: usize) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        if frame.is_static {
            return Err(ExceptionalHalt::StateModification.into());
        }

        let [offset, size] = frame.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let mut topics = Vec::with_capacity(number_of_topics);
        for _ in 0..number_of_topics {
            topics.push(H256(frame.stack.pop1()?.to_big_endian()));
        }

        frame.increase_consumed_gas(gas_cost::log(
            calculate_memory_size(offset, size)?,
            frame.memory.len(),
            size,
            number_of_topics,
        )?)?;

        let log = Log {
            address: frame.to,
            topics,
            data: frame.memory.load_range(offset, size)?,
        };
        frame.state.add_log(log);

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}
