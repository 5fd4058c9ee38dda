use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    constants::STACK_LIMIT, errors::ExceptionalHalt, memory::Memory, opcodes::Opcode,
    state::EvmState,
};

/// LIFO of 256-bit words, bounded at 1024 entries.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    values: Vec<U256>,
}

impl Stack {
    pub fn push(&mut self, value: U256) -> Result<(), ExceptionalHalt> {
        if self.values.len() >= STACK_LIMIT {
            return Err(ExceptionalHalt::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop1(&mut self) -> Result<U256, ExceptionalHalt> {
        self.values.pop().ok_or(ExceptionalHalt::StackUnderflow)
    }

    /// Pops N values at once, top of the stack first.
    pub fn pop<const N: usize>(&mut self) -> Result<[U256; N], ExceptionalHalt> {
        if self.values.len() < N {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        let mut popped = [U256::zero(); N];
        for slot in popped.iter_mut() {
            *slot = self.values.pop().ok_or(ExceptionalHalt::StackUnderflow)?;
        }
        Ok(popped)
    }

    /// Reads the value `depth` items below the top without removing it.
    pub fn peek(&self, depth: usize) -> Result<U256, ExceptionalHalt> {
        self.values
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| self.values.get(index))
            .copied()
            .ok_or(ExceptionalHalt::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One activation record of the interpreter.
///
/// A frame owns its stack, its memory and a snapshot of the account overlay;
/// the VM keeps suspended parents in a stack of frames, so no frame holds a
/// reference to another.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub msg_sender: Address,
    /// Account whose context (storage, balance) the code runs in.
    pub to: Address,
    /// Account the executing bytecode belongs to; differs from `to` for
    /// CALLCODE and DELEGATECALL.
    pub code_address: Address,
    pub bytecode: Bytes,
    pub calldata: Bytes,
    pub msg_value: U256,
    pub gas_limit: u64,
    pub gas_remaining: u64,
    pub depth: u16,
    pub is_static: bool,
    pub is_create: bool,
    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    /// Data this frame returns when it halts.
    pub output: Bytes,
    /// Return data of the most recently completed sub-context.
    pub sub_return_data: Bytes,
    /// Window of the parent's memory where this frame's return data lands.
    pub ret_offset: usize,
    pub ret_size: usize,
    /// The overlay this frame mutates. Parents keep their own copy, which
    /// makes a child revert a no-op for them.
    pub state: EvmState,
}

impl CallFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_sender: Address,
        to: Address,
        code_address: Address,
        bytecode: Bytes,
        msg_value: U256,
        calldata: Bytes,
        is_static: bool,
        gas_limit: u64,
        depth: u16,
        is_create: bool,
        ret_offset: usize,
        ret_size: usize,
        state: EvmState,
    ) -> Self {
        Self {
            msg_sender,
            to,
            code_address,
            bytecode,
            calldata,
            msg_value,
            gas_limit,
            gas_remaining: gas_limit,
            depth,
            is_static,
            is_create,
            pc: 0,
            stack: Stack::default(),
            memory: Memory::new(),
            output: Bytes::new(),
            sub_return_data: Bytes::new(),
            ret_offset,
            ret_size,
            state,
        }
    }

    /// Fetches the next instruction byte and advances the program counter.
    /// Running past the end of the bytecode yields STOP.
    pub fn next_opcode(&mut self) -> u8 {
        let opcode = self
            .bytecode
            .get(self.pc)
            .copied()
            .unwrap_or(Opcode::STOP as u8);
        self.pc = self.pc.wrapping_add(1);
        opcode
    }

    /// Charges `gas` against this frame, failing with OutOfGas when the
    /// remaining allowance cannot cover it.
    pub fn increase_consumed_gas(&mut self, gas: u64) -> Result<(), ExceptionalHalt> {
        self.gas_remaining = self
            .gas_remaining
            .checked_sub(gas)
            .ok_or(ExceptionalHalt::OutOfGas)?;
        Ok(())
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_remaining)
    }
}
