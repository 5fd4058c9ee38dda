use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    call_frame::CallFrame,
    constants::{FAIL, INVALID_CONTRACT_PREFIX, MAX_CODE_SIZE, SUCCESS},
    db::Database,
    environment::Environment,
    errors::{
        ContextResult, ExceptionalHalt, ExecutionReport, InternalError, OpcodeResult, TxResult,
        VMError,
    },
    gas_cost::CODE_DEPOSIT_COST,
    opcode_handlers::system::CallKind,
    opcodes::Opcode,
    precompiles::PrecompileSet,
    state::EvmState,
    utils::address_to_word,
};

/// The execution engine: a push-down automaton over [`CallFrame`]s.
///
/// The running frame sits in `current_call_frame`; suspended parents wait in
/// `call_frames`, innermost last. System opcodes push a frame; a terminal
/// opcode pops one and folds its outcome into the parent.
pub struct VM {
    pub current_call_frame: CallFrame,
    pub call_frames: Vec<CallFrame>,
    pub env: Environment,
    pub precompiles: Arc<dyn PrecompileSet>,
}

impl VM {
    /// Builds an engine ready to run `bytecode` at `target` on behalf of
    /// `env.origin`.
    pub fn new(
        env: Environment,
        store: Arc<dyn Database>,
        precompiles: Arc<dyn PrecompileSet>,
        target: Address,
        bytecode: Bytes,
        calldata: Bytes,
        value: U256,
    ) -> Self {
        let state = EvmState::new(store);
        let root_frame = CallFrame::new(
            env.origin,
            target,
            target,
            bytecode,
            value,
            calldata,
            false,
            env.gas_limit,
            0,
            false,
            0,
            0,
            state,
        );

        Self {
            current_call_frame: root_frame,
            call_frames: Vec::new(),
            env,
            precompiles,
        }
    }

    /// Runs the loaded call to completion.
    pub fn execute(&mut self) -> Result<ExecutionReport, VMError> {
        tracing::debug!(
            origin = %self.env.origin,
            target = %self.current_call_frame.to,
            gas_limit = self.env.gas_limit,
            "executing call"
        );

        // the call value moves before the first opcode runs
        let (origin, target, value) = (
            self.current_call_frame.msg_sender,
            self.current_call_frame.to,
            self.current_call_frame.msg_value,
        );
        if !value.is_zero()
            && !self
                .current_call_frame
                .state
                .add_transfer(origin, target, value)?
        {
            return self.build_report(ContextResult {
                result: TxResult::Revert(ExceptionalHalt::InsufficientBalance.into()),
                gas_used: 0,
                output: Bytes::new(),
            });
        }

        self.run_execution()
    }

    /// Main execution loop: step the top frame one opcode at a time. A
    /// terminal opcode yields a [`ContextResult`], which either finishes the
    /// execution (root frame) or is folded into the suspended parent.
    pub fn run_execution(&mut self) -> Result<ExecutionReport, VMError> {
        loop {
            let opcode_byte = self.current_call_frame.next_opcode();
            let op_result = match Opcode::try_from(opcode_byte) {
                Ok(opcode) => self.execute_opcode(opcode),
                Err(halt) => Err(halt.into()),
            };

            let ctx_result = match op_result {
                Ok(OpcodeResult::Continue { pc_increment }) => {
                    self.current_call_frame.pc =
                        self.current_call_frame.pc.wrapping_add(pc_increment);
                    continue;
                }
                Ok(OpcodeResult::Halt) => self.handle_opcode_result()?,
                Err(error) => self.handle_opcode_error(error)?,
            };

            if self.call_frames.is_empty() {
                return self.build_report(ctx_result);
            }
            self.handle_return(&ctx_result)?;
        }
    }

    pub fn execute_opcode(&mut self, opcode: Opcode) -> Result<OpcodeResult, VMError> {
        match opcode {
            Opcode::STOP => Ok(OpcodeResult::Halt),
            Opcode::NUMBER => self.op_number(),
            Opcode::TIMESTAMP => self.op_timestamp(),
            Opcode::POP => self.op_pop(),
            Opcode::MLOAD => self.op_mload(),
            Opcode::MSTORE => self.op_mstore(),
            Opcode::MSTORE8 => self.op_mstore8(),
            Opcode::SLOAD => self.op_sload(),
            Opcode::SSTORE => self.op_sstore(),
            Opcode::GAS => self.op_gas(),
            Opcode::JUMPDEST => self.op_jumpdest(),
            Opcode::PUSH0 => self.op_push0(),
            Opcode::CREATE => self.op_create(),
            Opcode::CREATE2 => self.op_create2(),
            Opcode::CALL => self.op_call_family(CallKind::Call),
            Opcode::CALLCODE => self.op_call_family(CallKind::CallCode),
            Opcode::DELEGATECALL => self.op_call_family(CallKind::DelegateCall),
            Opcode::STATICCALL => self.op_call_family(CallKind::StaticCall),
            Opcode::RETURN => self.op_return(),
            Opcode::REVERT => self.op_revert(),
            Opcode::INVALID => self.op_invalid(),
            Opcode::SELFDESTRUCT => self.op_selfdestruct(),
            other => {
                if let Some(n_bytes) = other.push_size() {
                    self.op_push(n_bytes)
                } else if let Some(topics) = other.log_topic_count() {
                    self.op_log(topics)
                } else {
                    self.op_invalid()
                }
            }
        }
    }

    /// Suspends the running frame and makes `child` current.
    pub fn add_callframe(&mut self, child: CallFrame) {
        let parent = std::mem::replace(&mut self.current_call_frame, child);
        self.call_frames.push(parent);
    }

    /// A frame halted without error. For create frames this is where the
    /// code-deposit rules decide whether the deployment sticks.
    fn handle_opcode_result(&mut self) -> Result<ContextResult, VMError> {
        let frame = &mut self.current_call_frame;

        if frame.is_create {
            let code = std::mem::take(&mut frame.output);

            let deposit_error = if code.len() > MAX_CODE_SIZE {
                Some(ExceptionalHalt::CodeSizeExceeded)
            } else if code.first() == Some(&INVALID_CONTRACT_PREFIX) {
                Some(ExceptionalHalt::InvalidContractPrefix)
            } else {
                let deposit = CODE_DEPOSIT_COST
                    .checked_mul(code.len() as u64)
                    .ok_or(InternalError::Overflow)?;
                frame.increase_consumed_gas(deposit).err()
            };

            if let Some(halt) = deposit_error {
                frame.gas_remaining = 0;
                return Ok(ContextResult {
                    result: TxResult::Revert(halt.into()),
                    gas_used: frame.gas_used(),
                    output: Bytes::new(),
                });
            }

            let deployed = frame.to;
            frame.state.get_account_mut(deployed)?.code = code;
        }

        let frame = &mut self.current_call_frame;
        Ok(ContextResult {
            result: TxResult::Success,
            gas_used: frame.gas_used(),
            output: std::mem::take(&mut frame.output),
        })
    }

    /// A frame failed. Exceptional halts consume its whole allowance; REVERT
    /// keeps what was not spent.
    fn handle_opcode_error(&mut self, error: VMError) -> Result<ContextResult, VMError> {
        if error.should_propagate() {
            return Err(error);
        }

        let frame = &mut self.current_call_frame;
        if error != VMError::RevertOpcode {
            frame.gas_remaining = 0;
        }
        tracing::debug!(depth = frame.depth, error = %error, "frame reverted");

        Ok(ContextResult {
            result: TxResult::Revert(error),
            gas_used: frame.gas_used(),
            output: std::mem::take(&mut frame.output),
        })
    }

    /// Folds a finished child frame back into its suspended parent.
    fn handle_return(&mut self, ctx_result: &ContextResult) -> Result<(), VMError> {
        let parent = self
            .call_frames
            .pop()
            .ok_or(InternalError::CouldNotPopCallframe)?;
        let child = std::mem::replace(&mut self.current_call_frame, parent);

        if child.is_create {
            self.handle_return_create(child, ctx_result)
        } else {
            self.handle_return_call(child, ctx_result)
        }
    }

    fn handle_return_call(
        &mut self,
        child: CallFrame,
        ctx_result: &ContextResult,
    ) -> Result<(), VMError> {
        let parent = &mut self.current_call_frame;

        // unspent child gas flows back; an exceptional halt left none
        let child_unused_gas = child
            .gas_limit
            .checked_sub(ctx_result.gas_used)
            .ok_or(InternalError::Underflow)?;
        parent.gas_remaining = parent
            .gas_remaining
            .checked_add(child_unused_gas)
            .ok_or(InternalError::Overflow)?;

        // the reserved window receives the child's return data, truncated
        let window = ctx_result.output.len().min(child.ret_size);
        parent.memory.store_data(
            child.ret_offset,
            ctx_result.output.get(..window).ok_or(InternalError::Slicing)?,
        )?;
        parent.sub_return_data = ctx_result.output.clone();

        match ctx_result.result {
            TxResult::Success => {
                parent.stack.push(SUCCESS)?;
                // adopting the child's overlay is the commit
                parent.state = child.state;
            }
            TxResult::Revert(_) => {
                // the parent kept its own overlay, so the revert already happened
                parent.stack.push(FAIL)?;
            }
        }

        tracing::debug!(
            depth = child.depth,
            success = ctx_result.is_success(),
            "sub-context returned"
        );
        Ok(())
    }

    fn handle_return_create(
        &mut self,
        child: CallFrame,
        ctx_result: &ContextResult,
    ) -> Result<(), VMError> {
        let parent = &mut self.current_call_frame;

        let child_unused_gas = child
            .gas_limit
            .checked_sub(ctx_result.gas_used)
            .ok_or(InternalError::Underflow)?;
        parent.gas_remaining = parent
            .gas_remaining
            .checked_add(child_unused_gas)
            .ok_or(InternalError::Overflow)?;

        match &ctx_result.result {
            TxResult::Success => {
                parent.stack.push(address_to_word(child.to))?;
                parent.state = child.state;
            }
            TxResult::Revert(error) => {
                // only REVERT carries data out of a failed deployment
                if *error == VMError::RevertOpcode {
                    parent.sub_return_data = ctx_result.output.clone();
                }
                parent.stack.push(FAIL)?;
            }
        }

        tracing::debug!(
            depth = child.depth,
            success = ctx_result.is_success(),
            "create sub-context returned"
        );
        Ok(())
    }

    fn build_report(&mut self, ctx_result: ContextResult) -> Result<ExecutionReport, VMError> {
        let frame = &self.current_call_frame;
        let logs = if ctx_result.is_success() {
            frame.state.logs().to_vec()
        } else {
            Vec::new()
        };

        tracing::debug!(
            success = ctx_result.is_success(),
            gas_used = ctx_result.gas_used,
            "execution finished"
        );

        Ok(ExecutionReport {
            gas_left: frame.gas_limit.saturating_sub(ctx_result.gas_used),
            gas_used: ctx_result.gas_used,
            output: ctx_result.output,
            logs,
            touched_addresses: frame.state.touched_addresses(),
            result: ctx_result.result,
        })
    }

    /// Final overlay of the root frame. On success this is what the host
    /// folds back into its own state; after a revert it must be discarded.
    pub fn state(&self) -> &EvmState {
        &self.current_call_frame.state
    }
}
