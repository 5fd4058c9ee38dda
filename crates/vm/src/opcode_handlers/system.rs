//! # System operations
//!
//! Includes the following opcodes:
//!   - `CALL`
//!   - `CALLCODE`
//!   - `DELEGATECALL`
//!   - `STATICCALL`
//!   - `CREATE`
//!   - `CREATE2`
//!   - `RETURN`
//!   - `REVERT`
//!   - `INVALID`
//!   - `SELFDESTRUCT`

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    call_frame::CallFrame,
    constants::{CALL_DEPTH_LIMIT, FAIL, INIT_CODE_MAX_SIZE, MAX_NONCE, SUCCESS},
    errors::{ExceptionalHalt, InternalError, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::{
        calculate_create2_address, calculate_create_address, size_offset_to_usize,
        word_to_address,
    },
    vm::VM,
};

/// The four message-call variants. Their differences reduce to who the child
/// runs as, whose code it runs, and whether value moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

impl CallKind {
    /// Pops a `value` operand and moves it to the callee.
    fn transfers_value(self) -> bool {
        matches!(self, CallKind::Call | CallKind::CallCode)
    }

    /// Forces the child frame read-only.
    fn read_only(self) -> bool {
        matches!(self, CallKind::StaticCall)
    }
}

impl VM {
    /// Shared initiation of CALL/CALLCODE/DELEGATECALL/STATICCALL.
    ///
    /// Operand order, top of the stack first: `gas`, `address`, `value` (only
    /// when the variant carries one), `args_offset`, `args_size`,
    /// `ret_offset`, `ret_size`.
    pub fn op_call_family(&mut self, kind: CallKind) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [gas, callee] = frame.stack.pop()?;
        let callee = word_to_address(callee);
        let transfer_value = if kind.transfers_value() {
            frame.stack.pop1()?
        } else {
            U256::zero()
        };
        let [args_offset, args_size, ret_offset, ret_size] = frame.stack.pop()?;
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;

        // sending value counts as a state modification
        if frame.is_static && !transfer_value.is_zero() {
            return Err(ExceptionalHalt::StateModification.into());
        }

        // one expansion charge covers both operand windows
        let new_memory_size = calculate_memory_size(args_offset, args_size)?
            .max(calculate_memory_size(ret_offset, ret_size)?);
        frame.increase_consumed_gas(gas_cost::call(new_memory_size, frame.memory.len())?)?;

        // 63/64 of what remains is the most the child may receive
        let max_gas_for_call = gas_cost::max_message_call_gas(frame.gas_remaining);
        let forwarded_gas: u64 = gas
            .min(max_gas_for_call.into())
            .try_into()
            .map_err(|_| ExceptionalHalt::OutOfGas)?;
        frame.increase_consumed_gas(forwarded_gas)?;

        // expand now: the return window cannot grow while the child runs
        frame.memory.resize(new_memory_size)?;
        let calldata = frame.memory.load_range(args_offset, args_size)?;

        let (msg_sender, to, code_address, msg_value) = match kind {
            CallKind::Call => (frame.to, callee, callee, transfer_value),
            CallKind::CallCode => (frame.to, frame.to, callee, transfer_value),
            CallKind::DelegateCall => (frame.msg_sender, frame.to, callee, frame.msg_value),
            CallKind::StaticCall => (frame.to, callee, callee, U256::zero()),
        };
        let is_static = frame.is_static || kind.read_only();

        self.generic_call(
            forwarded_gas,
            msg_value,
            msg_sender,
            to,
            code_address,
            kind.transfers_value(),
            is_static,
            calldata,
            ret_offset,
            ret_size,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn generic_call(
        &mut self,
        gas_limit: u64,
        value: U256,
        msg_sender: Address,
        to: Address,
        code_address: Address,
        should_transfer_value: bool,
        is_static: bool,
        calldata: Bytes,
        ret_offset: usize,
        ret_size: usize,
    ) -> Result<OpcodeResult, VMError> {
        // a new sub-context invalidates the previous return data
        self.current_call_frame.sub_return_data = Bytes::new();

        if should_transfer_value && !value.is_zero() {
            let sender_balance = self
                .current_call_frame
                .state
                .get_account(msg_sender)?
                .balance;
            if sender_balance < value {
                return self.abort_sub_context(
                    gas_limit,
                    ret_offset,
                    ret_size,
                    ExceptionalHalt::InsufficientBalance,
                    Bytes::from_static(b"insufficient balance"),
                );
            }
        }

        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;
        if new_depth > CALL_DEPTH_LIMIT {
            return self.abort_sub_context(
                gas_limit,
                ret_offset,
                ret_size,
                ExceptionalHalt::DepthExceeded,
                Bytes::new(),
            );
        }

        // precompiles run in the host engine; no frame, no code lookup
        if self.precompiles.is_precompile(code_address) {
            let ctx_result = self
                .precompiles
                .execute(code_address, &calldata, gas_limit)?;

            let frame = &mut self.current_call_frame;
            if ctx_result.is_success() {
                let unused_gas = gas_limit
                    .checked_sub(ctx_result.gas_used)
                    .ok_or(InternalError::Underflow)?;
                frame.gas_remaining = frame
                    .gas_remaining
                    .checked_add(unused_gas)
                    .ok_or(InternalError::Overflow)?;
            }

            let window = ctx_result.output.len().min(ret_size);
            frame.memory.store_data(
                ret_offset,
                ctx_result.output.get(..window).ok_or(InternalError::Slicing)?,
            )?;
            frame.sub_return_data = ctx_result.output.clone();
            frame
                .stack
                .push(if ctx_result.is_success() { SUCCESS } else { FAIL })?;

            if should_transfer_value && ctx_result.is_success()
                && !self
                    .current_call_frame
                    .state
                    .add_transfer(msg_sender, to, value)?
            {
                return Err(InternalError::Underflow.into());
            }

            return Ok(OpcodeResult::Continue { pc_increment: 0 });
        }

        let bytecode = self
            .current_call_frame
            .state
            .get_account(code_address)?
            .code
            .clone();

        // the child's snapshot; the transfer lands there so a revert undoes it
        let mut child_state = self.current_call_frame.state.clone();
        if should_transfer_value && !child_state.add_transfer(msg_sender, to, value)? {
            return Err(InternalError::Underflow.into());
        }

        tracing::debug!(depth = new_depth, to = %to, gas = gas_limit, "entering sub-context");

        let child = CallFrame::new(
            msg_sender,
            to,
            code_address,
            bytecode,
            value,
            calldata,
            is_static,
            gas_limit,
            new_depth,
            false,
            ret_offset,
            ret_size,
            child_state,
        );
        self.add_callframe(child);

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    /// Common behavior for the CREATE and CREATE2 opcodes.
    pub fn generic_create(
        &mut self,
        value: U256,
        code_offset: usize,
        code_size: usize,
        salt: Option<U256>,
    ) -> Result<OpcodeResult, VMError> {
        // init code over twice the deployed-code cap fails as out-of-gas
        if code_size > INIT_CODE_MAX_SIZE {
            return Err(ExceptionalHalt::CodeSizeExceeded.into());
        }
        if self.current_call_frame.is_static {
            return Err(ExceptionalHalt::StateModification.into());
        }

        self.current_call_frame.sub_return_data = Bytes::new();

        // reserve everything the 63/64 rule allows; the short-circuit checks
        // below hand it back untouched
        let gas_limit = gas_cost::max_message_call_gas(self.current_call_frame.gas_remaining);
        self.current_call_frame.increase_consumed_gas(gas_limit)?;

        let init_code = self
            .current_call_frame
            .memory
            .load_range(code_offset, code_size)?;

        let deployer = self.current_call_frame.to;
        let (deployer_balance, deployer_nonce) = {
            let account = self.current_call_frame.state.get_account(deployer)?;
            (account.balance, account.nonce)
        };

        let new_address = match salt {
            Some(salt) => calculate_create2_address(deployer, &init_code, salt),
            None => calculate_create_address(deployer, deployer_nonce),
        };

        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;

        let checks = [
            (deployer_balance < value, ExceptionalHalt::InsufficientBalance),
            (new_depth > CALL_DEPTH_LIMIT, ExceptionalHalt::DepthExceeded),
            (deployer_nonce == MAX_NONCE, ExceptionalHalt::NonceOverflow),
        ];
        for (condition, reason) in checks {
            if condition {
                return self.abort_sub_context(gas_limit, 0, 0, reason, Bytes::new());
            }
        }

        // irreversible: the deployer's nonce moves even when deployment fails
        let deployer_account = self.current_call_frame.state.get_account_mut(deployer)?;
        deployer_account.nonce = deployer_account
            .nonce
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;

        // deploying over a live account burns the reserved gas
        if self
            .current_call_frame
            .state
            .get_account(new_address)?
            .has_code_or_nonce()
        {
            self.current_call_frame.stack.push(FAIL)?;
            tracing::debug!(
                address = %new_address,
                reason = %ExceptionalHalt::Collision,
                "creation failed"
            );
            return Ok(OpcodeResult::Continue { pc_increment: 0 });
        }

        let mut child_state = self.current_call_frame.state.clone();
        // fresh contracts start life at nonce one, before the endowment moves
        child_state.get_account_mut(new_address)?.nonce = 1;
        if !child_state.add_transfer(deployer, new_address, value)? {
            return Err(InternalError::Underflow.into());
        }

        tracing::debug!(depth = new_depth, address = %new_address, gas = gas_limit, "entering create sub-context");

        let child = CallFrame::new(
            deployer,
            new_address,
            new_address,
            init_code,
            value,
            Bytes::new(),
            false,
            gas_limit,
            new_depth,
            true,
            0,
            0,
            child_state,
        );
        self.add_callframe(child);

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_create(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [value, code_offset, code_size] = frame.stack.pop()?;
        let (code_size, code_offset) = size_offset_to_usize(code_size, code_offset)?;

        frame.increase_consumed_gas(gas_cost::create(
            calculate_memory_size(code_offset, code_size)?,
            frame.memory.len(),
            code_size,
        )?)?;

        self.generic_create(value, code_offset, code_size, None)
    }

    pub fn op_create2(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [value, code_offset, code_size, salt] = frame.stack.pop()?;
        let (code_size, code_offset) = size_offset_to_usize(code_size, code_offset)?;

        frame.increase_consumed_gas(gas_cost::create_2(
            calculate_memory_size(code_offset, code_size)?,
            frame.memory.len(),
            code_size,
        )?)?;

        self.generic_create(value, code_offset, code_size, Some(salt))
    }

    pub fn op_return(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, size] = frame.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        frame.increase_consumed_gas(gas_cost::exit_opcode(
            calculate_memory_size(offset, size)?,
            frame.memory.len(),
        )?)?;

        if size != 0 {
            frame.output = frame.memory.load_range(offset, size)?;
        }

        Ok(OpcodeResult::Halt)
    }

    pub fn op_revert(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, size] = frame.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        frame.increase_consumed_gas(gas_cost::exit_opcode(
            calculate_memory_size(offset, size)?,
            frame.memory.len(),
        )?)?;

        if size != 0 {
            frame.output = frame.memory.load_range(offset, size)?;
        }

        Err(VMError::RevertOpcode)
    }

    pub fn op_invalid(&mut self) -> Result<OpcodeResult, VMError> {
        Err(ExceptionalHalt::InvalidOpcode.into())
    }

    pub fn op_selfdestruct(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        if frame.is_static {
            return Err(ExceptionalHalt::StateModification.into());
        }

        let beneficiary = word_to_address(frame.stack.pop1()?);
        frame.increase_consumed_gas(gas_cost::SELFDESTRUCT_STATIC)?;

        // a self-sweep pays out to the zero address
        let beneficiary = if beneficiary == frame.to {
            Address::zero()
        } else {
            beneficiary
        };

        let balance = frame.state.get_account(frame.to)?.balance;
        if !frame.state.add_transfer(frame.to, beneficiary, balance)? {
            return Err(InternalError::Underflow.into());
        }
        frame.state.get_account_mut(frame.to)?.mark_destructed();

        Ok(OpcodeResult::Halt)
    }

    /// The sub-context never runs: hand the reserved gas back, push the
    /// failure word and expose `output` as the failed child's return data.
    fn abort_sub_context(
        &mut self,
        gas_limit: u64,
        ret_offset: usize,
        ret_size: usize,
        reason: ExceptionalHalt,
        output: Bytes,
    ) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.gas_remaining = frame
            .gas_remaining
            .checked_add(gas_limit)
            .ok_or(InternalError::Overflow)?;
        frame.stack.push(FAIL)?;

        let window = output.len().min(ret_size);
        frame
            .memory
            .store_data(ret_offset, output.get(..window).ok_or(InternalError::Slicing)?)?;
        frame.sub_return_data = output;

        tracing::debug!(reason = %reason, "sub-context aborted before frame creation");
        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}
