use bytes::Bytes;
use ethereum_types::Address;
use thiserror::Error;

use crate::{db::DatabaseError, state::Log};

/// Anything that can stop an executing frame.
///
/// [`ExceptionalHalt`] and [`VMError::RevertOpcode`] revert the current frame
/// and stay local to it; [`InternalError`] and [`DatabaseError`] mean the
/// engine itself (or its host) broke an invariant and must abort execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error("revert opcode")]
    RevertOpcode,
    #[error(transparent)]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl VMError {
    /// True for errors that abort execution instead of reverting the frame.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::Internal(_) | VMError::Database(_))
    }
}

/// Frame-local failures. All of them consume the frame's remaining gas and
/// surface to the parent as a reverted sub-context, never as a host error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("state modification in read-only context")]
    StateModification,
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    #[error("contract address collision")]
    Collision,
    #[error("code size limit exceeded")]
    CodeSizeExceeded,
    #[error("deployed code starts with the reserved 0xef byte")]
    InvalidContractPrefix,
    #[error("nonce overflow")]
    NonceOverflow,
    #[error("maximum call depth exceeded")]
    DepthExceeded,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("offset or size out of range")]
    VeryLargeNumber,
}

/// Invariant breaches. Reaching one of these is a bug, not a contract error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("slicing out of bounds")]
    Slicing,
    #[error("call frame stack exhausted")]
    CouldNotPopCallframe,
    #[error("precompile dispatch without a registry")]
    MissingPrecompile,
}

/// Outcome of a single opcode execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    /// Keep stepping; `pc_increment` skips immediate bytes (PUSH data).
    Continue { pc_increment: usize },
    Halt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    Success,
    Revert(VMError),
}

/// Terminal outcome of one frame, handed to `finalize_parent`.
#[derive(Debug, Clone)]
pub struct ContextResult {
    pub result: TxResult,
    pub gas_used: u64,
    pub output: Bytes,
}

impl ContextResult {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}

/// Outcome of a whole execution, as surfaced to the transaction executor.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub result: TxResult,
    pub gas_used: u64,
    pub gas_left: u64,
    pub output: Bytes,
    pub logs: Vec<Log>,
    /// Every address the overlay touched, sorted.
    pub touched_addresses: Vec<Address>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}
