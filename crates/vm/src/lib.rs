//! # emberVM
//!
//! An embeddable EVM core for host chains that map EVM accounts onto their
//! own address space. The engine interprets Ethereum bytecode under exact gas
//! accounting, with full support for nested message calls
//! (CALL/CALLCODE/DELEGATECALL/STATICCALL), contract creation
//! (CREATE/CREATE2), the halting opcodes, and a transactional state overlay
//! that makes reverts atomic.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          VM                              │
//! │  ┌───────────┐  ┌──────────┐  ┌─────────┐  ┌──────────┐  │
//! │  │ CallFrame │  │  Memory  │  │  Stack  │  │ EvmState │  │
//! │  └───────────┘  └──────────┘  └─────────┘  └──────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Database (host store)                  │
//! │        EVM address ──► host address ──► account          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`call_frame::CallFrame`] owns its stack, memory and a snapshot of
//! the account overlay; a child's mutations become visible to its parent only
//! when the child returns successfully. The host plugs in a backing store
//! through [`db::Database`] and a precompile registry through
//! [`precompiles::PrecompileSet`].

pub mod account;
pub mod call_frame;
pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod gas_cost;
pub mod memory;
pub mod opcode_handlers;
pub mod opcodes;
pub mod precompiles;
pub mod state;
pub mod utils;
pub mod vm;

pub use environment::Environment;
pub use errors::{ExecutionReport, TxResult, VMError};
pub use vm::VM;
