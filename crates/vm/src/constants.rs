use ethereum_types::U256;

pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

/// Word pushed by a call-family opcode when the sub-context succeeded.
pub const SUCCESS: U256 = U256::one();
/// Word pushed when the sub-context reverted or was never spawned.
pub const FAIL: U256 = U256::zero();

pub const STACK_LIMIT: usize = 1024;

/// Message calls and creations beyond this depth fail before a frame exists.
pub const CALL_DEPTH_LIMIT: u16 = 1024;

pub const MEMORY_EXPANSION_QUOTIENT: usize = 512;

/// EIP-170 cap on deployed bytecode.
pub const MAX_CODE_SIZE: usize = 0x6000;
/// EIP-3860 cap on init code (twice the deployed cap).
pub const INIT_CODE_MAX_SIZE: usize = 49152;

pub const MAX_NONCE: u64 = u64::MAX;

/// EIP-3541: deployed code must not start with this byte.
pub const INVALID_CONTRACT_PREFIX: u8 = 0xef;

/// Default cap a host places on a single transaction.
pub const TRANSACTION_GAS_LIMIT: u64 = 30_000_000;
