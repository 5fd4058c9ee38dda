use bytes::Bytes;
use ethereum_types::Address;

use crate::errors::{ContextResult, InternalError, VMError};

/// Highest address of the reserved precompile range `0x01..=0x0a`.
pub const PRECOMPILE_COUNT: u8 = 10;

/// Registry of precompiled contracts, provided by the host engine.
///
/// The call helper consults it before any code lookup: a positive
/// [`is_precompile`](PrecompileSet::is_precompile) answer short-circuits frame
/// construction and the outcome of [`execute`](PrecompileSet::execute) is
/// folded into the caller directly.
pub trait PrecompileSet: Send + Sync {
    fn is_precompile(&self, address: Address) -> bool;

    fn execute(
        &self,
        address: Address,
        calldata: &Bytes,
        gas_limit: u64,
    ) -> Result<ContextResult, VMError>;
}

/// True for addresses inside the reserved precompile range.
pub fn is_reserved_address(address: Address) -> bool {
    let bytes = address.as_fixed_bytes();
    bytes[..19].iter().all(|byte| *byte == 0) && (1..=PRECOMPILE_COUNT).contains(&bytes[19])
}

/// Host without precompile support. Calls into the reserved range behave
/// like calls to empty accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrecompiles;

impl PrecompileSet for NoPrecompiles {
    fn is_precompile(&self, _address: Address) -> bool {
        false
    }

    fn execute(
        &self,
        _address: Address,
        _calldata: &Bytes,
        _gas_limit: u64,
    ) -> Result<ContextResult, VMError> {
        Err(InternalError::MissingPrecompile.into())
    }
}
