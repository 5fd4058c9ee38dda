use ethereum_types::{Address, U256};

use crate::constants::TRANSACTION_GAS_LIMIT;

/// Read-only transaction and block context, snapshotted by the host before
/// execution starts.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Externally-owned account that signed the transaction.
    pub origin: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub block_number: U256,
    pub block_timestamp: U256,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            origin: Address::zero(),
            gas_limit: TRANSACTION_GAS_LIMIT,
            gas_price: U256::zero(),
            block_number: U256::zero(),
            block_timestamp: U256::zero(),
        }
    }
}
