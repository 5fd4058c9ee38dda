use bytes::Bytes;
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One EVM account as seen by the transaction-scoped overlay.
///
/// Code is held inline: the overlay lives for a single transaction, so
/// hash-indexed code storage would buy nothing here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: BTreeMap<U256, U256>,
    /// Set by SELFDESTRUCT; never cleared within a transaction.
    pub destructed: bool,
}

impl Account {
    pub fn new(balance: U256, nonce: u64, code: Bytes) -> Self {
        Account {
            balance,
            nonce,
            code,
            storage: BTreeMap::new(),
            destructed: false,
        }
    }

    pub fn with_balance(balance: U256) -> Self {
        Account {
            balance,
            ..Default::default()
        }
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }

    /// Deploying over an account for which this holds is a collision.
    pub fn has_code_or_nonce(&self) -> bool {
        self.has_code() || self.has_nonce()
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }

    pub fn mark_destructed(&mut self) {
        self.destructed = true;
    }
}
