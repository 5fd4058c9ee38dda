use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::Serialize;

use crate::{
    account::Account,
    db::Database,
    errors::{InternalError, VMError},
};

/// One event emitted through LOG0..LOG4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// Transaction-scoped account overlay.
///
/// Cloning is the snapshot operation: every frame works on its own copy, and
/// a parent adopts the child's copy only when the child returns successfully.
/// Logs accrue here too, so a revert discards them together with the account
/// changes.
#[derive(Clone)]
pub struct EvmState {
    store: Arc<dyn Database>,
    accounts: HashMap<Address, Account>,
    logs: Vec<Log>,
}

impl EvmState {
    pub fn new(store: Arc<dyn Database>) -> Self {
        Self {
            store,
            accounts: HashMap::new(),
            logs: Vec::new(),
        }
    }

    /// Reads an account, pulling it through the host mapping on first touch.
    /// Unknown addresses materialize as the empty default.
    pub fn get_account(&mut self, address: Address) -> Result<&Account, VMError> {
        let account = self.load(address)?;
        Ok(account)
    }

    pub fn get_account_mut(&mut self, address: Address) -> Result<&mut Account, VMError> {
        self.load(address)
    }

    fn load(&mut self, address: Address) -> Result<&mut Account, VMError> {
        match self.accounts.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let host_address = self.store.host_address(address);
                let account = self.store.get_account(host_address)?;
                Ok(entry.insert(account))
            }
        }
    }

    pub fn set_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    /// Reads an account without touching the overlay or the store.
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// Moves `amount` from `from` to `to`. Returns `false` and leaves every
    /// balance untouched when the sender cannot cover it; both sides are
    /// counted as touched either way. The sum of balances is preserved.
    pub fn add_transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, VMError> {
        self.get_account(to)?;
        let from_balance = self.get_account(from)?.balance;

        if from_balance < amount {
            return Ok(false);
        }

        self.get_account_mut(from)?.balance = from_balance
            .checked_sub(amount)
            .ok_or(InternalError::Underflow)?;
        let to_account = self.get_account_mut(to)?;
        to_account.balance = to_account
            .balance
            .checked_add(amount)
            .ok_or(InternalError::Overflow)?;

        Ok(true)
    }

    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Every address this overlay has pulled in, sorted for determinism.
    pub fn touched_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.accounts.keys().copied().collect();
        addresses.sort();
        addresses
    }
}

impl fmt::Debug for EvmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmState")
            .field("accounts", &self.accounts)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}
