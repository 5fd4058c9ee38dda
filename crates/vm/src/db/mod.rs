use std::collections::HashMap;

use ethereum_types::{Address, H256};
use keccak_hash::keccak;
use thiserror::Error;

use crate::account::Account;

/// Host-side location of an account's backing contract.
pub type HostAddress = H256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("database error: {0}")]
pub struct DatabaseError(pub String);

/// Backing store provided by the host chain.
///
/// `host_address` is the deterministic translation from an EVM address into
/// the host's own address space; it must be a pure function. Accounts are
/// fetched by host address, so two stores that agree on the mapping agree on
/// every lookup.
pub trait Database: Send + Sync {
    fn host_address(&self, address: Address) -> HostAddress;

    /// Returns the account stored under `address`, or the empty default if
    /// the host has never seen it.
    fn get_account(&self, address: HostAddress) -> Result<Account, DatabaseError>;
}

/// In-memory store keyed the way a host would key it. Mostly for tests and
/// stand-alone execution.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    accounts: HashMap<HostAddress, Account>,
}

/// Domain tag keeping derived host addresses disjoint from raw hashes.
const ACCOUNT_DOMAIN: &[u8] = b"ember/account/v1";

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, address: Address, account: Account) -> Self {
        let host_address = self.host_address(address);
        self.accounts.insert(host_address, account);
        self
    }
}

impl Database for InMemoryDatabase {
    fn host_address(&self, address: Address) -> HostAddress {
        let mut preimage = Vec::with_capacity(ACCOUNT_DOMAIN.len() + Address::len_bytes());
        preimage.extend_from_slice(ACCOUNT_DOMAIN);
        preimage.extend_from_slice(address.as_bytes());
        keccak(preimage)
    }

    fn get_account(&self, address: HostAddress) -> Result<Account, DatabaseError> {
        Ok(self.accounts.get(&address).cloned().unwrap_or_default())
    }
}
