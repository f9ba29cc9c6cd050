//! Test utilities for the state tree.

use crate::{hash_contract_bytecode, HashDb, HashDbError, Key};

use alloy_primitives::{Address, Bytes, B256, U256};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

/// A [`HashDb`] holding its leaves and bytecodes in memory.
#[derive(Debug, Default)]
pub struct InMemoryHashDb {
    leaves: HashMap<(B256, Key), U256>,
    programs: HashMap<B256, Bytes>,
    storage_error: AtomicBool,
}

impl InMemoryHashDb {
    /// Inserts the leaf value.
    pub fn insert(&mut self, root: B256, key: Key, value: U256) {
        self.leaves.insert((root, key), value);
    }

    /// Sets the balance of the account.
    pub fn set_balance(&mut self, root: B256, address: Address, balance: U256) {
        self.insert(root, Key::balance(address), balance);
    }

    /// Sets the nonce of the account.
    pub fn set_nonce(&mut self, root: B256, address: Address, nonce: u64) {
        self.insert(root, Key::nonce(address), U256::from(nonce));
    }

    /// Sets the bytecode of the account, along with its hash and length leaves.
    pub fn set_code(&mut self, root: B256, address: Address, code: Bytes) {
        let code_hash = hash_contract_bytecode(&code);
        self.insert(root, Key::code_hash(address), code_hash.into());
        self.insert(root, Key::code_length(address), U256::from(code.len()));
        self.programs.insert(code_hash, code);
    }

    /// Sets the value of the storage slot of the account.
    pub fn set_storage(&mut self, root: B256, address: Address, slot: U256, value: U256) {
        self.insert(root, Key::storage(address, slot), value);
    }

    /// Makes every call fail with a storage error.
    pub fn fail_with_storage_error(&self, fail: bool) {
        self.storage_error.store(fail, Ordering::Relaxed);
    }

    fn check_storage(&self) -> Result<(), HashDbError> {
        if self.storage_error.load(Ordering::Relaxed) {
            return Err(HashDbError::Storage)
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HashDb for InMemoryHashDb {
    async fn get(&self, root: B256, key: Key) -> Result<U256, HashDbError> {
        self.check_storage()?;
        self.leaves.get(&(root, key)).copied().ok_or(HashDbError::KeyNotFound)
    }

    async fn get_program(&self, code_hash: B256) -> Result<Bytes, HashDbError> {
        self.check_storage()?;
        self.programs.get(&code_hash).cloned().ok_or(HashDbError::KeyNotFound)
    }
}
