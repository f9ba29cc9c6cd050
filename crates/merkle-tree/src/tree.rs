use crate::{HashDb, HashDbError, Key};

use alloy_primitives::{Address, Bytes, B256, U256};

/// An error of the [`StateTree`].
#[derive(Debug, thiserror::Error)]
pub enum StateTreeError {
    /// The hash db failed.
    #[error(transparent)]
    HashDb(#[from] HashDbError),
    /// A leaf holds a value out of the range of its type.
    #[error("{leaf} of {address} out of range: {value}")]
    ValueOutOfRange {
        /// The name of the leaf.
        leaf: &'static str,
        /// The account.
        address: Address,
        /// The stored value.
        value: U256,
    },
}

/// Read access to the accounts of the state tree at a given root.
#[derive(Debug, Clone)]
pub struct StateTree<H> {
    db: H,
}

impl<H: HashDb> StateTree<H> {
    /// Returns a new [`StateTree`] over the hash db.
    pub const fn new(db: H) -> Self {
        Self { db }
    }

    /// Returns the balance of the account, zero for an unknown account.
    pub async fn get_balance(&self, address: Address, root: B256) -> Result<U256, StateTreeError> {
        self.get_or_zero(root, Key::balance(address)).await
    }

    /// Returns the nonce of the account, zero for an unknown account.
    pub async fn get_nonce(&self, address: Address, root: B256) -> Result<u64, StateTreeError> {
        let value = self.get_or_zero(root, Key::nonce(address)).await?;
        value.try_into().map_err(|_| StateTreeError::ValueOutOfRange { leaf: "nonce", address, value })
    }

    /// Returns the hash of the bytecode of the account, or [`None`] if the account has no code
    /// leaf.
    pub async fn get_code_hash(
        &self,
        address: Address,
        root: B256,
    ) -> Result<Option<B256>, StateTreeError> {
        match self.db.get(root, Key::code_hash(address)).await {
            Ok(value) => Ok(Some(value.into())),
            Err(HashDbError::KeyNotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the length of the bytecode of the account, zero for an unknown account.
    pub async fn get_code_length(
        &self,
        address: Address,
        root: B256,
    ) -> Result<u64, StateTreeError> {
        let value = self.get_or_zero(root, Key::code_length(address)).await?;
        value
            .try_into()
            .map_err(|_| StateTreeError::ValueOutOfRange { leaf: "code length", address, value })
    }

    /// Returns the bytecode of the account, empty for an account without code.
    pub async fn get_code(&self, address: Address, root: B256) -> Result<Bytes, StateTreeError> {
        let Some(code_hash) = self.get_code_hash(address, root).await? else {
            return Ok(Bytes::new())
        };
        if code_hash.is_zero() {
            return Ok(Bytes::new())
        }

        match self.db.get_program(code_hash).await {
            Ok(code) => Ok(code),
            Err(HashDbError::KeyNotFound) => {
                tracing::debug!(target: "zkevm::merkle_tree", %address, %code_hash, "bytecode not found");
                Ok(Bytes::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the value of the storage slot of the account, zero for an unset slot.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        root: B256,
    ) -> Result<U256, StateTreeError> {
        self.get_or_zero(root, Key::storage(address, slot)).await
    }

    async fn get_or_zero(&self, root: B256, key: Key) -> Result<U256, StateTreeError> {
        match self.db.get(root, key).await {
            Ok(value) => Ok(value),
            Err(HashDbError::KeyNotFound) => Ok(U256::ZERO),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hash_contract_bytecode, test_utils::InMemoryHashDb};

    use alloy_primitives::{address, bytes};

    const ACCOUNT: Address = address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063D");

    #[tokio::test]
    async fn test_unknown_account_reads_as_empty() -> eyre::Result<()> {
        let tree = StateTree::new(InMemoryHashDb::default());
        let root = B256::repeat_byte(1);

        assert_eq!(tree.get_balance(ACCOUNT, root).await?, U256::ZERO);
        assert_eq!(tree.get_nonce(ACCOUNT, root).await?, 0);
        assert_eq!(tree.get_code_hash(ACCOUNT, root).await?, None);
        assert_eq!(tree.get_code(ACCOUNT, root).await?, Bytes::new());
        assert_eq!(tree.get_code_length(ACCOUNT, root).await?, 0);
        assert_eq!(tree.get_storage_at(ACCOUNT, U256::from(1), root).await?, U256::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_account_reads() -> eyre::Result<()> {
        let root = B256::repeat_byte(2);
        let code = bytes!("6080604052");

        let mut db = InMemoryHashDb::default();
        db.set_balance(root, ACCOUNT, U256::from(1_000_000));
        db.set_nonce(root, ACCOUNT, 7);
        db.set_code(root, ACCOUNT, code.clone());
        db.set_storage(root, ACCOUNT, U256::from(3), U256::from(42));
        let tree = StateTree::new(db);

        assert_eq!(tree.get_balance(ACCOUNT, root).await?, U256::from(1_000_000));
        assert_eq!(tree.get_nonce(ACCOUNT, root).await?, 7);
        assert_eq!(tree.get_code_hash(ACCOUNT, root).await?, Some(hash_contract_bytecode(&code)));
        assert_eq!(tree.get_code(ACCOUNT, root).await?, code);
        assert_eq!(tree.get_code_length(ACCOUNT, root).await?, 5);
        assert_eq!(tree.get_storage_at(ACCOUNT, U256::from(3), root).await?, U256::from(42));
        assert_eq!(tree.get_storage_at(ACCOUNT, U256::from(4), root).await?, U256::ZERO);

        // the same account under another root is unknown.
        assert_eq!(tree.get_balance(ACCOUNT, B256::ZERO).await?, U256::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_nonce_out_of_range() {
        let root = B256::repeat_byte(3);
        let mut db = InMemoryHashDb::default();
        db.insert(root, Key::nonce(ACCOUNT), U256::MAX);
        let tree = StateTree::new(db);

        assert!(matches!(
            tree.get_nonce(ACCOUNT, root).await,
            Err(StateTreeError::ValueOutOfRange { leaf: "nonce", .. })
        ));
    }

    #[tokio::test]
    async fn test_hash_db_errors_are_propagated() {
        let db = InMemoryHashDb::default();
        db.fail_with_storage_error(true);
        let tree = StateTree::new(db);

        assert!(matches!(
            tree.get_balance(ACCOUNT, B256::ZERO).await,
            Err(StateTreeError::HashDb(HashDbError::Storage))
        ));
    }
}
