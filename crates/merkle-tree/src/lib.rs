//! Read access to the sparse Merkle tree holding the L2 state, served by a remote hash db.

mod bytecode;
pub use bytecode::{hash_contract_bytecode, EMPTY_CODE_HASH};

mod client;
pub use client::{GrpcHashDbClient, HashDbClientConfig};

mod hashdb;
pub use hashdb::{HashDb, HashDbError};

mod key;
pub use key::{Key, LeafType};

mod proto;

mod tree;
pub use tree::{StateTree, StateTreeError};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
