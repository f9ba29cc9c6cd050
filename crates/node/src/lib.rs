//! The configuration and the startup wiring of the rollup node state-transition core.

mod args;
pub use args::{
    BatchConstraintsArgs, DatabaseArgs, ExecutorArgs, MerkleTreeArgs, RollupNodeArgs, StateArgs,
};

mod builder;
pub use builder::{RemoteExecutor, RollupNode};

mod constants;
