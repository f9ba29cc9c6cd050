//! The state-transition core of the rollup node.
//!
//! [`State`] turns encoded transactions into a new state root by calling the remote executor,
//! and arbitrates the writes of the sequencer and the L1 synchronizer to the batch ledger.

mod error;
pub use error::StateError;

mod events;
pub use events::{EventLog, EventRecord, EventStorage, NoopEventStorage};

mod fork_id;
pub use fork_id::{ForkIdCache, ForkIdError};

mod lifecycle;

mod metrics;

mod response;
pub use response::{
    ProcessBatchResponse, ProcessBlockResponse, ProcessTransactionResponse, ResponseError,
    UndecodedTransaction,
};

mod state;
pub use state::{AppendOutcome, BatchFullReason, State, StateConfig};
