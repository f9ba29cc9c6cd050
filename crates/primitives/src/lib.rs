//! Primitive types for the Rollup Node.

pub use batch::{
    calculate_acc_input_hash, AccInputHashInput, Batch, BatchStatus, L1Reference,
    ProcessingReceipt,
};
mod batch;

pub use caller::CallerLabel;
mod caller;

pub use counters::{
    is_within_constraints, BatchConstraints, BatchResources, ResourceOverflow, ZkCounter,
    ZkCounters,
};
mod counters;

pub use event::{Event, EventComponent, EventId, EventLevel};
mod event;

pub use egp::{
    calculate_effective_gas_price_percentage, effective_gas_price_from_percentage, EgpError,
    MAX_EFFECTIVE_PERCENTAGE,
};
mod egp;

pub use fork_id::{ForkIdInterval, FORK_ID_DRAGONFRUIT, FORK_ID_ETROG, FORK_ID_FEIJOA};
mod fork_id;

pub use metrics::MeteredFuture;
mod metrics;
