//! The client side of the remote zkEVM executor: the [`Executor`] contract, its gRPC messages and
//! the classification of the errors it reports.

mod client;
pub use client::{ExecutorClientConfig, GrpcExecutorClient};

mod error;
pub use error::{ExecutionFailure, ExecutorClientError, ExecutorError, RomError};

mod proto;
pub use proto::{
    L1DataV2, ProcessBatchRequest, ProcessBatchRequestV2, ProcessBatchResponse,
    ProcessBatchResponseV2, ProcessBlockResponseV2, ProcessTransactionResponse,
    ProcessTransactionResponseV2,
};

mod retry;
pub use retry::ResourceExhaustedRetry;

pub use tonic::Status;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Implementers of the trait execute batches of L2 transactions on top of a state root.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait Executor: Send + Sync {
    /// Processes the batch of a fork before etrog. Executor and ROM level errors are reported in
    /// the response, the error variant only covers the transport.
    async fn process_batch(
        &self,
        request: ProcessBatchRequest,
    ) -> Result<ProcessBatchResponse, ExecutorClientError>;

    /// Processes the batch of the request. Executor and ROM level errors are reported in the
    /// response, the error variant only covers the transport.
    async fn process_batch_v2(
        &self,
        request: ProcessBatchRequestV2,
    ) -> Result<ProcessBatchResponseV2, ExecutorClientError>;
}
