//! Test utilities for the executor.

use crate::{
    Executor, ExecutorClientError, ExecutorError, ProcessBatchRequest, ProcessBatchRequestV2,
    ProcessBatchResponse, ProcessBatchResponseV2, RomError,
};

use parking_lot::Mutex;
use std::collections::VecDeque;

type Queue<T> = Mutex<VecDeque<Result<T, ExecutorClientError>>>;

/// An [`Executor`] replaying queued results and recording the received requests. Once the queue
/// is empty, every request succeeds with an empty batch on top of the requested one.
#[derive(Debug, Default)]
pub struct MockExecutor {
    results: Queue<ProcessBatchResponseV2>,
    requests: Mutex<Vec<ProcessBatchRequestV2>>,
    pre_etrog_results: Queue<ProcessBatchResponse>,
    pre_etrog_requests: Mutex<Vec<ProcessBatchRequest>>,
}

impl MockExecutor {
    /// Returns a successful response for the provided batch number.
    pub fn success_response(batch_number: u64) -> ProcessBatchResponseV2 {
        ProcessBatchResponseV2 {
            new_batch_num: batch_number,
            error: ExecutorError::NoError.code(),
            error_rom: RomError::NoError.code(),
            ..Default::default()
        }
    }

    /// Returns a successful pre-etrog response for the provided batch number.
    pub fn pre_etrog_success_response(batch_number: u64) -> ProcessBatchResponse {
        ProcessBatchResponse {
            new_batch_num: batch_number,
            error: ExecutorError::NoError.code(),
            ..Default::default()
        }
    }

    /// Queues a response.
    pub fn push_response(&self, response: ProcessBatchResponseV2) {
        self.results.lock().push_back(Ok(response));
    }

    /// Queues an error.
    pub fn push_error(&self, error: ExecutorClientError) {
        self.results.lock().push_back(Err(error));
    }

    /// Queues a pre-etrog response.
    pub fn push_pre_etrog_response(&self, response: ProcessBatchResponse) {
        self.pre_etrog_results.lock().push_back(Ok(response));
    }

    /// Queues a pre-etrog error.
    pub fn push_pre_etrog_error(&self, error: ExecutorClientError) {
        self.pre_etrog_results.lock().push_back(Err(error));
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ProcessBatchRequestV2> {
        self.requests.lock().clone()
    }

    /// Returns the pre-etrog requests received so far.
    pub fn pre_etrog_requests(&self) -> Vec<ProcessBatchRequest> {
        self.pre_etrog_requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl Executor for MockExecutor {
    async fn process_batch(
        &self,
        request: ProcessBatchRequest,
    ) -> Result<ProcessBatchResponse, ExecutorClientError> {
        let batch_number = request.old_batch_num + 1;
        self.pre_etrog_requests.lock().push(request);
        self.pre_etrog_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::pre_etrog_success_response(batch_number)))
    }

    async fn process_batch_v2(
        &self,
        request: ProcessBatchRequestV2,
    ) -> Result<ProcessBatchResponseV2, ExecutorClientError> {
        let batch_number = request.old_batch_num + 1;
        self.requests.lock().push(request);
        self.results.lock().pop_front().unwrap_or_else(|| Ok(Self::success_response(batch_number)))
    }
}
