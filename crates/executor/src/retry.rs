use crate::{
    Executor, ExecutorClientError, ProcessBatchRequest, ProcessBatchRequestV2,
    ProcessBatchResponse, ProcessBatchResponseV2,
};
use std::{future::Future, time::Duration};

/// An [`Executor`] retrying the calls refused by the inner executor for lack of resources.
#[derive(Debug, Clone)]
pub struct ResourceExhaustedRetry<E> {
    inner: E,
    max_attempts: usize,
    delay: Duration,
}

impl<E> ResourceExhaustedRetry<E> {
    /// The default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
    /// The default delay between two attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Wraps the executor with the default retry policy.
    pub const fn new(inner: E) -> Self {
        Self::with_policy(inner, Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }

    /// Wraps the executor, making at most `max_attempts` calls per request.
    pub const fn with_policy(inner: E, max_attempts: usize, delay: Duration) -> Self {
        Self { inner, max_attempts, delay }
    }

    /// Returns the wrapped executor.
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    async fn retry<T, Fut>(
        &self,
        context_id: &str,
        call: impl Fn() -> Fut,
    ) -> Result<T, ExecutorClientError>
    where
        Fut: Future<Output = Result<T, ExecutorClientError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Err(err) if err.is_resource_exhausted() && attempt < self.max_attempts => {
                    tracing::debug!(target: "zkevm::executor", attempt, %context_id, "executor resources exhausted, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                }
                res => return res,
            }
        }
    }
}

#[async_trait::async_trait]
impl<E: Executor> Executor for ResourceExhaustedRetry<E> {
    async fn process_batch(
        &self,
        request: ProcessBatchRequest,
    ) -> Result<ProcessBatchResponse, ExecutorClientError> {
        self.retry(&request.context_id, || self.inner.process_batch(request.clone())).await
    }

    async fn process_batch_v2(
        &self,
        request: ProcessBatchRequestV2,
    ) -> Result<ProcessBatchResponseV2, ExecutorClientError> {
        self.retry(&request.context_id, || self.inner.process_batch_v2(request.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockExecutor;

    fn exhausted() -> ExecutorClientError {
        tonic::Status::resource_exhausted("busy").into()
    }

    #[tokio::test]
    async fn test_retries_resource_exhausted() -> eyre::Result<()> {
        let mock = MockExecutor::default();
        mock.push_error(exhausted());
        mock.push_error(exhausted());
        mock.push_response(MockExecutor::success_response(3));

        let executor = ResourceExhaustedRetry::with_policy(&mock, 3, Duration::ZERO);
        let response = executor.process_batch_v2(ProcessBatchRequestV2::default()).await?;

        assert_eq!(response.new_batch_num, 3);
        assert_eq!(mock.requests().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mock = MockExecutor::default();
        for _ in 0..3 {
            mock.push_error(exhausted());
        }

        let executor = ResourceExhaustedRetry::with_policy(&mock, 2, Duration::ZERO);
        let err = executor.process_batch_v2(ProcessBatchRequestV2::default()).await.unwrap_err();

        assert!(err.is_resource_exhausted());
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_retries_pre_etrog_requests() -> eyre::Result<()> {
        let mock = MockExecutor::default();
        mock.push_pre_etrog_error(exhausted());

        let executor = ResourceExhaustedRetry::with_policy(&mock, 3, Duration::ZERO);
        let request = ProcessBatchRequest { old_batch_num: 4, ..Default::default() };
        let response = executor.process_batch(request).await?;

        assert_eq!(response.new_batch_num, 5);
        assert_eq!(mock.pre_etrog_requests().len(), 2);
        assert!(mock.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mock = MockExecutor::default();
        mock.push_error(tonic::Status::unavailable("down").into());

        let executor = ResourceExhaustedRetry::with_policy(&mock, 5, Duration::ZERO);
        assert!(executor.process_batch_v2(ProcessBatchRequestV2::default()).await.is_err());
        assert_eq!(mock.requests().len(), 1);
    }
}
