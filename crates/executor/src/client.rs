use crate::{
    Executor, ExecutorClientError, ProcessBatchRequest, ProcessBatchRequestV2,
    ProcessBatchResponse, ProcessBatchResponseV2,
};

use std::time::{Duration, Instant};
use tonic::{
    client::Grpc,
    codec::ProstCodec,
    codegen::http::uri::PathAndQuery,
    transport::{Channel, Endpoint},
};

/// The path of the batch processing method before etrog.
const PROCESS_BATCH_PATH: &str = "/executor.v1.ExecutorService/ProcessBatch";
/// The path of the batch processing method.
const PROCESS_BATCH_V2_PATH: &str = "/executor.v1.ExecutorService/ProcessBatchV2";

/// The interval between two connection attempts.
const DIAL_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// The configuration of the [`GrpcExecutorClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorClientConfig {
    /// The URI of the executor service.
    pub uri: String,
    /// The maximum size of an encoded message, in bytes.
    pub max_grpc_message_size: usize,
    /// How long to keep dialing the executor at startup.
    pub dial_timeout: Duration,
}

impl Default for ExecutorClientConfig {
    fn default() -> Self {
        Self {
            uri: "http://127.0.0.1:50071".to_string(),
            max_grpc_message_size: 100_000_000,
            dial_timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// A client of the `executor.v1.ExecutorService` gRPC service.
#[derive(Debug, Clone)]
pub struct GrpcExecutorClient {
    inner: Grpc<Channel>,
}

impl GrpcExecutorClient {
    /// Connects to the executor, retrying until the dial timeout of the configuration elapses.
    pub async fn connect(config: &ExecutorClientConfig) -> Result<Self, ExecutorClientError> {
        let endpoint = Endpoint::from_shared(config.uri.clone())
            .map_err(|_| ExecutorClientError::InvalidUri(config.uri.clone()))?;

        let now = Instant::now();
        let channel = loop {
            match endpoint.connect().await {
                Ok(channel) => break channel,
                Err(err) if now.elapsed() < config.dial_timeout => {
                    tracing::warn!(target: "zkevm::executor", uri = %config.uri, %err, "executor not ready, retrying");
                    tokio::time::sleep(DIAL_RETRY_INTERVAL).await;
                }
                Err(source) => {
                    tracing::error!(target: "zkevm::executor", uri = %config.uri, %source, "failed to connect to executor");
                    return Err(ExecutorClientError::DialTimeout {
                        uri: config.uri.clone(),
                        timeout: config.dial_timeout,
                        source,
                    })
                }
            }
        };

        tracing::info!(target: "zkevm::executor", uri = %config.uri, elapsed = ?now.elapsed(), "connected to executor");
        Ok(Self::new(channel, config.max_grpc_message_size))
    }

    /// Returns a new client over the provided channel.
    pub fn new(channel: Channel, max_grpc_message_size: usize) -> Self {
        let inner = Grpc::new(channel)
            .max_decoding_message_size(max_grpc_message_size)
            .max_encoding_message_size(max_grpc_message_size);
        Self { inner }
    }

    async fn unary<Req, Res>(
        &self,
        request: Req,
        path: &'static str,
    ) -> Result<Res, ExecutorClientError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Res: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|err| tonic::Status::unknown(format!("executor service not ready: {err}")))?;

        let path = PathAndQuery::from_static(path);
        let response = grpc.unary(tonic::Request::new(request), path, ProstCodec::default()).await?;
        Ok(response.into_inner())
    }
}

#[async_trait::async_trait]
impl Executor for GrpcExecutorClient {
    async fn process_batch(
        &self,
        request: ProcessBatchRequest,
    ) -> Result<ProcessBatchResponse, ExecutorClientError> {
        self.unary(request, PROCESS_BATCH_PATH).await
    }

    async fn process_batch_v2(
        &self,
        request: ProcessBatchRequestV2,
    ) -> Result<ProcessBatchResponseV2, ExecutorClientError> {
        self.unary(request, PROCESS_BATCH_V2_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_uri() {
        let config = ExecutorClientConfig { uri: "not a uri".to_string(), ..Default::default() };
        assert!(matches!(
            GrpcExecutorClient::connect(&config).await,
            Err(ExecutorClientError::InvalidUri(_))
        ));
    }

    #[tokio::test]
    async fn test_dial_timeout() {
        // nothing listens on the discard port.
        let config = ExecutorClientConfig {
            uri: "http://127.0.0.1:9".to_string(),
            dial_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            GrpcExecutorClient::connect(&config).await,
            Err(ExecutorClientError::DialTimeout { timeout, .. }) if timeout.is_zero()
        ));
    }
}
