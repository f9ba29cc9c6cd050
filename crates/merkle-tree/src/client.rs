use crate::{
    proto::{Fea, GetProgramRequest, GetProgramResponse, GetRequest, GetResponse},
    HashDb, HashDbError, Key,
};

use alloy_primitives::{hex, Bytes, B256, U256};
use std::time::{Duration, Instant};
use tonic::{
    client::Grpc,
    codec::ProstCodec,
    codegen::http::uri::PathAndQuery,
    transport::{Channel, Endpoint},
};

const GET_PATH: &str = "/hashdb.v1.HashDBService/Get";
const GET_PROGRAM_PATH: &str = "/hashdb.v1.HashDBService/GetProgram";

/// The interval between two connection attempts.
const DIAL_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// The number of field elements of a leaf value.
const VALUE_ELEMENTS: usize = 8;

/// The hex length of a field element of a leaf value.
const ELEMENT_HEX_LENGTH: usize = 16;

/// The configuration of the [`GrpcHashDbClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDbClientConfig {
    /// The URI of the hash db service.
    pub uri: String,
    /// How long to keep dialing the hash db at startup.
    pub dial_timeout: Duration,
}

impl Default for HashDbClientConfig {
    fn default() -> Self {
        Self { uri: "http://127.0.0.1:50061".to_string(), dial_timeout: Duration::from_secs(5 * 60) }
    }
}

/// A client of the `hashdb.v1.HashDBService` gRPC service.
#[derive(Debug, Clone)]
pub struct GrpcHashDbClient {
    inner: Grpc<Channel>,
}

impl GrpcHashDbClient {
    /// Connects to the hash db, retrying until the dial timeout of the configuration elapses.
    pub async fn connect(config: &HashDbClientConfig) -> Result<Self, HashDbError> {
        let endpoint = Endpoint::from_shared(config.uri.clone())
            .map_err(|_| HashDbError::InvalidUri(config.uri.clone()))?;

        let now = Instant::now();
        loop {
            match endpoint.connect().await {
                Ok(channel) => {
                    tracing::info!(target: "zkevm::merkle_tree", uri = %config.uri, elapsed = ?now.elapsed(), "connected to hash db");
                    return Ok(Self::new(channel))
                }
                Err(err) if now.elapsed() < config.dial_timeout => {
                    tracing::warn!(target: "zkevm::merkle_tree", uri = %config.uri, %err, "hash db not ready, retrying");
                    tokio::time::sleep(DIAL_RETRY_INTERVAL).await;
                }
                Err(source) => {
                    return Err(HashDbError::DialTimeout {
                        uri: config.uri.clone(),
                        timeout: config.dial_timeout,
                        source,
                    })
                }
            }
        }
    }

    /// Returns a new client over the provided channel.
    pub fn new(channel: Channel) -> Self {
        Self { inner: Grpc::new(channel) }
    }

    async fn ready(&self) -> Result<Grpc<Channel>, HashDbError> {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|err| tonic::Status::unknown(format!("hash db service not ready: {err}")))?;
        Ok(grpc)
    }
}

#[async_trait::async_trait]
impl HashDb for GrpcHashDbClient {
    async fn get(&self, root: B256, key: Key) -> Result<U256, HashDbError> {
        let request = GetRequest {
            root: Some(root_to_fea(root)),
            key: Some(key.0.into()),
            ..Default::default()
        };
        let response: GetResponse = self
            .ready()
            .await?
            .unary(tonic::Request::new(request), PathAndQuery::from_static(GET_PATH), ProstCodec::default())
            .await?
            .into_inner();

        HashDbError::from_result_code(response.result.map_or(0, |r| r.code))?;
        parse_value(&response.value)
    }

    async fn get_program(&self, code_hash: B256) -> Result<Bytes, HashDbError> {
        let request = GetProgramRequest { key: hex::encode(code_hash) };
        let response: GetProgramResponse = self
            .ready()
            .await?
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(GET_PROGRAM_PATH),
                ProstCodec::default(),
            )
            .await?
            .into_inner();

        HashDbError::from_result_code(response.result.map_or(0, |r| r.code))?;
        Ok(response.data.into())
    }
}

/// Splits the root in four little endian 64-bit limbs.
fn root_to_fea(root: B256) -> Fea {
    (*U256::from_be_bytes(root.0).as_limbs()).into()
}

/// Parses a leaf value made of eight hex encoded field elements, each holding 32 bits of the
/// value, least significant first. An empty string is a zero value.
fn parse_value(value: &str) -> Result<U256, HashDbError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    if value.is_empty() {
        return Ok(U256::ZERO)
    }
    if value.len() != VALUE_ELEMENTS * ELEMENT_HEX_LENGTH {
        return Err(HashDbError::MalformedValue(value.to_string()))
    }

    let mut scalar = U256::ZERO;
    for i in 0..VALUE_ELEMENTS {
        let element = value
            .get(i * ELEMENT_HEX_LENGTH..(i + 1) * ELEMENT_HEX_LENGTH)
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .ok_or_else(|| HashDbError::MalformedValue(value.to_string()))?;
        scalar += U256::from(element) << (32 * i);
    }
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() -> eyre::Result<()> {
        assert_eq!(parse_value("")?, U256::ZERO);

        let mut value = String::new();
        value.push_str("0000000000000002");
        value.push_str("0000000000000001");
        value.push_str(&"0".repeat(6 * ELEMENT_HEX_LENGTH));
        assert_eq!(parse_value(&value)?, U256::from(2u64 | (1u64 << 32)));

        let top = format!("{}{}", "0".repeat(7 * ELEMENT_HEX_LENGTH), "00000000ffffffff");
        assert_eq!(parse_value(&top)?, U256::from(0xffff_ffffu64) << 224);
        Ok(())
    }

    #[test]
    fn test_parse_malformed_value() {
        assert!(matches!(parse_value("1234"), Err(HashDbError::MalformedValue(_))));
        let not_hex = "z".repeat(VALUE_ELEMENTS * ELEMENT_HEX_LENGTH);
        assert!(matches!(parse_value(&not_hex), Err(HashDbError::MalformedValue(_))));
    }

    #[test]
    fn test_root_to_fea() {
        let root = B256::from(U256::from_limbs([1, 2, 3, 4]));
        assert_eq!(root_to_fea(root), Fea { fe0: 1, fe1: 2, fe2: 3, fe3: 4 });
    }
}
