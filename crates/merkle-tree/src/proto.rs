//! Messages of the `hashdb.v1.HashDBService` gRPC service.

/// Four field elements: a root or a key of the tree.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub(crate) struct Fea {
    #[prost(uint64, tag = "1")]
    pub(crate) fe0: u64,
    #[prost(uint64, tag = "2")]
    pub(crate) fe1: u64,
    #[prost(uint64, tag = "3")]
    pub(crate) fe2: u64,
    #[prost(uint64, tag = "4")]
    pub(crate) fe3: u64,
}

impl From<[u64; 4]> for Fea {
    fn from([fe0, fe1, fe2, fe3]: [u64; 4]) -> Self {
        Self { fe0, fe1, fe2, fe3 }
    }
}

/// The status of a hash db call.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub(crate) struct ResultCode {
    #[prost(int32, tag = "1")]
    pub(crate) code: i32,
}

/// Request for the value of a leaf.
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct GetRequest {
    #[prost(message, optional, tag = "1")]
    pub(crate) root: Option<Fea>,
    #[prost(message, optional, tag = "2")]
    pub(crate) key: Option<Fea>,
    #[prost(uint64, tag = "3")]
    pub(crate) details: u64,
    #[prost(uint64, tag = "4")]
    pub(crate) get_db_read_log: u64,
}

/// The value of a leaf, as eight hex encoded field elements.
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct GetResponse {
    #[prost(string, tag = "1")]
    pub(crate) value: String,
    #[prost(message, optional, tag = "5")]
    pub(crate) result: Option<ResultCode>,
}

/// Request for a contract bytecode.
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct GetProgramRequest {
    /// The hex encoded code hash.
    #[prost(string, tag = "1")]
    pub(crate) key: String,
}

/// A contract bytecode.
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct GetProgramResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub(crate) data: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub(crate) result: Option<ResultCode>,
}
