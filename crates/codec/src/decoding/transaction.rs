use crate::{error::DecodingError, L2TxRaw, RawTransaction};

use alloy_primitives::{bytes::BufMut, keccak256, Bytes, TxKind, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header};

/// The fields of a legacy transaction, as carried by the RLP list of a batch record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// The sender's nonce.
    pub nonce: u64,
    /// The declared gas price.
    pub gas_price: U256,
    /// The gas limit.
    pub gas_limit: u64,
    /// The recipient, or [`TxKind::Create`].
    pub to: TxKind,
    /// The transferred value.
    pub value: U256,
    /// The call data.
    pub input: Bytes,
    /// The EIP-155 chain id, if the transaction is replay protected.
    pub chain_id: Option<u64>,
}

impl LegacyTransaction {
    fn fields_len(&self) -> usize {
        self.nonce.length() +
            self.gas_price.length() +
            self.gas_limit.length() +
            self.to.length() +
            self.value.length() +
            self.input.length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
    }

    fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self {
            nonce: Decodable::decode(buf)?,
            gas_price: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            to: Decodable::decode(buf)?,
            value: Decodable::decode(buf)?,
            input: Decodable::decode(buf)?,
            chain_id: None,
        })
    }

    fn eip155_fields_len(&self) -> usize {
        // chain id followed by two empty values.
        self.chain_id.map(|id| id.length() + 2).unwrap_or_default()
    }

    /// Encodes the unsigned transaction: the RLP list a batch record starts with.
    pub fn encode_unsigned(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.fields_len() + self.eip155_fields_len() }
            .encode(out);
        self.encode_fields(out);
        if let Some(chain_id) = self.chain_id {
            chain_id.encode(out);
            0u8.encode(out);
            0u8.encode(out);
        }
    }

    /// Returns the unsigned RLP encoding of the transaction.
    pub fn unsigned_rlp(&self) -> Bytes {
        let mut out = Vec::new();
        self.encode_unsigned(&mut out);
        out.into()
    }

    /// Returns the hash signed by the sender.
    pub fn signature_hash(&self) -> B256 {
        keccak256(self.unsigned_rlp())
    }

    /// Decodes the unsigned RLP list of a batch record.
    pub fn decode_unsigned(data: &[u8]) -> Result<Self, DecodingError> {
        let mut buf = data;
        let mut body = list_payload(&mut buf)?;

        let mut tx = Self::decode_fields(&mut body)?;
        if !body.is_empty() {
            tx.chain_id = Some(u64::decode(&mut body)?);
            for _ in 0..2 {
                let value = u64::decode(&mut body)?;
                if value != 0 {
                    return Err(DecodingError::NonZeroEip155Placeholder { value })
                }
            }
        }
        if !body.is_empty() || !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into())
        }

        Ok(tx)
    }
}

/// A legacy transaction with its EIP-155 signature, as returned by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLegacyTransaction {
    /// The transaction fields.
    pub tx: LegacyTransaction,
    /// The `v` value, carrying the chain id for replay protected transactions.
    pub v: u64,
    /// The `r` value of the signature.
    pub r: U256,
    /// The `s` value of the signature.
    pub s: U256,
}

impl SignedLegacyTransaction {
    fn payload_len(&self) -> usize {
        self.tx.fields_len() + self.v.length() + self.r.length() + self.s.length()
    }

    /// Encodes the signed transaction.
    pub fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_len() }.encode(out);
        self.tx.encode_fields(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    /// Returns the transaction hash.
    pub fn hash(&self) -> B256 {
        let mut out = Vec::new();
        self.encode(&mut out);
        keccak256(out)
    }

    /// Decodes a signed legacy transaction, deriving the chain id from `v`.
    pub fn decode(data: &[u8]) -> Result<Self, DecodingError> {
        let mut buf = data;
        let mut body = list_payload(&mut buf)?;

        let mut tx = LegacyTransaction::decode_fields(&mut body)?;
        let v = u64::decode(&mut body)?;
        let r = U256::decode(&mut body)?;
        let s = U256::decode(&mut body)?;
        if !body.is_empty() || !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into())
        }
        tx.chain_id = (v >= 35).then(|| (v - 35) / 2);

        Ok(Self { tx, v, r, s })
    }

    /// Returns the `y` parity of the signature.
    pub const fn y_parity(&self) -> u8 {
        let parity = if self.v >= 35 { (self.v - 35) % 2 } else { self.v.saturating_sub(27) % 2 };
        parity as u8
    }

    /// Converts the transaction into a batch record, with the signature `v` normalized to
    /// 27 or 28.
    pub fn to_l2_tx(&self, efficiency_percentage: u8) -> L2TxRaw {
        let tx = RawTransaction::new(
            self.tx.unsigned_rlp(),
            B256::from(self.r.to_be_bytes::<32>()),
            B256::from(self.s.to_be_bytes::<32>()),
            27 + self.y_parity(),
        );
        L2TxRaw::new(tx, efficiency_percentage)
    }
}

/// Advances the buffer past a RLP list and returns the list payload.
fn list_payload<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodingError> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString.into())
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into())
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload)
}
