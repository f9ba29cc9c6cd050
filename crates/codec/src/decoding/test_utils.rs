use crate::{decoding::transaction::LegacyTransaction, L2TxRaw, RawTransaction};

use alloy_primitives::{Address, TxKind, B256, U256};

/// Returns a signed-looking transaction record derived from `seed` with `input_len` bytes of call
/// data.
pub(crate) fn random_tx(seed: u8, input_len: usize) -> L2TxRaw {
    let body = LegacyTransaction {
        nonce: seed as u64,
        gas_price: U256::from(1_000_000_000u64),
        gas_limit: 21_000 + input_len as u64 * 16,
        to: TxKind::Call(Address::repeat_byte(seed.wrapping_add(1))),
        value: U256::from(seed),
        input: vec![seed; input_len].into(),
        chain_id: Some(1_101),
    };
    let tx = RawTransaction::new(
        body.unsigned_rlp(),
        B256::repeat_byte(seed.wrapping_add(0x10)),
        B256::repeat_byte(seed.wrapping_add(0x20)),
        27 + seed % 2,
    );
    L2TxRaw::new(tx, seed.wrapping_mul(37))
}
