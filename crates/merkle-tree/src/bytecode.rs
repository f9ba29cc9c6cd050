use crate::key::F;

use alloy_primitives::{B256, U256};
use plonky2::{
    field::types::{Field, PrimeField64},
    hash::poseidon::{Poseidon, SPONGE_CAPACITY, SPONGE_RATE, SPONGE_WIDTH},
};

/// The bytes of a field element absorbed by the bytecode sponge.
const BYTES_PER_ELEMENT: usize = 7;

/// The length of a block absorbed by the sponge.
const BLOCK_LENGTH: usize = SPONGE_RATE * BYTES_PER_ELEMENT;

/// The hash of an empty bytecode.
pub const EMPTY_CODE_HASH: B256 = B256::new(u256_be_bytes([
    10052403398432742521,
    15195891732843337299,
    2019258788108304834,
    4300613462594703212,
]));

const fn u256_be_bytes(limbs: [u64; 4]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 4 {
        let bytes = limbs[3 - i].to_be_bytes();
        let mut j = 0;
        while j < 8 {
            out[i * 8 + j] = bytes[j];
            j += 1;
        }
        i += 1;
    }
    out
}

/// Hashes contract bytecode with the Poseidon sponge: the code is padded with `0x01` to a multiple
/// of 56 bytes, the last byte gets its high bit set and each 56 bytes block is absorbed as eight
/// little endian 7-byte elements.
pub fn hash_contract_bytecode(code: &[u8]) -> B256 {
    let mut padded = Vec::with_capacity(code.len() + BLOCK_LENGTH);
    padded.extend_from_slice(code);
    padded.push(0x01);
    padded.resize(padded.len().next_multiple_of(BLOCK_LENGTH), 0);
    if let Some(last) = padded.last_mut() {
        *last |= 0x80;
    }

    let mut capacity = [F::ZERO; SPONGE_CAPACITY];
    let mut state = [F::ZERO; SPONGE_WIDTH];
    for block in padded.chunks_exact(BLOCK_LENGTH) {
        for (element, bytes) in state.iter_mut().zip(block.chunks_exact(BYTES_PER_ELEMENT)) {
            let mut le = [0u8; 8];
            le[..BYTES_PER_ELEMENT].copy_from_slice(bytes);
            *element = F::from_canonical_u64(u64::from_le_bytes(le));
        }
        state[SPONGE_RATE..].copy_from_slice(&capacity);
        let hash = F::poseidon(state);
        capacity.copy_from_slice(&hash[..SPONGE_CAPACITY]);
    }

    U256::from_limbs(capacity.map(|element| element.to_canonical_u64())).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_hash() {
        assert_eq!(hash_contract_bytecode(&[]), EMPTY_CODE_HASH);
    }

    #[test]
    fn test_padding_boundaries() {
        // 55 bytes plus the 0x01 pad fill exactly one block, 56 bytes need a second one.
        let one_block = hash_contract_bytecode(&[0x60; 55]);
        let two_blocks = hash_contract_bytecode(&[0x60; 56]);
        assert_ne!(one_block, two_blocks);
        assert_ne!(one_block, EMPTY_CODE_HASH);
        assert_eq!(one_block, hash_contract_bytecode(&[0x60; 55]));
    }
}
