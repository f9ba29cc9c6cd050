//! Derivation of the leaf keys of the state tree.
//!
//! A key is the Poseidon hash of the account address split in 32-bit limbs, the leaf type and a
//! capacity. The capacity is the hash of zeros, except for storage leaves where it is the hash of
//! the storage slot.

use alloy_primitives::{Address, U256};
use plonky2::{
    field::{
        goldilocks_field::GoldilocksField,
        types::{Field, PrimeField64},
    },
    hash::poseidon::{Poseidon, SPONGE_WIDTH},
};
use std::fmt;

pub(crate) type F = GoldilocksField;

/// Poseidon hash of zeros, the capacity of every non storage key.
const HASH_ZEROS: [u64; 4] =
    [4330397376401421145, 14124799381142128323, 8742572140681234676, 14345658006221440202];

/// The type of a leaf of the state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafType {
    /// The balance of an account.
    Balance = 0,
    /// The nonce of an account.
    Nonce = 1,
    /// The hash of the bytecode of a contract.
    CodeHash = 2,
    /// A storage slot of a contract.
    Storage = 3,
    /// The length of the bytecode of a contract.
    CodeLength = 4,
}

/// The key of a leaf of the state tree, as four field elements.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key(pub [u64; 4]);

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:016x}{:016x}{:016x}{:016x})", self.0[3], self.0[2], self.0[1], self.0[0])
    }
}

impl Key {
    /// Returns the key of the account leaf of the provided type.
    ///
    /// # Panics
    ///
    /// Panics for [`LeafType::Storage`], use [`Key::storage`] instead.
    pub fn account(address: Address, leaf: LeafType) -> Self {
        assert_ne!(leaf, LeafType::Storage, "storage keys need a slot");
        Self::derive(address, leaf, HASH_ZEROS.map(F::from_canonical_u64))
    }

    /// Returns the key of the balance leaf.
    pub fn balance(address: Address) -> Self {
        Self::account(address, LeafType::Balance)
    }

    /// Returns the key of the nonce leaf.
    pub fn nonce(address: Address) -> Self {
        Self::account(address, LeafType::Nonce)
    }

    /// Returns the key of the code hash leaf.
    pub fn code_hash(address: Address) -> Self {
        Self::account(address, LeafType::CodeHash)
    }

    /// Returns the key of the code length leaf.
    pub fn code_length(address: Address) -> Self {
        Self::account(address, LeafType::CodeLength)
    }

    /// Returns the key of the storage slot leaf.
    pub fn storage(address: Address, slot: U256) -> Self {
        let mut input = [F::ZERO; SPONGE_WIDTH];
        input[..8].copy_from_slice(&u256_to_limbs(slot));
        let capacity = F::poseidon(input);
        Self::derive(address, LeafType::Storage, [capacity[0], capacity[1], capacity[2], capacity[3]])
    }

    fn derive(address: Address, leaf: LeafType, capacity: [F; 4]) -> Self {
        let mut input = [F::ZERO; SPONGE_WIDTH];
        // little endian 32-bit limbs of the address.
        for (i, chunk) in address.0.rchunks_exact(4).enumerate() {
            input[i] = F::from_canonical_u32(u32::from_be_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3],
            ]));
        }
        input[6] = F::from_canonical_u64(leaf as u64);
        input[8..].copy_from_slice(&capacity);

        let hash = F::poseidon(input);
        Self(std::array::from_fn(|i| hash[i].to_canonical_u64()))
    }
}

/// Splits the value in eight little endian 32-bit limbs.
pub(crate) fn u256_to_limbs(value: U256) -> [F; 8] {
    let limbs = value.as_limbs();
    std::array::from_fn(|i| F::from_canonical_u32((limbs[i / 2] >> (32 * (i % 2))) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_u256_to_limbs() {
        let value = U256::from_limbs([0x1111_1111_2222_2222, 0, 0, 0x3333_3333_4444_4444]);
        let limbs = u256_to_limbs(value).map(|f| f.to_canonical_u64());
        assert_eq!(limbs, [0x2222_2222, 0x1111_1111, 0, 0, 0, 0, 0x4444_4444, 0x3333_3333]);
    }

    #[test]
    fn test_hash_zeros_capacity() {
        let hash = F::poseidon([F::ZERO; SPONGE_WIDTH]);
        assert_eq!(std::array::from_fn(|i| hash[i].to_canonical_u64()), HASH_ZEROS);
    }

    /// The account key with the address limbs sliced from the front, as the zk_evm sparse Merkle
    /// trie does.
    fn sliced_account_key(address: Address, leaf: LeafType) -> Key {
        let mut input = [F::ZERO; SPONGE_WIDTH];
        for (i, limb) in input.iter_mut().take(5).enumerate() {
            let bytes = address.0[16 - 4 * i..20 - 4 * i].try_into().unwrap();
            *limb = F::from_canonical_u32(u32::from_be_bytes(bytes));
        }
        input[6] = F::from_canonical_u64(leaf as u64);
        input[8..].copy_from_slice(&HASH_ZEROS.map(F::from_canonical_u64));
        let hash = F::poseidon(input);
        Key(std::array::from_fn(|i| hash[i].to_canonical_u64()))
    }

    #[test]
    fn test_account_keys() {
        let address = address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063D");
        assert_eq!(
            Key::balance(address),
            Key([
                14833827758303204589,
                15154033943678652181,
                5489675274157668397,
                7250342125880245156
            ])
        );
        assert_eq!(
            Key::nonce(address),
            Key([9826549716036549093, 7656533782594608467, 2916584112647718050, 15738290437850430042])
        );
        assert_eq!(
            Key::code_hash(address),
            Key([
                13099547999657575639,
                17100868121915555187,
                18426210476946192342,
                6516291038427841476
            ])
        );
        assert_eq!(
            Key::code_length(address),
            Key([
                15681838971863816862,
                12588628120566036205,
                5537150240893360669,
                10726869413653880699
            ])
        );

        assert_eq!(
            Key::balance(Address::ZERO),
            Key([4780081339527584721, 1358826539524549225, 12674929448632311636, 4274838134175377275])
        );
        assert_eq!(
            Key::nonce(Address::ZERO),
            Key([3156633806357968798, 6188615232714631915, 3941656124474379431, 4517702366834416551])
        );

        for leaf in [LeafType::Balance, LeafType::Nonce, LeafType::CodeHash, LeafType::CodeLength] {
            assert_eq!(Key::account(address, leaf), sliced_account_key(address, leaf), "{leaf:?}");
        }
    }

    #[test]
    fn test_storage_keys() {
        let address = address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063D");
        assert_eq!(
            Key::storage(address, U256::ZERO),
            Key([
                11290741391613911318,
                8574463825814144169,
                12315685088897808735,
                2680710942916769956
            ])
        );
        assert_eq!(
            Key::storage(address, U256::from(1)),
            Key([
                11356793674744238698,
                6054368638941547688,
                14507011083981895994,
                12922293972224005004
            ])
        );
    }

    #[test]
    fn test_keys_are_distinct() {
        let address = address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063D");
        let other = address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063E");

        let keys = [
            Key::balance(address),
            Key::nonce(address),
            Key::code_hash(address),
            Key::code_length(address),
            Key::storage(address, U256::ZERO),
            Key::storage(address, U256::from(1)),
            Key::balance(other),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(Key::balance(address), Key::balance(address));
    }

    #[test]
    #[should_panic(expected = "storage keys need a slot")]
    fn test_account_key_rejects_storage() {
        Key::account(Address::ZERO, LeafType::Storage);
    }
}
