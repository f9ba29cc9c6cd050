//! The resource accounting model of the proving backend.

use strum::{EnumIter, IntoEnumIterator};

/// A resource dimension tracked by the prover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, derive_more::Display)]
pub enum ZkCounter {
    /// Cumulative gas used.
    #[display("gas")]
    Gas,
    /// Keccak hashes.
    #[display("keccak_hashes")]
    KeccakHashes,
    /// Poseidon hashes.
    #[display("poseidon_hashes")]
    PoseidonHashes,
    /// Poseidon paddings.
    #[display("poseidon_paddings")]
    PoseidonPaddings,
    /// Memory aligns.
    #[display("mem_aligns")]
    MemAligns,
    /// Arithmetic operations.
    #[display("arithmetics")]
    Arithmetics,
    /// Binary operations.
    #[display("binaries")]
    Binaries,
    /// Main state machine steps.
    #[display("steps")]
    Steps,
    /// Sha256 hashes, zero before feijoa.
    #[display("sha256_hashes")]
    Sha256Hashes,
}

/// Per-batch usage of the prover resources.
///
/// Counters are monotonically non-decreasing while transactions are added to an open batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ZkCounters {
    /// Cumulative gas used.
    pub gas_used: u64,
    /// Keccak hashes.
    pub keccak_hashes: u32,
    /// Poseidon hashes.
    pub poseidon_hashes: u32,
    /// Poseidon paddings.
    pub poseidon_paddings: u32,
    /// Memory aligns.
    pub mem_aligns: u32,
    /// Arithmetic operations.
    pub arithmetics: u32,
    /// Binary operations.
    pub binaries: u32,
    /// Main state machine steps.
    pub steps: u32,
    /// Sha256 hashes.
    pub sha256_hashes: u32,
}

impl ZkCounters {
    /// The length of the big endian encoding of the counters.
    pub const BYTES_LENGTH: usize = 8 + 4 * 8;

    /// Returns the value of the provided counter.
    pub const fn get(&self, counter: ZkCounter) -> u64 {
        match counter {
            ZkCounter::Gas => self.gas_used,
            ZkCounter::KeccakHashes => self.keccak_hashes as u64,
            ZkCounter::PoseidonHashes => self.poseidon_hashes as u64,
            ZkCounter::PoseidonPaddings => self.poseidon_paddings as u64,
            ZkCounter::MemAligns => self.mem_aligns as u64,
            ZkCounter::Arithmetics => self.arithmetics as u64,
            ZkCounter::Binaries => self.binaries as u64,
            ZkCounter::Steps => self.steps as u64,
            ZkCounter::Sha256Hashes => self.sha256_hashes as u64,
        }
    }

    /// Returns true if every counter is at or below the configured maximum.
    pub fn is_within_constraints(&self, constraints: &BatchConstraints) -> bool {
        self.first_exceeded(constraints).is_none()
    }

    /// Returns the first counter above its configured maximum, if any.
    pub fn first_exceeded(&self, constraints: &BatchConstraints) -> Option<ZkCounter> {
        ZkCounter::iter().find(|counter| self.get(*counter) > constraints.max(*counter))
    }

    /// Returns the element-wise saturating sum of both counters.
    pub const fn sum(&self, other: &Self) -> Self {
        Self {
            gas_used: self.gas_used.saturating_add(other.gas_used),
            keccak_hashes: self.keccak_hashes.saturating_add(other.keccak_hashes),
            poseidon_hashes: self.poseidon_hashes.saturating_add(other.poseidon_hashes),
            poseidon_paddings: self.poseidon_paddings.saturating_add(other.poseidon_paddings),
            mem_aligns: self.mem_aligns.saturating_add(other.mem_aligns),
            arithmetics: self.arithmetics.saturating_add(other.arithmetics),
            binaries: self.binaries.saturating_add(other.binaries),
            steps: self.steps.saturating_add(other.steps),
            sha256_hashes: self.sha256_hashes.saturating_add(other.sha256_hashes),
        }
    }

    /// Subtracts `other` from the counters, returning the first counter that would underflow.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, ZkCounter> {
        let sub = |counter: ZkCounter| {
            self.get(counter).checked_sub(other.get(counter)).ok_or(counter)
        };
        Ok(Self {
            gas_used: sub(ZkCounter::Gas)?,
            keccak_hashes: sub(ZkCounter::KeccakHashes)? as u32,
            poseidon_hashes: sub(ZkCounter::PoseidonHashes)? as u32,
            poseidon_paddings: sub(ZkCounter::PoseidonPaddings)? as u32,
            mem_aligns: sub(ZkCounter::MemAligns)? as u32,
            arithmetics: sub(ZkCounter::Arithmetics)? as u32,
            binaries: sub(ZkCounter::Binaries)? as u32,
            steps: sub(ZkCounter::Steps)? as u32,
            sha256_hashes: sub(ZkCounter::Sha256Hashes)? as u32,
        })
    }

    /// Returns the big endian encoding of the counters, in [`ZkCounter`] order.
    pub fn to_be_bytes(&self) -> [u8; Self::BYTES_LENGTH] {
        let mut bytes = [0u8; Self::BYTES_LENGTH];
        bytes[..8].copy_from_slice(&self.gas_used.to_be_bytes());
        for (i, counter) in ZkCounter::iter().skip(1).enumerate() {
            let offset = 8 + i * 4;
            bytes[offset..offset + 4].copy_from_slice(&(self.get(counter) as u32).to_be_bytes());
        }
        bytes
    }

    /// Decodes the counters from their big endian encoding. Returns [`None`] on a length mismatch.
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::BYTES_LENGTH {
            return None
        }
        let word = |i: usize| {
            let offset = 8 + i * 4;
            u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
        };
        let mut gas = [0u8; 8];
        gas.copy_from_slice(&bytes[..8]);

        Some(Self {
            gas_used: u64::from_be_bytes(gas),
            keccak_hashes: word(0),
            poseidon_hashes: word(1),
            poseidon_paddings: word(2),
            mem_aligns: word(3),
            arithmetics: word(4),
            binaries: word(5),
            steps: word(6),
            sha256_hashes: word(7),
        })
    }
}

/// Returns true if every counter is at or below the maximum configured in `constraints`.
pub fn is_within_constraints(counters: &ZkCounters, constraints: &BatchConstraints) -> bool {
    counters.is_within_constraints(constraints)
}

/// The maximum resources a batch may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConstraints {
    /// Maximum number of transactions in a batch.
    pub max_txs_per_batch: u64,
    /// Maximum size of the encoded batch.
    pub max_batch_bytes_size: u64,
    /// Maximum cumulative gas used.
    pub max_cumulative_gas_used: u64,
    /// Maximum keccak hashes.
    pub max_keccak_hashes: u32,
    /// Maximum poseidon hashes.
    pub max_poseidon_hashes: u32,
    /// Maximum poseidon paddings.
    pub max_poseidon_paddings: u32,
    /// Maximum memory aligns.
    pub max_mem_aligns: u32,
    /// Maximum arithmetic operations.
    pub max_arithmetics: u32,
    /// Maximum binary operations.
    pub max_binaries: u32,
    /// Maximum main state machine steps.
    pub max_steps: u32,
    /// Maximum sha256 hashes.
    pub max_sha256_hashes: u32,
}

impl BatchConstraints {
    /// Returns the maximum configured for the provided counter.
    pub const fn max(&self, counter: ZkCounter) -> u64 {
        match counter {
            ZkCounter::Gas => self.max_cumulative_gas_used,
            ZkCounter::KeccakHashes => self.max_keccak_hashes as u64,
            ZkCounter::PoseidonHashes => self.max_poseidon_hashes as u64,
            ZkCounter::PoseidonPaddings => self.max_poseidon_paddings as u64,
            ZkCounter::MemAligns => self.max_mem_aligns as u64,
            ZkCounter::Arithmetics => self.max_arithmetics as u64,
            ZkCounter::Binaries => self.max_binaries as u64,
            ZkCounter::Steps => self.max_steps as u64,
            ZkCounter::Sha256Hashes => self.max_sha256_hashes as u64,
        }
    }

    /// Returns true if the counters fit within the configured maxima.
    pub fn is_zk_counters_within(&self, counters: &ZkCounters) -> bool {
        counters.is_within_constraints(self)
    }

    /// Returns the [`BatchResources`] available to an empty batch.
    pub const fn as_resources(&self) -> BatchResources {
        BatchResources {
            zk_counters: ZkCounters {
                gas_used: self.max_cumulative_gas_used,
                keccak_hashes: self.max_keccak_hashes,
                poseidon_hashes: self.max_poseidon_hashes,
                poseidon_paddings: self.max_poseidon_paddings,
                mem_aligns: self.max_mem_aligns,
                arithmetics: self.max_arithmetics,
                binaries: self.max_binaries,
                steps: self.max_steps,
                sha256_hashes: self.max_sha256_hashes,
            },
            bytes: self.max_batch_bytes_size,
        }
    }
}

impl Default for BatchConstraints {
    fn default() -> Self {
        Self {
            max_txs_per_batch: 300,
            max_batch_bytes_size: 120_000,
            max_cumulative_gas_used: 1_125_899_906_842_624,
            max_keccak_hashes: 2_145,
            max_poseidon_hashes: 252_357,
            max_poseidon_paddings: 135_191,
            max_mem_aligns: 236_585,
            max_arithmetics: 236_585,
            max_binaries: 473_170,
            max_steps: 7_570_538,
            max_sha256_hashes: 1_596,
        }
    }
}

/// The resources used by, or remaining for, a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BatchResources {
    /// The prover counters.
    pub zk_counters: ZkCounters,
    /// The size of the encoded batch data.
    pub bytes: u64,
}

/// A resource that would overflow when subtracting [`BatchResources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResourceOverflow {
    /// A prover counter overflowed.
    #[error("{0} counter overflow")]
    Counter(ZkCounter),
    /// The batch bytes overflowed.
    #[error("batch bytes overflow")]
    Bytes,
}

impl BatchResources {
    /// Subtracts `other` from the remaining resources in place. On overflow, the resources are left
    /// untouched and the overflowing resource is returned.
    pub fn sub(&mut self, other: &Self) -> Result<(), ResourceOverflow> {
        let bytes = self.bytes.checked_sub(other.bytes).ok_or(ResourceOverflow::Bytes)?;
        let zk_counters =
            self.zk_counters.checked_sub(&other.zk_counters).map_err(ResourceOverflow::Counter)?;
        self.bytes = bytes;
        self.zk_counters = zk_counters;
        Ok(())
    }

    /// Returns true if the resources fit within the constraints.
    pub fn fits(&self, constraints: &BatchConstraints) -> bool {
        self.bytes <= constraints.max_batch_bytes_size &&
            self.zk_counters.is_within_constraints(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_max(constraints: &BatchConstraints) -> ZkCounters {
        constraints.as_resources().zk_counters
    }

    #[test]
    fn test_counters_at_maximum_are_within_constraints() {
        let constraints = BatchConstraints::default();
        assert!(is_within_constraints(&at_max(&constraints), &constraints));
        assert!(is_within_constraints(&ZkCounters::default(), &constraints));
    }

    #[test]
    fn test_single_counter_past_maximum_fails_the_check() {
        let constraints = BatchConstraints::default();

        for counter in ZkCounter::iter() {
            let mut counters = at_max(&constraints);
            match counter {
                ZkCounter::Gas => counters.gas_used += 1,
                ZkCounter::KeccakHashes => counters.keccak_hashes += 1,
                ZkCounter::PoseidonHashes => counters.poseidon_hashes += 1,
                ZkCounter::PoseidonPaddings => counters.poseidon_paddings += 1,
                ZkCounter::MemAligns => counters.mem_aligns += 1,
                ZkCounter::Arithmetics => counters.arithmetics += 1,
                ZkCounter::Binaries => counters.binaries += 1,
                ZkCounter::Steps => counters.steps += 1,
                ZkCounter::Sha256Hashes => counters.sha256_hashes += 1,
            }

            assert!(!counters.is_within_constraints(&constraints), "{counter} should overflow");
            assert_eq!(counters.first_exceeded(&constraints), Some(counter));
        }
    }

    #[test]
    fn test_single_counter_past_maximum_with_others_at_zero() {
        let constraints = BatchConstraints::default();
        let counters = ZkCounters { steps: constraints.max_steps + 1, ..Default::default() };
        assert!(!counters.is_within_constraints(&constraints));
    }

    #[test]
    fn test_resources_sub_reports_overflowing_resource() {
        let mut remaining = BatchResources {
            zk_counters: ZkCounters { keccak_hashes: 10, steps: 100, ..Default::default() },
            bytes: 50,
        };

        let used = BatchResources {
            zk_counters: ZkCounters { keccak_hashes: 4, steps: 40, ..Default::default() },
            bytes: 20,
        };
        remaining.sub(&used).unwrap();
        assert_eq!(remaining.bytes, 30);
        assert_eq!(remaining.zk_counters.keccak_hashes, 6);

        let too_many_keccaks = BatchResources {
            zk_counters: ZkCounters { keccak_hashes: 7, ..Default::default() },
            bytes: 1,
        };
        assert_eq!(
            remaining.sub(&too_many_keccaks),
            Err(ResourceOverflow::Counter(ZkCounter::KeccakHashes))
        );
        // untouched on overflow.
        assert_eq!(remaining.bytes, 30);

        let too_many_bytes = BatchResources { bytes: 31, ..Default::default() };
        assert_eq!(remaining.sub(&too_many_bytes), Err(ResourceOverflow::Bytes));
    }

    #[test]
    fn test_counters_bytes_encoding() {
        let counters = ZkCounters {
            gas_used: u64::MAX - 1,
            keccak_hashes: 1,
            poseidon_hashes: 2,
            poseidon_paddings: 3,
            mem_aligns: 4,
            arithmetics: 5,
            binaries: 6,
            steps: 7,
            sha256_hashes: 8,
        };
        let bytes = counters.to_be_bytes();
        assert_eq!(ZkCounters::from_be_bytes(&bytes), Some(counters));
        assert_eq!(ZkCounters::from_be_bytes(&bytes[1..]), None);
    }

    #[test]
    fn test_counters_sum() {
        let a = ZkCounters { gas_used: 10, steps: 5, ..Default::default() };
        let b = ZkCounters { gas_used: 1, steps: u32::MAX, ..Default::default() };
        let sum = a.sum(&b);
        assert_eq!(sum.gas_used, 11);
        assert_eq!(sum.steps, u32::MAX);
    }
}
