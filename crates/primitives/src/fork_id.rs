/// The fork id introducing the dragonfruit upgrade, the first one with efficiency percentages in
/// the legacy batch encoding.
pub const FORK_ID_DRAGONFRUIT: u64 = 5;

/// The fork id introducing the etrog upgrade: L2 block headers in the batch data, L1 info tree
/// roots instead of global exit roots and timestamp limits.
pub const FORK_ID_ETROG: u64 = 7;

/// The fork id introducing the feijoa upgrade and its sha256 counters.
pub const FORK_ID_FEIJOA: u64 = 10;

/// A protocol version active for an inclusive range of batch numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ForkIdInterval {
    /// The first batch number of the interval.
    pub from_batch_number: u64,
    /// The last batch number of the interval.
    pub to_batch_number: u64,
    /// The fork id.
    pub fork_id: u64,
    /// The human readable version of the fork.
    pub version: String,
    /// The L1 block number at which the fork was activated.
    pub block_number: u64,
}

impl ForkIdInterval {
    /// Returns a new instance of [`ForkIdInterval`].
    pub fn new(
        from_batch_number: u64,
        to_batch_number: u64,
        fork_id: u64,
        version: impl Into<String>,
        block_number: u64,
    ) -> Self {
        Self { from_batch_number, to_batch_number, fork_id, version: version.into(), block_number }
    }

    /// Returns true if the batch number falls in the interval.
    pub const fn contains(&self, batch_number: u64) -> bool {
        self.from_batch_number <= batch_number && batch_number <= self.to_batch_number
    }
}
