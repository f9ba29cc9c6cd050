use rollup_node_primitives::ZkCounter;
use std::time::Duration;

/// An error returned by the executor for the whole request. No state transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// The executor did not set the error field.
    #[error("unspecified executor error")]
    Unspecified,
    /// The request was processed.
    #[error("no error")]
    NoError,
    /// The executor failed to access its database.
    #[error("executor database error")]
    DbError,
    /// Main state machine steps counter overflow.
    #[error("main state machine steps counter overflow")]
    CountersOverflowSteps,
    /// Main state machine keccak counter overflow.
    #[error("main state machine keccak counter overflow")]
    CountersOverflowKeccak,
    /// Main state machine binary counter overflow.
    #[error("main state machine binary counter overflow")]
    CountersOverflowBinary,
    /// Main state machine memory align counter overflow.
    #[error("main state machine memory align counter overflow")]
    CountersOverflowMem,
    /// Main state machine arith counter overflow.
    #[error("main state machine arith counter overflow")]
    CountersOverflowArith,
    /// Main state machine padding counter overflow.
    #[error("main state machine padding counter overflow")]
    CountersOverflowPadding,
    /// Main state machine poseidon counter overflow.
    #[error("main state machine poseidon counter overflow")]
    CountersOverflowPoseidon,
    /// The fork id of the request is not supported.
    #[error("unsupported fork id")]
    UnsupportedForkId,
    /// The balance of an account does not match the expected one.
    #[error("balance mismatch")]
    BalanceMismatch,
    /// A field element could not be converted to a scalar.
    #[error("field element to scalar conversion failed")]
    Fea2Scalar,
    /// A value could not be converted to 32 bits.
    #[error("32 bit conversion failed")]
    Tos32,
    /// The unsigned transaction of the request is invalid.
    #[error("invalid unsigned transaction")]
    InvalidUnsignedTx,
    /// Counters can only be skipped for unsigned transactions.
    #[error("no counters requested without an unsigned transaction")]
    InvalidNoCounters,
    /// Division by zero while recovering a signature.
    #[error("ecrecover division by zero")]
    ArithEcrecoverDivideByZero,
    /// An address is out of range.
    #[error("address out of range")]
    AddressOutOfRange,
    /// An address is negative.
    #[error("negative address")]
    AddressNegative,
    /// A storage key is invalid.
    #[error("invalid storage key")]
    StorageInvalidKey,
    /// A code not known to this node.
    #[error("unknown executor error {0}")]
    Unknown(i32),
}

impl ExecutorError {
    /// Returns the error of the provided wire code.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unspecified,
            1 => Self::NoError,
            2 => Self::DbError,
            3 => Self::CountersOverflowSteps,
            4 => Self::CountersOverflowKeccak,
            5 => Self::CountersOverflowBinary,
            6 => Self::CountersOverflowMem,
            7 => Self::CountersOverflowArith,
            8 => Self::CountersOverflowPadding,
            9 => Self::CountersOverflowPoseidon,
            10 => Self::UnsupportedForkId,
            11 => Self::BalanceMismatch,
            12 => Self::Fea2Scalar,
            13 => Self::Tos32,
            14 => Self::InvalidUnsignedTx,
            15 => Self::InvalidNoCounters,
            16 => Self::ArithEcrecoverDivideByZero,
            17 => Self::AddressOutOfRange,
            18 => Self::AddressNegative,
            19 => Self::StorageInvalidKey,
            code => Self::Unknown(code),
        }
    }

    /// Returns the wire code of the error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::NoError => 1,
            Self::DbError => 2,
            Self::CountersOverflowSteps => 3,
            Self::CountersOverflowKeccak => 4,
            Self::CountersOverflowBinary => 5,
            Self::CountersOverflowMem => 6,
            Self::CountersOverflowArith => 7,
            Self::CountersOverflowPadding => 8,
            Self::CountersOverflowPoseidon => 9,
            Self::UnsupportedForkId => 10,
            Self::BalanceMismatch => 11,
            Self::Fea2Scalar => 12,
            Self::Tos32 => 13,
            Self::InvalidUnsignedTx => 14,
            Self::InvalidNoCounters => 15,
            Self::ArithEcrecoverDivideByZero => 16,
            Self::AddressOutOfRange => 17,
            Self::AddressNegative => 18,
            Self::StorageInvalidKey => 19,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns true if the request failed. Only an explicit [`ExecutorError::NoError`] counts as
    /// success.
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::NoError)
    }
}

/// An error raised by the ROM while executing the batch, a block or a transaction. The state
/// transition still happened and the error is part of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RomError {
    /// The executor did not set the error field.
    #[error("unspecified rom error")]
    Unspecified,
    /// The execution succeeded.
    #[error("no error")]
    NoError,
    /// Out of gas.
    #[error("out of gas")]
    OutOfGas,
    /// Stack overflow.
    #[error("stack overflow")]
    StackOverflow,
    /// Stack underflow.
    #[error("stack underflow")]
    StackUnderflow,
    /// Max code size exceeded.
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,
    /// Contract address collision.
    #[error("contract address collision")]
    ContractAddressCollision,
    /// Execution reverted.
    #[error("execution reverted")]
    ExecutionReverted,
    /// Out of counters: steps.
    #[error("out of counters: steps")]
    OutOfCountersStep,
    /// Out of counters: keccak.
    #[error("out of counters: keccak")]
    OutOfCountersKeccak,
    /// Out of counters: binary.
    #[error("out of counters: binary")]
    OutOfCountersBinary,
    /// Out of counters: memory align.
    #[error("out of counters: memory align")]
    OutOfCountersMem,
    /// Out of counters: arith.
    #[error("out of counters: arith")]
    OutOfCountersArith,
    /// Out of counters: padding.
    #[error("out of counters: padding")]
    OutOfCountersPadding,
    /// Out of counters: poseidon.
    #[error("out of counters: poseidon")]
    OutOfCountersPoseidon,
    /// Invalid jump.
    #[error("invalid jump")]
    InvalidJump,
    /// Invalid opcode.
    #[error("invalid opcode")]
    InvalidOpcode,
    /// Invalid static call.
    #[error("invalid static call")]
    InvalidStatic,
    /// Bytecode starts with 0xef.
    #[error("bytecode starts with 0xef")]
    InvalidBytecodeStartsEf,
    /// Intrinsic: invalid signature.
    #[error("intrinsic: invalid signature")]
    IntrinsicInvalidSignature,
    /// Intrinsic: invalid chain id.
    #[error("intrinsic: invalid chain id")]
    IntrinsicInvalidChainId,
    /// Intrinsic: invalid nonce.
    #[error("intrinsic: invalid nonce")]
    IntrinsicInvalidNonce,
    /// Intrinsic: invalid gas limit.
    #[error("intrinsic: invalid gas limit")]
    IntrinsicInvalidGasLimit,
    /// Intrinsic: invalid balance.
    #[error("intrinsic: invalid balance")]
    IntrinsicInvalidBalance,
    /// Intrinsic: invalid batch gas limit.
    #[error("intrinsic: invalid batch gas limit")]
    IntrinsicInvalidBatchGasLimit,
    /// Intrinsic: invalid sender code.
    #[error("intrinsic: invalid sender code")]
    IntrinsicInvalidSenderCode,
    /// Intrinsic: transaction gas overflow.
    #[error("intrinsic: transaction gas overflow")]
    IntrinsicTxGasOverflow,
    /// Batch data too big.
    #[error("batch data too big")]
    BatchDataTooBig,
    /// Unsupported fork id.
    #[error("unsupported fork id")]
    UnsupportedForkId,
    /// Invalid rlp.
    #[error("invalid rlp")]
    InvalidRlp,
    /// Invalid change l2 block encoding.
    #[error("invalid change l2 block encoding")]
    InvalidDecodeChangeL2Block,
    /// First transaction is not a change l2 block.
    #[error("first transaction is not a change l2 block")]
    InvalidNotFirstTxChangeL2Block,
    /// Change l2 block timestamp above the limit.
    #[error("change l2 block timestamp above the limit")]
    InvalidTxChangeL2BlockLimitTimestamp,
    /// Change l2 block timestamp below the minimum.
    #[error("change l2 block timestamp below the minimum")]
    InvalidTxChangeL2BlockMinTimestamp,
    /// Invalid l1 info tree index.
    #[error("invalid l1 info tree index")]
    InvalidL1InfoTreeIndex,
    /// A code not known to this node.
    #[error("unknown rom error {0}")]
    Unknown(i32),
}

impl RomError {
    /// Returns the error of the provided wire code.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unspecified,
            1 => Self::NoError,
            2 => Self::OutOfGas,
            3 => Self::StackOverflow,
            4 => Self::StackUnderflow,
            5 => Self::MaxCodeSizeExceeded,
            6 => Self::ContractAddressCollision,
            7 => Self::ExecutionReverted,
            8 => Self::OutOfCountersStep,
            9 => Self::OutOfCountersKeccak,
            10 => Self::OutOfCountersBinary,
            11 => Self::OutOfCountersMem,
            12 => Self::OutOfCountersArith,
            13 => Self::OutOfCountersPadding,
            14 => Self::OutOfCountersPoseidon,
            15 => Self::InvalidJump,
            16 => Self::InvalidOpcode,
            17 => Self::InvalidStatic,
            18 => Self::InvalidBytecodeStartsEf,
            19 => Self::IntrinsicInvalidSignature,
            20 => Self::IntrinsicInvalidChainId,
            21 => Self::IntrinsicInvalidNonce,
            22 => Self::IntrinsicInvalidGasLimit,
            23 => Self::IntrinsicInvalidBalance,
            24 => Self::IntrinsicInvalidBatchGasLimit,
            25 => Self::IntrinsicInvalidSenderCode,
            26 => Self::IntrinsicTxGasOverflow,
            27 => Self::BatchDataTooBig,
            28 => Self::UnsupportedForkId,
            29 => Self::InvalidRlp,
            30 => Self::InvalidDecodeChangeL2Block,
            31 => Self::InvalidNotFirstTxChangeL2Block,
            32 => Self::InvalidTxChangeL2BlockLimitTimestamp,
            33 => Self::InvalidTxChangeL2BlockMinTimestamp,
            34 => Self::InvalidL1InfoTreeIndex,
            code => Self::Unknown(code),
        }
    }

    /// Returns the wire code of the error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::NoError => 1,
            Self::OutOfGas => 2,
            Self::StackOverflow => 3,
            Self::StackUnderflow => 4,
            Self::MaxCodeSizeExceeded => 5,
            Self::ContractAddressCollision => 6,
            Self::ExecutionReverted => 7,
            Self::OutOfCountersStep => 8,
            Self::OutOfCountersKeccak => 9,
            Self::OutOfCountersBinary => 10,
            Self::OutOfCountersMem => 11,
            Self::OutOfCountersArith => 12,
            Self::OutOfCountersPadding => 13,
            Self::OutOfCountersPoseidon => 14,
            Self::InvalidJump => 15,
            Self::InvalidOpcode => 16,
            Self::InvalidStatic => 17,
            Self::InvalidBytecodeStartsEf => 18,
            Self::IntrinsicInvalidSignature => 19,
            Self::IntrinsicInvalidChainId => 20,
            Self::IntrinsicInvalidNonce => 21,
            Self::IntrinsicInvalidGasLimit => 22,
            Self::IntrinsicInvalidBalance => 23,
            Self::IntrinsicInvalidBatchGasLimit => 24,
            Self::IntrinsicInvalidSenderCode => 25,
            Self::IntrinsicTxGasOverflow => 26,
            Self::BatchDataTooBig => 27,
            Self::UnsupportedForkId => 28,
            Self::InvalidRlp => 29,
            Self::InvalidDecodeChangeL2Block => 30,
            Self::InvalidNotFirstTxChangeL2Block => 31,
            Self::InvalidTxChangeL2BlockLimitTimestamp => 32,
            Self::InvalidTxChangeL2BlockMinTimestamp => 33,
            Self::InvalidL1InfoTreeIndex => 34,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns true if the code reports an error. An unset code is not an error.
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::Unspecified | Self::NoError)
    }

    /// Returns true if a zkEVM counter was exhausted.
    pub const fn is_out_of_counters(&self) -> bool {
        self.exhausted_counter().is_some()
    }

    /// Returns true if the transaction failed its intrinsic checks and was not executed.
    pub const fn is_intrinsic(&self) -> bool {
        matches!(
            self,
            Self::IntrinsicInvalidSignature |
                Self::IntrinsicInvalidChainId |
                Self::IntrinsicInvalidNonce |
                Self::IntrinsicInvalidGasLimit |
                Self::IntrinsicInvalidBalance |
                Self::IntrinsicInvalidBatchGasLimit |
                Self::IntrinsicInvalidSenderCode |
                Self::IntrinsicTxGasOverflow
        )
    }

    /// Returns true if an L2 block header of the batch is invalid.
    pub const fn is_change_l2_block_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDecodeChangeL2Block |
                Self::InvalidNotFirstTxChangeL2Block |
                Self::InvalidTxChangeL2BlockLimitTimestamp |
                Self::InvalidTxChangeL2BlockMinTimestamp |
                Self::InvalidL1InfoTreeIndex
        )
    }

    /// Returns the counter exhausted by an out of counters error.
    pub const fn exhausted_counter(&self) -> Option<ZkCounter> {
        Some(match self {
            Self::OutOfCountersStep => ZkCounter::Steps,
            Self::OutOfCountersKeccak => ZkCounter::KeccakHashes,
            Self::OutOfCountersBinary => ZkCounter::Binaries,
            Self::OutOfCountersMem => ZkCounter::MemAligns,
            Self::OutOfCountersArith => ZkCounter::Arithmetics,
            Self::OutOfCountersPadding => ZkCounter::PoseidonPaddings,
            Self::OutOfCountersPoseidon => ZkCounter::PoseidonHashes,
            _ => return None,
        })
    }
}

/// The classification of a failed batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionFailure {
    /// The executor rejected the whole request.
    #[error("executor error: {0}")]
    Executor(ExecutorError),
    /// The ROM reported an error, the state transition happened.
    #[error("rom error: {0}")]
    Rom(RomError),
    /// The ROM exhausted a zkEVM counter.
    #[error("out of counters: {0}")]
    OutOfCounters(RomError),
}

impl ExecutionFailure {
    /// Classifies the executor and ROM errors of a response. The executor error takes precedence.
    pub const fn classify(executor_error: ExecutorError, rom_error: RomError) -> Option<Self> {
        if executor_error.is_error() {
            return Some(Self::Executor(executor_error))
        }
        Self::from_rom(rom_error)
    }

    /// Classifies a ROM error.
    pub const fn from_rom(rom_error: RomError) -> Option<Self> {
        if !rom_error.is_error() {
            None
        } else if rom_error.is_out_of_counters() {
            Some(Self::OutOfCounters(rom_error))
        } else {
            Some(Self::Rom(rom_error))
        }
    }

    /// Returns the ROM error of the failure, if any.
    pub const fn rom_error(&self) -> Option<RomError> {
        match self {
            Self::Executor(_) => None,
            Self::Rom(err) | Self::OutOfCounters(err) => Some(*err),
        }
    }
}

/// An error of the executor client.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorClientError {
    /// The URI of the executor is invalid.
    #[error("invalid executor uri {0}")]
    InvalidUri(String),
    /// The executor could not be reached before the dial timeout.
    #[error("executor at {uri} unreachable after {timeout:?}")]
    DialTimeout {
        /// The URI of the executor.
        uri: String,
        /// The dial timeout.
        timeout: Duration,
        /// The last connection error.
        #[source]
        source: tonic::transport::Error,
    },
    /// The call to the executor failed.
    #[error("executor call failed: {0}")]
    Status(#[from] tonic::Status),
}

impl ExecutorClientError {
    /// Returns true if the executor refused the call for lack of resources. The call can be
    /// retried.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::Status(status) if status.code() == tonic::Code::ResourceExhausted)
    }
}
