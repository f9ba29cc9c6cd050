use alloy_primitives::Bytes;

/// The severity of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EventLevel {
    /// Informational event.
    Info,
    /// Recoverable anomaly.
    Warning,
    /// Failure requiring attention.
    Error,
    /// Failure that stops the node.
    Critical,
}

/// The component an [`Event`] originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventComponent {
    /// The state-transition core.
    State,
    /// The executor client.
    Executor,
    /// The batch ledger.
    Ledger,
}

/// The identifier of what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventId {
    /// The executor answered with an executor-level error.
    ExecutorError,
    /// A transaction returned by the executor could not be decoded.
    TransactionDecodingFailed,
    /// A batch accumulated input hash does not match its recomputed value.
    AccInputHashMismatch,
}

/// A structured record of an anomaly, stored for later inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The unix timestamp, in milliseconds, at which the event was emitted.
    pub received_at: u64,
    /// The node emitting the event.
    pub source: String,
    /// The emitting component.
    pub component: EventComponent,
    /// The severity.
    pub level: EventLevel,
    /// What happened.
    pub event_id: EventId,
    /// A human readable description.
    pub description: String,
    /// The batch the event relates to.
    pub batch_number: Option<u64>,
    /// Raw data attached to the event, such as the executor request.
    pub data: Option<Bytes>,
}
