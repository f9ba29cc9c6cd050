use alloy_primitives::Bytes;
use rollup_node_primitives::{Event, EventComponent, EventId, EventLevel};
use std::{
    fmt::Debug,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use zkevm_db::{Database, DatabaseError, DatabaseOperations};

/// Implementers of the trait persist [`Event`]s.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait EventStorage: Debug + Send + Sync {
    /// Stores the event.
    async fn store(&self, event: Event) -> Result<(), DatabaseError>;
}

/// An [`EventStorage`] dropping every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventStorage;

#[async_trait::async_trait]
impl EventStorage for NoopEventStorage {
    async fn store(&self, _event: Event) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStorage for Database {
    async fn store(&self, event: Event) -> Result<(), DatabaseError> {
        self.insert_event(event).await
    }
}

/// Records anomalies for later inspection.
#[derive(Debug, Clone)]
pub struct EventLog {
    storage: Arc<dyn EventStorage>,
    source: String,
}

impl EventLog {
    /// Returns a new [`EventLog`] writing to the storage on behalf of `source`.
    pub fn new(storage: Arc<dyn EventStorage>, source: impl Into<String>) -> Self {
        Self { storage, source: source.into() }
    }

    /// Returns an [`EventLog`] dropping every event.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopEventStorage), "noop")
    }

    /// Records the event. A storage failure is logged and otherwise ignored.
    pub async fn log(&self, record: EventRecord) {
        let event = Event {
            received_at: now_millis(),
            source: self.source.clone(),
            component: record.component,
            level: record.level,
            event_id: record.event_id,
            description: record.description,
            batch_number: record.batch_number,
            data: record.data,
        };
        let event_id = event.event_id;
        if let Err(err) = self.storage.store(event).await {
            tracing::error!(target: "rollup_node::state", %event_id, ?err, "Failed to store event");
        }
    }
}

/// The content of an event, before it is stamped by the [`EventLog`].
#[derive(Debug, Clone)]
pub struct EventRecord {
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
    /// Raw data attached to the event.
    pub data: Option<Bytes>,
}

impl EventRecord {
    /// Returns a new record without batch or data.
    pub fn new(
        component: EventComponent,
        level: EventLevel,
        event_id: EventId,
        description: impl Into<String>,
    ) -> Self {
        Self { component, level, event_id, description: description.into(), batch_number: None, data: None }
    }

    /// Sets the batch of the record.
    pub const fn with_batch_number(mut self, batch_number: u64) -> Self {
        self.batch_number = Some(batch_number);
        self
    }

    /// Attaches data to the record.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}
