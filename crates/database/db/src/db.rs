use crate::{transaction::TXMut, DatabaseConnectionProvider, DatabaseError};

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaOrmDatabase, DatabaseConnection, DbBackend,
    IsolationLevel, TransactionTrait,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// The default timeout when acquiring a connection from the pool.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// The [`Database`] struct is responsible for interacting with the database.
///
/// It wraps a [`sea_orm::DatabaseConnection`] and the writer lock shared by all the mutable
/// transactions opened through [`Database::tx_mut`]. Read operations are provided by
/// [`crate::DatabaseOperations`], which is implemented for both [`Database`] and [`TXMut`].
#[derive(Debug)]
pub struct Database {
    /// The underlying database connection.
    connection: DatabaseConnection,
    /// The lock held by mutable transactions.
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Creates a new [`Database`] instance associated with the provided database URL.
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        Self::with_max_connections(database_url, None).await
    }

    /// Creates a new [`Database`] instance with a pool of at most `max_connections` connections.
    /// An in-memory SQLite database only lives as long as its connection and needs a pool of one.
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: Option<u32>,
    ) -> Result<Self, DatabaseError> {
        let mut options = ConnectOptions::new(database_url);
        options.acquire_timeout(ACQUIRE_TIMEOUT).sqlx_logging(false);
        if let Some(max_connections) = max_connections {
            options.max_connections(max_connections);
        }
        let connection = SeaOrmDatabase::connect(options).await?;
        Ok(connection.into())
    }

    /// Returns the backend of the database.
    pub fn backend(&self) -> DbBackend {
        self.connection.get_database_backend()
    }

    /// Returns true if the backend supports transaction isolation levels and row locks.
    pub fn supports_locking(&self) -> bool {
        self.backend() != DbBackend::Sqlite
    }

    /// Begins a new mutable transaction, waiting for the writer lock first. The transaction uses
    /// the provided isolation level where the backend supports it.
    pub async fn tx_mut(
        &self,
        isolation_level: Option<IsolationLevel>,
    ) -> Result<TXMut, DatabaseError> {
        let guard = self.write_lock.clone().lock_owned().await;
        let isolation_level = isolation_level.filter(|_| self.supports_locking());
        let tx = self.connection.begin_with_config(isolation_level, None).await?;
        Ok(TXMut::new(tx, guard))
    }
}

impl DatabaseConnectionProvider for Database {
    type Connection = DatabaseConnection;

    fn get_connection(&self) -> &Self::Connection {
        &self.connection
    }
}

impl From<DatabaseConnection> for Database {
    fn from(connection: DatabaseConnection) -> Self {
        Self { connection, write_lock: Arc::new(Mutex::new(())) }
    }
}
