/// The [`DatabaseConnectionProvider`] trait provides a way to get a connection to the database.
/// This is implemented by the [`crate::Database`] and [`crate::TXMut`] types.
pub trait DatabaseConnectionProvider {
    /// The connection type.
    type Connection: sea_orm::ConnectionTrait + sea_orm::StreamTrait + Send + Sync;

    /// Returns a reference to the database connection.
    fn get_connection(&self) -> &Self::Connection;
}
