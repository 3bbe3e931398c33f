use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Order {0} has no lines")]
    EmptyOrder(OrderId),
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Client {0} does not exist")]
    ClientNotFound(i64),
}
