use thiserror::Error;

use crate::traits::{CatalogManagement, OrderManagement, SettlementManagement, StockManagement};

/// The full set of storage behaviour a backend must provide to run the settlement core.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: CatalogManagement + StockManagement + OrderManagement + SettlementManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested seller {0} does not exist")]
    SellerNotFound(i64),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
    #[error("Cannot insert order, since it already exists with order number {0}")]
    OrderAlreadyExists(String),
    #[error("The requested transfer {0} does not exist")]
    TransferNotFound(i64),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
