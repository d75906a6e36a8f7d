use crate::traits::StoreError;

/// Raw access to product stock counters.
///
/// Callers should not use these methods directly. [`crate::StockLedger`] wraps them in bounded compare-and-swap loops.
#[allow(async_fn_in_trait)]
pub trait StockManagement: Clone {
    /// Returns the current stock of a live (not deleted) product, or `None` if there is no such product.
    async fn fetch_stock(&self, product_id: i64) -> Result<Option<i64>, StoreError>;

    /// Sets the stock of `product_id` to `new_stock`, but only if it is currently `expected`.
    ///
    /// Returns true if the row was updated. The number of affected rows is the only success signal; false means
    /// another writer changed the stock after it was read.
    async fn compare_and_set_stock(&self, product_id: i64, expected: i64, new_stock: i64) -> Result<bool, StoreError>;
}
