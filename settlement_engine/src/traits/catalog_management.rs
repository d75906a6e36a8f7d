use crate::{
    db_types::{NewProduct, NewSeller, Naira, Product, Seller},
    traits::StoreError,
};

/// Seller and product records.
///
/// Product stock is set once on insert. After that it only changes through [`crate::traits::StockManagement`].
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, StoreError>;

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, StoreError>;

    /// Replaces the seller's bank details. Any stored payout recipient token is cleared, since it was registered
    /// against the old account.
    async fn update_payout_details(
        &self,
        seller_id: i64,
        account_number: &str,
        bank_code: &str,
        account_name: Option<&str>,
    ) -> Result<Seller, StoreError>;

    /// Persists the gateway recipient token for the seller so that later payouts can reuse it.
    async fn save_recipient_code(&self, seller_id: i64, recipient_code: &str) -> Result<(), StoreError>;

    /// Inserts a new product. `customer_price` must have been derived from the wholesale price by the caller.
    async fn insert_product(&self, product: NewProduct, customer_price: Naira) -> Result<Product, StoreError>;

    /// Fetches a product by id, including soft-deleted products.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StoreError>;

    /// Fetches all the products with the given ids, including soft-deleted ones. Missing ids are silently skipped.
    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, StoreError>;

    /// Sets the wholesale and customer price of a product owned by `seller_id`.
    ///
    /// Returns `None` if the product does not exist, is deleted, or belongs to another seller.
    async fn update_product_prices(
        &self,
        product_id: i64,
        seller_id: i64,
        wholesale_price: Naira,
        customer_price: Naira,
    ) -> Result<Option<Product>, StoreError>;

    /// Marks the product as deleted. Returns false if the seller does not own a live product with this id.
    async fn soft_delete_product(&self, product_id: i64, seller_id: i64) -> Result<bool, StoreError>;
}
