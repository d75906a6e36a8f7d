//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! Every write runs inside its own transaction and is committed before the method returns, so the change is visible
//! to every other connection in the pool as soon as the call completes.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, line_items, new_pool, orders, products, sellers, stock_alerts, transactions, transfers};
use crate::{
    db_types::{
        FulfillmentStatus,
        LineItem,
        Naira,
        NewLineItem,
        NewOrder,
        NewPaymentTransaction,
        NewProduct,
        NewSeller,
        NewStockAlert,
        NewTransfer,
        Order,
        PaymentTransaction,
        Product,
        Seller,
        StockAlert,
        Transfer,
        TransferStatus,
    },
    traits::{
        CatalogManagement,
        EarningsTotals,
        MarketplaceDatabase,
        OrderManagement,
        PlatformSummary,
        SettlementManagement,
        StockManagement,
        StoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, StoreError> {
        let mut tx = self.pool.begin().await?;
        let seller = sellers::insert_seller(seller, &mut tx).await?;
        tx.commit().await?;
        Ok(seller)
    }

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let seller = sellers::fetch_seller(seller_id, &mut conn).await?;
        Ok(seller)
    }

    async fn update_payout_details(
        &self,
        seller_id: i64,
        account_number: &str,
        bank_code: &str,
        account_name: Option<&str>,
    ) -> Result<Seller, StoreError> {
        let mut tx = self.pool.begin().await?;
        let seller = sellers::update_payout_details(seller_id, account_number, bank_code, account_name, &mut tx)
            .await?
            .ok_or(StoreError::SellerNotFound(seller_id))?;
        tx.commit().await?;
        Ok(seller)
    }

    async fn save_recipient_code(&self, seller_id: i64, recipient_code: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sellers::save_recipient_code(seller_id, recipient_code, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_product(&self, product: NewProduct, customer_price: Naira) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, customer_price, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(product_ids, &mut conn).await?;
        Ok(products)
    }

    async fn update_product_prices(
        &self,
        product_id: i64,
        seller_id: i64,
        wholesale_price: Naira,
        customer_price: Naira,
    ) -> Result<Option<Product>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let product = products::update_prices(product_id, seller_id, wholesale_price, customer_price, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn soft_delete_product(&self, product_id: i64, seller_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = products::soft_delete(product_id, seller_id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl StockManagement for SqliteDatabase {
    async fn fetch_stock(&self, product_id: i64) -> Result<Option<i64>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let stock = products::fetch_stock(product_id, &mut conn).await?;
        Ok(stock)
    }

    async fn compare_and_set_stock(&self, product_id: i64, expected: i64, new_stock: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let swapped = products::compare_and_set_stock(product_id, expected, new_stock, &mut tx).await?;
        tx.commit().await?;
        Ok(swapped)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// All the items are written inside a single database transaction, so a partial item set is never visible.
    async fn insert_line_items(&self, order_id: i64, items: &[NewLineItem]) -> Result<Vec<LineItem>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let lines = line_items::insert_line_items(order_id, items, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Line items for order #{order_id} committed");
        Ok(lines)
    }

    async fn delete_order(&self, order_id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        orders::delete_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<LineItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = line_items::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }

    /// The status change and the completed transactions are committed together. If either write fails, the order
    /// stays pending and a later verification can try again.
    async fn confirm_payment(&self, reference: &str) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::mark_paid(reference, &mut tx).await? else {
            return Ok(None);
        };
        let completed = transactions::complete_for_order(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] marked paid. {completed} payment transactions completed", order.order_number);
        Ok(Some(order))
    }

    async fn mark_order_failed(&self, reference: &str) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::mark_failed(reference, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_fulfillment_status(
        &self,
        order_id: i64,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_fulfillment_status(order_id, from, to, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_seller(seller_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pending_orders(cutoff, &mut conn).await?;
        Ok(orders)
    }
}

impl SettlementManagement for SqliteDatabase {
    async fn insert_payment_transactions(
        &self,
        txs: &[NewPaymentTransaction],
    ) -> Result<Vec<PaymentTransaction>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = transactions::insert_transactions(txs, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} payment transactions recorded", result.len());
        Ok(result)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_for_order(order_id, &mut conn).await?;
        Ok(txs)
    }

    async fn fetch_transactions_for_seller(&self, seller_id: i64) -> Result<Vec<PaymentTransaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_for_seller(seller_id, &mut conn).await?;
        Ok(txs)
    }

    async fn earnings_totals(&self, seller_id: i64) -> Result<EarningsTotals, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let totals = transactions::earnings_totals(seller_id, &mut conn).await?;
        Ok(totals)
    }

    async fn platform_summary(&self) -> Result<PlatformSummary, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let summary = transactions::platform_summary(&mut conn).await?;
        Ok(summary)
    }

    async fn claim_transfer(&self, transfer: NewTransfer) -> Result<Option<Transfer>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let transfer = transfers::claim_transfer(transfer, &mut tx).await?;
        tx.commit().await?;
        Ok(transfer)
    }

    async fn mark_transfer_initiated(&self, transfer_id: i64, transfer_code: &str) -> Result<Transfer, StoreError> {
        let mut tx = self.pool.begin().await?;
        let transfer = transfers::mark_initiated(transfer_id, transfer_code, &mut tx).await?;
        tx.commit().await?;
        Ok(transfer)
    }

    async fn update_transfer_status(
        &self,
        transfer_id: i64,
        status: TransferStatus,
        reason: Option<&str>,
    ) -> Result<Transfer, StoreError> {
        let mut tx = self.pool.begin().await?;
        let transfer = transfers::update_status(transfer_id, status, reason, &mut tx).await?;
        tx.commit().await?;
        Ok(transfer)
    }

    async fn fetch_transfer(&self, transfer_id: i64) -> Result<Option<Transfer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let transfer = transfers::fetch_transfer(transfer_id, &mut conn).await?;
        Ok(transfer)
    }

    async fn fetch_transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let transfer = transfers::fetch_by_reference(reference, &mut conn).await?;
        Ok(transfer)
    }

    async fn fetch_transfers_for_order(&self, order_id: i64) -> Result<Vec<Transfer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = transfers::fetch_for_order(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_transfers_for_seller(&self, seller_id: i64) -> Result<Vec<Transfer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = transfers::fetch_for_seller(seller_id, &mut conn).await?;
        Ok(result)
    }

    async fn insert_stock_alert(&self, alert: NewStockAlert) -> Result<StockAlert, StoreError> {
        let mut tx = self.pool.begin().await?;
        let alert = stock_alerts::insert_alert(alert, &mut tx).await?;
        tx.commit().await?;
        Ok(alert)
    }

    async fn fetch_unresolved_stock_alerts(&self) -> Result<Vec<StockAlert>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let alerts = stock_alerts::fetch_unresolved(&mut conn).await?;
        Ok(alerts)
    }

    async fn resolve_stock_alert(&self, alert_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let resolved = stock_alerts::resolve(alert_id, &mut tx).await?;
        tx.commit().await?;
        Ok(resolved)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Could not run migrations. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
