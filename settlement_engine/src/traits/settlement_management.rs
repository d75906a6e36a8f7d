use crate::{
    db_types::{
        NewPaymentTransaction,
        NewStockAlert,
        NewTransfer,
        PaymentTransaction,
        StockAlert,
        Transfer,
        TransferStatus,
    },
    traits::{EarningsTotals, PlatformSummary, StoreError},
};

/// Money movement records: the per-line commission split, seller payouts, and stock alerts.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement: Clone {
    /// Inserts pending payment transactions. Inserting a transaction that already exists for the same gateway
    /// reference and line item is a no-op.
    async fn insert_payment_transactions(
        &self,
        transactions: &[NewPaymentTransaction],
    ) -> Result<Vec<PaymentTransaction>, StoreError>;

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, StoreError>;

    async fn fetch_transactions_for_seller(&self, seller_id: i64) -> Result<Vec<PaymentTransaction>, StoreError>;

    async fn earnings_totals(&self, seller_id: i64) -> Result<EarningsTotals, StoreError>;

    async fn platform_summary(&self) -> Result<PlatformSummary, StoreError>;

    /// Reserves the payout of `transfer.amount` to the seller for this order.
    ///
    /// A new `pending` row is created if none exists. A `failed` row is reset to `pending` for another attempt. If the
    /// existing row is `pending` or `success`, nothing is changed and `None` is returned, so at most one payout is in
    /// flight per (order, seller).
    async fn claim_transfer(&self, transfer: NewTransfer) -> Result<Option<Transfer>, StoreError>;

    /// Records the gateway transfer code for a transfer that the gateway accepted.
    async fn mark_transfer_initiated(&self, transfer_id: i64, transfer_code: &str) -> Result<Transfer, StoreError>;

    /// Sets the status of a transfer, with an optional failure reason.
    async fn update_transfer_status(
        &self,
        transfer_id: i64,
        status: TransferStatus,
        reason: Option<&str>,
    ) -> Result<Transfer, StoreError>;

    async fn fetch_transfer(&self, transfer_id: i64) -> Result<Option<Transfer>, StoreError>;

    async fn fetch_transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>, StoreError>;

    async fn fetch_transfers_for_order(&self, order_id: i64) -> Result<Vec<Transfer>, StoreError>;

    async fn fetch_transfers_for_seller(&self, seller_id: i64) -> Result<Vec<Transfer>, StoreError>;

    async fn insert_stock_alert(&self, alert: NewStockAlert) -> Result<StockAlert, StoreError>;

    async fn fetch_unresolved_stock_alerts(&self) -> Result<Vec<StockAlert>, StoreError>;

    async fn resolve_stock_alert(&self, alert_id: i64) -> Result<bool, StoreError>;
}
