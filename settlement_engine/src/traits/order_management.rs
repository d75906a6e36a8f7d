use chrono::{DateTime, Utc};

use crate::{
    db_types::{FulfillmentStatus, LineItem, NewLineItem, NewOrder, Order},
    traits::StoreError,
};

/// Orders and their line items.
///
/// Payment status only ever moves `pending → successful` or `pending → failed`. Those edges are conditional writes,
/// so that when several callers race to apply the same gateway result, exactly one of them wins.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Inserts an order header with `pending` payment and fulfillment status.
    ///
    /// Fails with [`StoreError::OrderAlreadyExists`] if the order number is taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Writes the line items for an order. Either all the items are written, or none are.
    async fn insert_line_items(&self, order_id: i64, items: &[NewLineItem]) -> Result<Vec<LineItem>, StoreError>;

    /// Removes an order and anything that hangs off it. Only used to compensate for a partially built order.
    async fn delete_order(&self, order_id: i64) -> Result<(), StoreError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError>;

    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<LineItem>, StoreError>;

    /// Conditionally flips the payment status from `pending` to `successful` and the fulfillment status to
    /// `processing`, and moves every pending payment transaction of the order to `completed`.
    ///
    /// Both changes are applied together or not at all. Returns the updated order if this call applied the change, or
    /// `None` if the order was not pending (or does not exist).
    async fn confirm_payment(&self, reference: &str) -> Result<Option<Order>, StoreError>;

    /// Conditionally flips the payment status from `pending` to `failed`. Fulfillment status is left alone.
    async fn mark_order_failed(&self, reference: &str) -> Result<Option<Order>, StoreError>;

    /// Conditionally changes the fulfillment status from `from` to `to`. Returns `None` if the order is no longer in
    /// `from`.
    async fn update_fulfillment_status(
        &self,
        order_id: i64,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    ) -> Result<Option<Order>, StoreError>;

    /// All orders containing at least one line item sold by `seller_id`, newest first.
    async fn fetch_orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, StoreError>;

    /// Orders still awaiting payment that were created before `cutoff`, oldest first.
    async fn fetch_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;
}
