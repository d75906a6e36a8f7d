use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{FulfillmentStatus, LineItem, Order, PaymentStatus},
    helpers::{retry_on_conflict, CasAttempt, DEFAULT_CAS_ATTEMPTS},
    settlement_api::errors::OrderApiError,
    traits::OrderManagement,
};

/// An order as one seller sees it: the header plus only that seller's lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerOrder {
    pub order: Order,
    pub items: Vec<LineItem>,
}

#[derive(Clone)]
pub struct OrderApi<B> {
    db: B,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    /// Fetches an order on behalf of a seller. The seller must have at least one line in the order.
    pub async fn order_for_seller(&self, order_id: i64, seller_id: i64) -> Result<SellerOrder, OrderApiError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderApiError::OrderNotFound(order_id))?;
        let items = self.seller_lines(order_id, seller_id).await?;
        Ok(SellerOrder { order, items })
    }

    pub async fn orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, OrderApiError> {
        Ok(self.db.fetch_orders_for_seller(seller_id).await?)
    }

    /// Moves an order along its fulfillment lifecycle. The payment status is never touched.
    ///
    /// Orders must be paid before they can be fulfilled. The one exception is that an unpaid, pending order may be
    /// cancelled.
    pub async fn update_fulfillment_status(
        &self,
        order_id: i64,
        seller_id: i64,
        status: FulfillmentStatus,
    ) -> Result<Order, OrderApiError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderApiError::OrderNotFound(order_id))?;
        self.seller_lines(order_id, seller_id).await?;
        let db = &self.db;
        let updated = retry_on_conflict::<_, OrderApiError, _, _>(DEFAULT_CAS_ATTEMPTS, |_| async move {
            let order = db.fetch_order(order_id).await?.ok_or(OrderApiError::OrderNotFound(order_id))?;
            let from = order.fulfillment_status;
            let unpaid_cancellation = status == FulfillmentStatus::Cancelled && from == FulfillmentStatus::Pending;
            if order.payment_status != PaymentStatus::Successful && !unpaid_cancellation {
                return Err(OrderApiError::PaymentNotSuccessful(order_id));
            }
            if !from.can_transition_to(status) {
                return Err(OrderApiError::InvalidTransition { from, to: status });
            }
            match db.update_fulfillment_status(order_id, from, status).await? {
                Some(order) => Ok(CasAttempt::Done(order)),
                None => Ok(CasAttempt::Conflict),
            }
        })
        .await?;
        let order = updated.ok_or(OrderApiError::ConcurrentModification(order_id))?;
        info!("🚚️ Seller #{seller_id} moved order [{}] to {status}", order.order_number);
        Ok(order)
    }

    async fn seller_lines(&self, order_id: i64, seller_id: i64) -> Result<Vec<LineItem>, OrderApiError> {
        let items = self
            .db
            .fetch_line_items(order_id)
            .await?
            .into_iter()
            .filter(|item| item.seller_id == seller_id)
            .collect::<Vec<_>>();
        if items.is_empty() {
            debug!("🚚️ Seller #{seller_id} has no items in order #{order_id}");
            return Err(OrderApiError::NotOrderSeller { order_id, seller_id });
        }
        Ok(items)
    }
}
