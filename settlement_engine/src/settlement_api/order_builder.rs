use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{LineItem, NewLineItem, NewOrder, Order},
    traits::{OrderManagement, StoreError},
};

/// Writes an order header and its line items as a unit.
///
/// If the line items cannot be written, the header is deleted again so that no order is left without items.
#[derive(Clone)]
pub struct OrderBuilder<B> {
    db: B,
}

impl<B> Debug for OrderBuilder<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderBuilder")
    }
}

impl<B> OrderBuilder<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderBuilder<B>
where B: OrderManagement
{
    pub async fn build(&self, order: NewOrder, items: &[NewLineItem]) -> Result<(Order, Vec<LineItem>), StoreError> {
        if items.is_empty() {
            return Err(StoreError::InvalidData("An order must have at least one line item".into()));
        }
        let order = self.db.insert_order(order).await?;
        match self.db.insert_line_items(order.id, items).await {
            Ok(items) => {
                debug!("🧾️ Order [{}] created with {} line items", order.order_number, items.len());
                Ok((order, items))
            },
            Err(e) => {
                warn!("🧾️ Could not save line items for order [{}]: {e}. Removing the order header.", order.order_number);
                self.discard(&order).await;
                Err(e)
            },
        }
    }

    /// Best-effort removal of an order that could not be completed.
    pub async fn discard(&self, order: &Order) {
        if let Err(e) = self.db.delete_order(order.id).await {
            error!(
                "🧾️ Could not remove incomplete order [{}] (#{}): {e}. It must be removed manually.",
                order.order_number, order.id
            );
        }
    }
}
