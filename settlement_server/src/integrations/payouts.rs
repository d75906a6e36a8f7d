use futures::future::BoxFuture;
use log::*;
use settlement_engine::{
    events::{EventHandlers, EventHooks, OrderPaidEvent, StockAlertEvent},
    PayoutApi,
    PayoutResult,
    SqliteDatabase,
};

use crate::integrations::paystack::PaystackGateway;

pub const SETTLEMENT_EVENT_BUFFER_SIZE: usize = 25;

/// Wires the engine's events to the payout dispatcher.
///
/// 1. OrderPaidEvent - Each seller in the order is paid their wholesale share. Failed transfers are recorded and can
///    be retried from the `/transfers/{id}/retry` route.
/// 2. StockAlertEvent - Logged loudly. The alert row itself is already stored and is picked up by the reconciliation
///    sweep.
pub fn create_payout_event_handlers(db: SqliteDatabase, gateway: PaystackGateway) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let api = PayoutApi::new(db, gateway);
    // --- On OrderPaid Handler ---
    hooks.on_order_paid(move |ev: OrderPaidEvent| {
        let api = api.clone();
        let order_id = ev.order.id;
        let order_number = ev.order.order_number;
        debug!("💸️ Order {order_number} is paid. Dispatching seller payouts.");
        Box::pin(async move {
            match api.dispatch_for_order(order_id).await {
                Ok(payouts) => {
                    for payout in payouts {
                        match payout.result {
                            PayoutResult::Initiated { transfer } => info!(
                                "💸️ Seller #{} payout of {} for {order_number} initiated. Transfer {}",
                                payout.seller_id, payout.amount, transfer.reference
                            ),
                            PayoutResult::Skipped { .. } => debug!(
                                "💸️ Seller #{} payout for {order_number} was already under way",
                                payout.seller_id
                            ),
                            PayoutResult::Failed { transfer, reason } => warn!(
                                "💸️ Seller #{} payout of {} for {order_number} failed and can be retried (transfer \
                                 #{}). {reason}",
                                payout.seller_id, payout.amount, transfer.id
                            ),
                        }
                    }
                },
                Err(e) => error!("💸️ Could not dispatch payouts for order {order_number}. {e}"),
            }
        }) as BoxFuture<'static, ()>
    });
    // --- On StockAlert Handler ---
    hooks.on_stock_alert(|ev: StockAlertEvent| {
        let alert = ev.alert;
        error!(
            "📦️ Stock alert #{}: order #{} took {} of product #{} but stock could not be decremented. {}",
            alert.id, alert.order_id, alert.quantity, alert.product_id, alert.reason
        );
        no_op()
    });
    EventHandlers::new(SETTLEMENT_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
