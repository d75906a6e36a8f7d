use std::{collections::BTreeMap, fmt::Debug};

use log::*;
use serde_json::json;

use crate::{
    db_types::{FulfillmentStatus, LineItem, NewOrder, NewPaymentTransaction, NewStockAlert, Order, PaymentStatus, StockAlert, TransferStatus},
    events::{EventProducers, OrderPaidEvent, StockAlertEvent},
    helpers::{new_order_number, DEFAULT_CAS_ATTEMPTS},
    pricing::PricingPolicy,
    settlement_api::{
        cart_objects::CartReport,
        cart_validator::CartValidator,
        errors::PaymentFlowError,
        order_builder::OrderBuilder,
        payment_objects::{CheckoutRequest, CheckoutSession, PlacedOrder, VerifyOutcome, WebhookOutcome, WebhookPayload},
        stock_ledger::StockLedger,
    },
    traits::{GatewayPaymentStatus, MarketplaceDatabase, PaymentGateway, SessionRequest, StoreError},
};

/// `PaymentFlowApi` takes a cart from checkout through to a confirmed (or failed) payment.
///
/// The payment status of an order only ever moves `pending → successful` or `pending → failed`, and each edge is a
/// conditional write. Whoever wins the `pending → successful` edge applies the side effects (stock decrements,
/// completing the payment transactions and the [`OrderPaidEvent`]), so they happen exactly once no matter how many
/// verify calls and webhooks race each other.
#[derive(Clone)]
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    pricing: PricingPolicy,
    producers: EventProducers,
    stock_attempts: usize,
    callback_url: Option<String>,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi ({:?})", self.pricing)
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self {
            db,
            gateway,
            pricing: PricingPolicy::default(),
            producers,
            stock_attempts: DEFAULT_CAS_ATTEMPTS,
            callback_url: None,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_callback_url(mut self, callback_url: Option<String>) -> Self {
        self.callback_url = callback_url;
        self
    }

    pub fn with_stock_attempts(mut self, attempts: usize) -> Self {
        self.stock_attempts = attempts.max(1);
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    /// Validates the cart, opens a hosted payment session at the gateway and saves the order.
    ///
    /// Nothing is written if the cart is invalid or the gateway refuses the session. If the order cannot be saved
    /// once the session exists, the session is orphaned and [`PaymentFlowError::OrphanedSession`] is returned.
    pub async fn initialize(&self, request: CheckoutRequest) -> Result<CheckoutSession, PaymentFlowError> {
        let report = self.validator().require_valid(&request.items).await?;
        let order_number = new_order_number();
        let reference = order_number.to_string();
        let session_request = SessionRequest {
            email: request.customer.email.clone(),
            amount: report.total,
            reference: reference.clone(),
            callback_url: self.callback_url.clone(),
            metadata: Some(json!({
                "order_number": reference,
                "customer_name": request.customer.name,
                "line_items": report.lines.len(),
            })),
        };
        let session = self.gateway.initialize_session(session_request).await?;
        debug!("💳️ Payment session opened for [{reference}] ({})", report.total);
        let order =
            NewOrder::new(order_number, request.customer, report.total).with_authorization_url(&session.authorization_url);
        let placed = self.place_order(order, &report).await.map_err(|e| {
            error!(
                "💳️ A payment session was opened for [{reference}], but the order could not be saved. The session is \
                 orphaned and will show up in the next reconciliation sweep. {e}"
            );
            PaymentFlowError::OrphanedSession { reference: reference.clone(), reason: e.to_string() }
        })?;
        info!("💳️ Checkout for order [{reference}] started. Total: {}", placed.order.total_amount);
        Ok(CheckoutSession {
            placed,
            authorization_url: session.authorization_url,
            access_code: session.access_code,
            reference,
        })
    }

    /// Validates the cart and saves the order without opening a payment session.
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<PlacedOrder, PaymentFlowError> {
        let report = self.validator().require_valid(&request.items).await?;
        let order = NewOrder::new(new_order_number(), request.customer, report.total);
        let placed = self.place_order(order, &report).await?;
        info!("💳️ Order [{}] created. Total: {}", placed.order.order_number, placed.order.total_amount);
        Ok(placed)
    }

    /// Asks the gateway for the state of the payment identified by `reference` and applies it to the order.
    ///
    /// Calling this again for an order that is already paid does not contact the gateway and changes nothing.
    pub async fn verify(&self, reference: &str) -> Result<VerifyOutcome, PaymentFlowError> {
        let order = self.fetch_order(reference).await?;
        if order.payment_status == PaymentStatus::Successful {
            debug!("💳️ Order [{}] has already been paid for. Nothing to do.", order.order_number);
            return Ok(VerifyOutcome::AlreadyConfirmed { order });
        }
        let verification = match self.gateway.verify(reference).await {
            Ok(v) => v,
            Err(e) if e.is_transient() => {
                warn!("💳️ Could not verify payment for [{reference}]. The order stays as it is. {e}");
                return Err(e.into());
            },
            Err(e) => {
                warn!("💳️ The gateway rejected verification of [{reference}]. Marking the payment as failed. {e}");
                if order.payment_status == PaymentStatus::Pending {
                    self.db.mark_order_failed(reference).await?;
                }
                return Err(e.into());
            },
        };
        match verification.status {
            GatewayPaymentStatus::Success => {
                if verification.amount != order.total_amount {
                    error!(
                        "💳️ The gateway reports a payment of {} for [{reference}], but the order total is {}. The order \
                         has NOT been marked as paid and needs manual attention.",
                        verification.amount, order.total_amount
                    );
                    return Err(PaymentFlowError::AmountMismatch {
                        reference: reference.to_string(),
                        expected: order.total_amount,
                        received: verification.amount,
                    });
                }
                self.confirm(order).await
            },
            GatewayPaymentStatus::Failed => self.fail(order).await,
            GatewayPaymentStatus::Pending => {
                debug!("💳️ Payment for [{reference}] is still in progress at the gateway");
                if order.payment_status == PaymentStatus::Failed {
                    Ok(VerifyOutcome::AlreadyFailed { order })
                } else {
                    Ok(VerifyOutcome::Pending { order })
                }
            },
        }
    }

    /// Moves the order for `reference` to `failed`, if it is still pending. An order that has already been paid stays
    /// paid and is reported as [`VerifyOutcome::AlreadyConfirmed`].
    pub async fn mark_failed(&self, reference: &str) -> Result<VerifyOutcome, PaymentFlowError> {
        let order = self.fetch_order(reference).await?;
        self.fail(order).await
    }

    /// Authenticates and dispatches a gateway webhook.
    ///
    /// The signature is checked against the raw body before anything else happens. An unsigned or badly signed
    /// request never reaches the store.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentFlowError> {
        let Some(signature) = signature else {
            warn!("🪝️ Webhook received without a signature. Rejecting it.");
            return Err(PaymentFlowError::InvalidSignature);
        };
        if !self.gateway.verify_webhook_signature(body, signature) {
            warn!("🪝️ Webhook received with an invalid signature. Rejecting it.");
            return Err(PaymentFlowError::InvalidSignature);
        }
        let payload: WebhookPayload =
            serde_json::from_slice(body).map_err(|e| PaymentFlowError::InvalidWebhook(e.to_string()))?;
        let event = payload.event.clone();
        debug!("🪝️ Handling {event} webhook");
        match event.as_str() {
            "charge.success" | "charge.failed" => {
                let reference = Self::webhook_reference(&payload)?;
                let result = if event == "charge.success" {
                    self.verify(reference).await
                } else {
                    self.mark_failed(reference).await
                };
                match result {
                    Ok(outcome) => Ok(WebhookOutcome::Payment { outcome }),
                    Err(PaymentFlowError::OrderNotFound(reference)) => {
                        warn!("🪝️ {event} webhook for unknown order reference {reference}");
                        Ok(WebhookOutcome::UnknownReference { event, reference })
                    },
                    Err(e) => Err(e),
                }
            },
            "transfer.success" | "transfer.failed" | "transfer.reversed" => self.apply_transfer_event(&payload).await,
            _ => {
                debug!("🪝️ Ignoring {event} webhook");
                Ok(WebhookOutcome::Ignored { event })
            },
        }
    }

    fn validator(&self) -> CartValidator<B> {
        CartValidator::new(self.db.clone(), self.pricing)
    }

    fn webhook_reference(payload: &WebhookPayload) -> Result<&str, PaymentFlowError> {
        payload
            .reference()
            .ok_or_else(|| PaymentFlowError::InvalidWebhook(format!("The {} event has no reference", payload.event)))
    }

    async fn fetch_order(&self, reference: &str) -> Result<Order, PaymentFlowError> {
        self.db.fetch_order_by_reference(reference).await?.ok_or_else(|| PaymentFlowError::OrderNotFound(reference.into()))
    }

    async fn place_order(&self, order: NewOrder, report: &CartReport) -> Result<PlacedOrder, StoreError> {
        let builder = OrderBuilder::new(self.db.clone());
        let (order, items) = builder.build(order, &report.to_line_items()).await?;
        let transactions = items
            .iter()
            .map(|item| NewPaymentTransaction::for_line_item(item, &order.payment_reference))
            .collect::<Vec<_>>();
        match self.db.insert_payment_transactions(&transactions).await {
            Ok(transactions) => Ok(PlacedOrder { order, items, transactions }),
            Err(e) => {
                warn!("💳️ Could not save payment transactions for [{}]. Removing the order. {e}", order.order_number);
                builder.discard(&order).await;
                Err(e)
            },
        }
    }

    async fn confirm(&self, order: Order) -> Result<VerifyOutcome, PaymentFlowError> {
        let reference = order.payment_reference.clone();
        let items = self.db.fetch_line_items(order.id).await?;
        let Some(order) = self.db.confirm_payment(&reference).await? else {
            let current = self.fetch_order(&reference).await?;
            return match current.payment_status {
                PaymentStatus::Successful => {
                    debug!("💳️ Order [{reference}] was confirmed by another caller");
                    Ok(VerifyOutcome::AlreadyConfirmed { order: current })
                },
                status => {
                    error!(
                        "💳️ The gateway reports a successful payment for [{reference}], but the order is {status}. \
                         This needs manual attention."
                    );
                    Err(PaymentFlowError::PaymentStatusConflict(format!(
                        "The gateway reports a successful payment for {reference}, but the order is {status}"
                    )))
                },
            };
        };
        info!("💳️ Payment for order [{}] confirmed. {} received.", order.order_number, order.total_amount);
        if order.fulfillment_status == FulfillmentStatus::Cancelled {
            warn!("💳️ Order [{}] was cancelled before its payment arrived. It will need a refund.", order.order_number);
        }
        let stock_alerts = self.take_stock(&order, &items).await;
        self.call_order_paid_hook(&order).await;
        Ok(VerifyOutcome::Confirmed { order, stock_alerts })
    }

    async fn fail(&self, order: Order) -> Result<VerifyOutcome, PaymentFlowError> {
        let reference = order.payment_reference.clone();
        if let Some(order) = self.db.mark_order_failed(&reference).await? {
            info!("💳️ Payment for order [{}] failed", order.order_number);
            return Ok(VerifyOutcome::Failed { order });
        }
        let current = self.fetch_order(&reference).await?;
        match current.payment_status {
            PaymentStatus::Failed => Ok(VerifyOutcome::AlreadyFailed { order: current }),
            PaymentStatus::Successful => {
                warn!(
                    "💳️ The gateway reports a failed payment for [{reference}], but the order has already been paid. \
                     Keeping it as paid."
                );
                Ok(VerifyOutcome::AlreadyConfirmed { order: current })
            },
            status => {
                error!("💳️ The gateway reports a failed payment for [{reference}], but the order is {status}");
                Err(PaymentFlowError::PaymentStatusConflict(format!(
                    "The gateway reports a failed payment for {reference}, but the order is {status}"
                )))
            },
        }
    }

    /// Removes the ordered quantities from stock. Shortfalls are recorded as stock alerts. They never undo the payment.
    async fn take_stock(&self, order: &Order, items: &[LineItem]) -> Vec<StockAlert> {
        let mut quantities = BTreeMap::<i64, i64>::new();
        for item in items {
            *quantities.entry(item.product_id).or_default() += item.quantity;
        }
        let ledger = StockLedger::new(self.db.clone()).with_max_attempts(self.stock_attempts);
        let mut alerts = Vec::new();
        for (product_id, quantity) in quantities {
            match ledger.decrement(product_id, quantity).await {
                Ok(stock) => trace!("💳️ Product {product_id} stock is now {stock}"),
                Err(e) => {
                    warn!("💳️ Could not take {quantity} of product {product_id} for order [{}]. {e}", order.order_number);
                    let alert = NewStockAlert { order_id: order.id, product_id, quantity, reason: e.to_string() };
                    if let Some(alert) = self.raise_stock_alert(alert).await {
                        alerts.push(alert);
                    }
                },
            }
        }
        alerts
    }

    async fn raise_stock_alert(&self, alert: NewStockAlert) -> Option<StockAlert> {
        let (order_id, product_id, quantity) = (alert.order_id, alert.product_id, alert.quantity);
        match self.db.insert_stock_alert(alert).await {
            Ok(alert) => {
                self.producers.publish_stock_alert(StockAlertEvent::new(alert.clone())).await;
                Some(alert)
            },
            Err(e) => {
                error!(
                    "💳️ Stock for product {product_id} was not reduced by {quantity} for order #{order_id}, and the \
                     alert could not be saved either. Adjust the stock manually. {e}"
                );
                None
            },
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        debug!("💳️ Notifying order paid hook subscribers");
        self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
    }

    async fn apply_transfer_event(&self, payload: &WebhookPayload) -> Result<WebhookOutcome, PaymentFlowError> {
        let event = payload.event.clone();
        let reference = Self::webhook_reference(payload)?;
        let Some(transfer) = self.db.fetch_transfer_by_reference(reference).await? else {
            warn!("🪝️ {event} webhook for unknown transfer reference {reference}");
            return Ok(WebhookOutcome::UnknownReference { event, reference: reference.to_string() });
        };
        let (status, reason) = match event.as_str() {
            "transfer.success" => (TransferStatus::Success, None),
            "transfer.reversed" => (TransferStatus::Failed, Some(payload.reason().unwrap_or("Transfer reversed"))),
            _ => (TransferStatus::Failed, Some(payload.reason().unwrap_or("Transfer failed"))),
        };
        let transfer = self.db.update_transfer_status(transfer.id, status, reason).await?;
        info!("🪝️ Transfer {} for seller #{} is now {}", transfer.reference, transfer.seller_id, transfer.status);
        Ok(WebhookOutcome::Transfer { transfer })
    }
}
