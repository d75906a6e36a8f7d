use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{CustomerDetails, LineItem, Order, PaymentTransaction, StockAlert, Transfer},
    settlement_api::cart_objects::CartLine,
};

/// A customer's request to check out a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub items: Vec<CartLine>,
}

/// An order that has been written to the store, together with its line items and pending payment transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<LineItem>,
    pub transactions: Vec<PaymentTransaction>,
}

/// A placed order plus the hosted payment session the customer must be sent to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    #[serde(flatten)]
    pub placed: PlacedOrder,
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// This call moved the order to `successful` and applied the side effects.
    Confirmed { order: Order, stock_alerts: Vec<StockAlert> },
    /// The order was already successful. Nothing changed.
    AlreadyConfirmed { order: Order },
    /// This call moved the order to `failed`.
    Failed { order: Order },
    AlreadyFailed { order: Order },
    /// The gateway has not reached a final state yet.
    Pending { order: Order },
}

impl VerifyOutcome {
    pub fn order(&self) -> &Order {
        match self {
            VerifyOutcome::Confirmed { order, .. } |
            VerifyOutcome::AlreadyConfirmed { order } |
            VerifyOutcome::Failed { order } |
            VerifyOutcome::AlreadyFailed { order } |
            VerifyOutcome::Pending { order } => order,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, VerifyOutcome::Confirmed { .. } | VerifyOutcome::AlreadyConfirmed { .. })
    }
}

/// The JSON body of a gateway webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookPayload {
    pub fn reference(&self) -> Option<&str> {
        self.data.get("reference").and_then(Value::as_str)
    }

    pub fn reason(&self) -> Option<&str> {
        ["reason", "gateway_response", "message"].iter().find_map(|k| self.data.get(*k).and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Payment { outcome: VerifyOutcome },
    Transfer { transfer: Transfer },
    /// The event refers to an order or transfer this store does not know about.
    UnknownReference { event: String, reference: String },
    Ignored { event: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Verified { outcome: VerifyOutcome },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledOrder {
    pub reference: String,
    #[serde(flatten)]
    pub outcome: ReconciliationOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub orders: Vec<ReconciledOrder>,
}

impl ReconciliationReport {
    pub fn confirmed(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Confirmed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Failed { .. }))
    }

    pub fn still_pending(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Pending { .. }))
    }

    pub fn errors(&self) -> usize {
        self.orders.iter().filter(|o| matches!(o.outcome, ReconciliationOutcome::Error { .. })).count()
    }

    fn count<F: Fn(&VerifyOutcome) -> bool>(&self, f: F) -> usize {
        self.orders
            .iter()
            .filter(|o| match &o.outcome {
                ReconciliationOutcome::Verified { outcome } => f(outcome),
                ReconciliationOutcome::Error { .. } => false,
            })
            .count()
    }
}
