use mkt_common::Naira;
use thiserror::Error;

use crate::{
    db_types::{FulfillmentStatus, PaymentStatus, TransferStatus},
    settlement_api::cart_objects::CartReport,
    traits::{GatewayError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum StockError {
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Invalid quantity {0}. Quantities must be at least 1")]
    InvalidQuantity(i64),
    #[error("Insufficient stock for product {product_id}. Only {available} available, but {requested} requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Stock for product {0} kept changing while it was being updated. Giving up.")]
    ConcurrentModification(i64),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("The cart is invalid. {}", .0.summary())]
    Invalid(CartReport),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("The cart is invalid. {}", .0.summary())]
    Validation(CartReport),
    #[error("No order exists for payment reference {0}")]
    OrderNotFound(String),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("Payment status conflict. {0}")]
    PaymentStatusConflict(String),
    #[error("The gateway reported {received} for {reference}, but the order total is {expected}")]
    AmountMismatch { reference: String, expected: Naira, received: Naira },
    #[error("The webhook signature is missing or invalid")]
    InvalidSignature,
    #[error("Could not parse webhook payload. {0}")]
    InvalidWebhook(String),
    #[error("A checkout session was opened for {reference}, but the order could not be saved. {reason}")]
    OrphanedSession { reference: String, reason: String },
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

impl From<CartError> for PaymentFlowError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::Invalid(report) => Self::Validation(report),
            CartError::StoreError(e) => Self::StoreError(e),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} has payment status {1}. Only successful orders can be settled")]
    OrderNotPaid(i64, PaymentStatus),
    #[error("Seller {0} does not exist")]
    SellerNotFound(i64),
    #[error("Seller {0} has not supplied bank details for payouts")]
    MissingPayoutDetails(i64),
    #[error("Transfer {0} does not exist")]
    TransferNotFound(i64),
    #[error("Transfer {id} is {status}. Only failed transfers can be retried")]
    TransferNotRetryable { id: i64, status: TransferStatus },
    #[error("Transfer {0} does not belong to the requesting seller")]
    NotTransferOwner(i64),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Seller {seller_id} has no items in order {order_id}")]
    NotOrderSeller { order_id: i64, seller_id: i64 },
    #[error("Order {0} has not been paid")]
    PaymentNotSuccessful(i64),
    #[error("Cannot change fulfillment status from {from} to {to}")]
    InvalidTransition { from: FulfillmentStatus, to: FulfillmentStatus },
    #[error("Order {0} kept changing while it was being updated. Giving up.")]
    ConcurrentModification(i64),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Seller {0} does not exist")]
    SellerNotFound(i64),
    #[error("Product {0} does not exist or does not belong to the seller")]
    ProductNotFound(i64),
    #[error("Invalid product data. {0}")]
    InvalidProduct(String),
    #[error("Invalid payout details. {0}")]
    InvalidPayoutDetails(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}
