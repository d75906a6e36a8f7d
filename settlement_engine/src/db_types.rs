use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use mkt_common::Naira;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Seller         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bank_account_number: Option<String>,
    pub bank_code: Option<String>,
    pub account_name: Option<String>,
    /// The gateway's token for this seller's payout account. Created lazily on the first payout.
    pub recipient_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    /// Returns the bank details needed to register a payout recipient, if the seller has supplied all of them.
    pub fn payout_account(&self) -> Option<PayoutAccount> {
        let account_number = self.bank_account_number.as_ref().filter(|s| !s.trim().is_empty())?;
        let bank_code = self.bank_code.as_ref().filter(|s| !s.trim().is_empty())?;
        let name = self.account_name.clone().unwrap_or_else(|| self.name.clone());
        Some(PayoutAccount { name, account_number: account_number.clone(), bank_code: bank_code.clone() })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSeller {
    pub name: String,
    pub email: String,
    pub bank_account_number: Option<String>,
    pub bank_code: Option<String>,
    pub account_name: Option<String>,
}

impl NewSeller {
    pub fn new<S: Into<String>>(name: S, email: S) -> Self {
        Self { name: name.into(), email: email.into(), ..Default::default() }
    }

    pub fn with_bank_details(mut self, account_number: &str, bank_code: &str, account_name: &str) -> Self {
        self.bank_account_number = Some(account_number.to_string());
        self.bank_code = Some(bank_code.to_string());
        self.account_name = Some(account_name.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub wholesale_price: Naira,
    /// Always derived from `wholesale_price` by the pricing policy
    pub customer_price: Naira,
    pub stock: i64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    pub wholesale_price: Naira,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: i64, name: S, wholesale_price: Naira, stock: i64) -> Self {
        Self { seller_id, name: name.into(), wholesale_price, stock }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The order has been created, but the gateway has not confirmed a payment yet
    Pending,
    /// The gateway verified the payment. This is a terminal state.
    Successful,
    /// The gateway reported the payment as failed, or the session expired unpaid. This is a terminal state.
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Successful => write!(f, "successful"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   FulfillmentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Forward moves along pending → processing → shipped → delivered, or cancellation from any non-terminal state.
    pub fn can_transition_to(&self, next: FulfillmentStatus) -> bool {
        use FulfillmentStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            _ => false,
        }
    }
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Pending => write!(f, "pending"),
            FulfillmentStatus::Processing => write!(f, "processing"),
            FulfillmentStatus::Shipped => write!(f, "shipped"),
            FulfillmentStatus::Delivered => write!(f, "delivered"),
            FulfillmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid fulfillment status: {s}"))),
        }
    }
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The customer-facing order identifier, `ORD-<unix millis>-<6 uppercase alphanumerics>`. It doubles as the payment
/// reference sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub total_amount: Naira,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub authorization_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub shipping_address: String,
}

/// An order header, ready to be written. Line items are written separately by the order builder.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer: CustomerDetails,
    pub total_amount: Naira,
    pub authorization_url: Option<String>,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, customer: CustomerDetails, total_amount: Naira) -> Self {
        Self { order_number, customer, total_amount, authorization_url: None }
    }

    pub fn with_authorization_url<S: Into<String>>(mut self, url: S) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn payment_reference(&self) -> &str {
        self.order_number.as_str()
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    /// Customer price per unit at the time of the order
    pub unit_price: Naira,
    /// Wholesale price per unit at the time of the order
    pub unit_wholesale_price: Naira,
    pub line_total: Naira,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    pub fn seller_earning(&self) -> Naira {
        self.unit_wholesale_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    pub unit_price: Naira,
    pub unit_wholesale_price: Naira,
    pub line_total: Naira,
}

//--------------------------------------  PaymentTransaction   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The commission split for a single line item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    pub order_id: i64,
    pub line_item_id: i64,
    pub seller_id: i64,
    pub gross_amount: Naira,
    pub seller_earning: Naira,
    pub platform_commission: Naira,
    pub status: TransactionStatus,
    pub gateway_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentTransaction {
    pub order_id: i64,
    pub line_item_id: i64,
    pub seller_id: i64,
    pub gross_amount: Naira,
    pub seller_earning: Naira,
    pub platform_commission: Naira,
    pub gateway_reference: String,
}

impl NewPaymentTransaction {
    /// Splits the line total into the seller's earning (snapshot wholesale × qty) and the platform commission.
    pub fn for_line_item(item: &LineItem, gateway_reference: &str) -> Self {
        let seller_earning = item.seller_earning();
        Self {
            order_id: item.order_id,
            line_item_id: item.id,
            seller_id: item.seller_id,
            gross_amount: item.line_total,
            seller_earning,
            platform_commission: item.line_total - seller_earning,
            gateway_reference: gateway_reference.to_string(),
        }
    }
}

//--------------------------------------       Transfer        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Success,
    Failed,
}

impl Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Pending => write!(f, "pending"),
            TransferStatus::Success => write!(f, "success"),
            TransferStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A payout to one seller for their share of one order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: i64,
    pub amount: Naira,
    pub status: TransferStatus,
    pub transfer_code: Option<String>,
    pub reference: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub order_id: i64,
    pub seller_id: i64,
    pub amount: Naira,
    pub reference: String,
}

impl NewTransfer {
    pub fn new(order: &Order, seller_id: i64, amount: Naira) -> Self {
        let reference = format!("{}-S{seller_id}", order.order_number);
        Self { order_id: order.id, seller_id, amount, reference }
    }
}

//--------------------------------------      StockAlert       ---------------------------------------------------------
/// A stock decrement that could not be applied after a payment succeeded. The payment stands; these rows are for
/// manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reason: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockAlert {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reason: String,
}
