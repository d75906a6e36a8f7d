use std::fmt::Display;

use mkt_common::Naira;
use serde::{Deserialize, Serialize};

use crate::db_types::NewLineItem;

/// A line of a customer's cart, as submitted by the client. Prices are claims to be checked, never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    /// The unit price the client displayed to the customer
    pub unit_price: f64,
    /// The line total the client displayed to the customer
    pub line_total: f64,
}

impl CartLine {
    pub fn new(product_id: i64, seller_id: i64, quantity: i64, unit_price: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let line_total = unit_price * quantity as f64;
        Self { product_id, seller_id, quantity, unit_price, line_total }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartIssue {
    /// The product does not exist or has been deleted
    ProductNotFound,
    /// The product is sold by a different seller than the one claimed
    OwnershipMismatch { actual_seller_id: i64 },
    InvalidQuantity { quantity: i64 },
    InsufficientStock { available: i64 },
    PriceMismatch { claimed: f64, expected: Naira },
    TotalMismatch { claimed: f64, expected: Naira },
}

impl Display for CartIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartIssue::ProductNotFound => write!(f, "Product not found"),
            CartIssue::OwnershipMismatch { actual_seller_id } => {
                write!(f, "Product is sold by seller {actual_seller_id}")
            },
            CartIssue::InvalidQuantity { quantity } => write!(f, "Invalid quantity {quantity}"),
            CartIssue::InsufficientStock { available } => write!(f, "Insufficient stock. Only {available} available"),
            CartIssue::PriceMismatch { claimed, expected } => {
                write!(f, "Price mismatch. Claimed {claimed:.2}, but the price is {expected}")
            },
            CartIssue::TotalMismatch { claimed, expected } => {
                write!(f, "Line total mismatch. Claimed {claimed:.2}, but the total is {expected}")
            },
        }
    }
}

/// A cart line re-derived from the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedLine {
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    /// Authoritative customer price per unit
    pub unit_price: Naira,
    pub wholesale_price: Naira,
    pub line_total: Naira,
    pub issues: Vec<CartIssue>,
}

impl ValidatedLine {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The outcome of validating a whole cart. A single invalid line, an empty cart, or a total too large to charge makes
/// the whole cart invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartReport {
    pub valid: bool,
    pub lines: Vec<ValidatedLine>,
    /// Sum of the authoritative line totals
    pub total: Naira,
}

impl CartReport {
    pub fn new(lines: Vec<ValidatedLine>) -> Self {
        let total = lines
            .iter()
            .try_fold(Naira::default(), |acc, l| acc.checked_add(l.line_total))
            .filter(|t| t.checked_to_kobo().is_some());
        let valid = total.is_some() && !lines.is_empty() && lines.iter().all(ValidatedLine::is_valid);
        Self { valid, lines, total: total.unwrap_or_default() }
    }

    pub fn summary(&self) -> String {
        if self.lines.is_empty() {
            return "Cart is empty".to_string();
        }
        if !self.valid && self.lines.iter().all(ValidatedLine::is_valid) {
            return "Cart total is too large".to_string();
        }
        self.lines
            .iter()
            .filter(|l| !l.is_valid())
            .map(|l| {
                let issues = l.issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
                format!("Product {}: {issues}", l.product_id)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The line items to persist for this cart, with prices snapshotted from the catalog.
    pub fn to_line_items(&self) -> Vec<NewLineItem> {
        self.lines
            .iter()
            .map(|l| NewLineItem {
                product_id: l.product_id,
                seller_id: l.seller_id,
                quantity: l.quantity,
                unit_price: l.unit_price,
                unit_wholesale_price: l.wholesale_price,
                line_total: l.line_total,
            })
            .collect()
    }
}
