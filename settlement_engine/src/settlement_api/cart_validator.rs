use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    db_types::{Naira, Product},
    helpers::prices_match,
    pricing::PricingPolicy,
    settlement_api::{
        cart_objects::{CartIssue, CartLine, CartReport, ValidatedLine},
        errors::CartError,
    },
    traits::CatalogManagement,
};

/// Re-derives every price in a cart from the catalog and checks ownership, quantity and stock.
///
/// Client-supplied prices are only ever compared against the authoritative ones. They are never used.
#[derive(Clone)]
pub struct CartValidator<B> {
    db: B,
    pricing: PricingPolicy,
}

impl<B> Debug for CartValidator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartValidator ({:?})", self.pricing)
    }
}

impl<B> CartValidator<B> {
    pub fn new(db: B, pricing: PricingPolicy) -> Self {
        Self { db, pricing }
    }
}

impl<B> CartValidator<B>
where B: CatalogManagement
{
    pub async fn validate(&self, lines: &[CartLine]) -> Result<CartReport, CartError> {
        let ids = lines.iter().map(|l| l.product_id).collect::<Vec<_>>();
        let products = self.db.fetch_products(&ids).await?;
        let products = products.into_iter().map(|p| (p.id, p)).collect::<HashMap<i64, Product>>();
        let validated = lines.iter().map(|line| self.validate_line(line, products.get(&line.product_id))).collect();
        let report = CartReport::new(validated);
        if report.valid {
            trace!("🛒️ Cart of {} lines is valid. Total: {}", report.lines.len(), report.total);
        } else {
            debug!("🛒️ Cart rejected. {}", report.summary());
        }
        Ok(report)
    }

    /// Like [`Self::validate`], but an invalid cart is returned as [`CartError::Invalid`].
    pub async fn require_valid(&self, lines: &[CartLine]) -> Result<CartReport, CartError> {
        let report = self.validate(lines).await?;
        if report.valid {
            Ok(report)
        } else {
            Err(CartError::Invalid(report))
        }
    }

    fn validate_line(&self, line: &CartLine, product: Option<&Product>) -> ValidatedLine {
        let mut result = ValidatedLine {
            product_id: line.product_id,
            seller_id: line.seller_id,
            quantity: line.quantity,
            unit_price: Naira::default(),
            wholesale_price: Naira::default(),
            line_total: Naira::default(),
            issues: vec![],
        };
        let Some(product) = product.filter(|p| !p.deleted) else {
            result.issues.push(CartIssue::ProductNotFound);
            return result;
        };
        let unit_price = self.pricing.customer_price(product.wholesale_price);
        result.unit_price = unit_price;
        result.wholesale_price = product.wholesale_price;
        if product.seller_id != line.seller_id {
            result.issues.push(CartIssue::OwnershipMismatch { actual_seller_id: product.seller_id });
        }
        if line.quantity < 1 {
            result.issues.push(CartIssue::InvalidQuantity { quantity: line.quantity });
            return result;
        }
        // The line total must fit in an order total the gateway can be asked to charge
        let Some(line_total) = unit_price.checked_mul(line.quantity).filter(|t| t.checked_to_kobo().is_some()) else {
            result.issues.push(CartIssue::InvalidQuantity { quantity: line.quantity });
            return result;
        };
        result.line_total = line_total;
        if product.stock < line.quantity {
            result.issues.push(CartIssue::InsufficientStock { available: product.stock });
        }
        if !prices_match(line.unit_price, unit_price.as_f64()) {
            result.issues.push(CartIssue::PriceMismatch { claimed: line.unit_price, expected: unit_price });
        }
        if !prices_match(line.line_total, result.line_total.as_f64()) {
            result.issues.push(CartIssue::TotalMismatch { claimed: line.line_total, expected: result.line_total });
        }
        result
    }
}
