use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Naira, NewProduct, NewSeller, Product, Seller},
    pricing::PricingPolicy,
    settlement_api::errors::CatalogApiError,
    traits::CatalogManagement,
};

/// Seller and product maintenance. Customer prices are always derived from the wholesale price by the pricing policy;
/// there is no way to set one directly.
#[derive(Clone)]
pub struct CatalogApi<B> {
    db: B,
    pricing: PricingPolicy,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.pricing)
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, pricing: PricingPolicy) -> Self {
        Self { db, pricing }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn add_seller(&self, seller: NewSeller) -> Result<Seller, CatalogApiError> {
        let seller = self.db.insert_seller(seller).await?;
        info!("🏷️ Seller #{} ({}) added", seller.id, seller.name);
        Ok(seller)
    }

    pub async fn seller(&self, seller_id: i64) -> Result<Seller, CatalogApiError> {
        self.db.fetch_seller(seller_id).await?.ok_or(CatalogApiError::SellerNotFound(seller_id))
    }

    pub async fn update_payout_details(
        &self,
        seller_id: i64,
        account_number: &str,
        bank_code: &str,
        account_name: Option<&str>,
    ) -> Result<Seller, CatalogApiError> {
        if account_number.trim().is_empty() || bank_code.trim().is_empty() {
            return Err(CatalogApiError::InvalidPayoutDetails("Bank account number and bank code are required".into()));
        }
        self.seller(seller_id).await?;
        let seller = self.db.update_payout_details(seller_id, account_number, bank_code, account_name).await?;
        debug!("🏷️ Payout details for seller #{seller_id} updated");
        Ok(seller)
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        Self::check_product(&product)?;
        self.seller(product.seller_id).await?;
        let customer_price = self.pricing.customer_price(product.wholesale_price);
        let product = self.db.insert_product(product, customer_price).await?;
        info!(
            "🏷️ Product #{} ({}) listed by seller #{} at {} ({} wholesale)",
            product.id, product.name, product.seller_id, product.customer_price, product.wholesale_price
        );
        Ok(product)
    }

    pub async fn product(&self, product_id: i64) -> Result<Product, CatalogApiError> {
        self.db
            .fetch_product(product_id)
            .await?
            .filter(|p| !p.deleted)
            .ok_or(CatalogApiError::ProductNotFound(product_id))
    }

    /// Changes a product's wholesale price, re-deriving its customer price. Existing orders keep their snapshot
    /// prices.
    pub async fn update_wholesale_price(
        &self,
        product_id: i64,
        seller_id: i64,
        wholesale_price: Naira,
    ) -> Result<Product, CatalogApiError> {
        if wholesale_price < Naira::default() {
            return Err(CatalogApiError::InvalidProduct(format!("Wholesale price cannot be negative: {wholesale_price}")));
        }
        let customer_price = self.pricing.customer_price(wholesale_price);
        let product = self
            .db
            .update_product_prices(product_id, seller_id, wholesale_price, customer_price)
            .await?
            .ok_or(CatalogApiError::ProductNotFound(product_id))?;
        debug!("🏷️ Product #{product_id} now sells at {customer_price}");
        Ok(product)
    }

    pub async fn remove_product(&self, product_id: i64, seller_id: i64) -> Result<(), CatalogApiError> {
        if self.db.soft_delete_product(product_id, seller_id).await? {
            info!("🏷️ Product #{product_id} removed by seller #{seller_id}");
            Ok(())
        } else {
            Err(CatalogApiError::ProductNotFound(product_id))
        }
    }

    fn check_product(product: &NewProduct) -> Result<(), CatalogApiError> {
        if product.name.trim().is_empty() {
            return Err(CatalogApiError::InvalidProduct("Product name cannot be empty".into()));
        }
        if product.wholesale_price < Naira::default() {
            return Err(CatalogApiError::InvalidProduct(format!(
                "Wholesale price cannot be negative: {}",
                product.wholesale_price
            )));
        }
        if product.stock < 0 {
            return Err(CatalogApiError::InvalidProduct(format!("Stock cannot be negative: {}", product.stock)));
        }
        Ok(())
    }
}
