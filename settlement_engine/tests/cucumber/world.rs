use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use settlement_engine::{
    db_types::{Product, Seller},
    payment_objects::{CheckoutSession, VerifyOutcome},
    PaymentFlowError,
    SellerPayout,
};

use crate::support::Marketplace;

#[derive(Default, World)]
pub struct MarketWorld {
    pub market: Option<Marketplace>,
    pub sellers: HashMap<String, Seller>,
    pub products: HashMap<String, Product>,
    pub session: Option<CheckoutSession>,
    pub checkout_error: Option<PaymentFlowError>,
    pub verify_outcome: Option<VerifyOutcome>,
    pub webhook_error: Option<PaymentFlowError>,
    pub payouts: Vec<SellerPayout>,
}

impl Debug for MarketWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarketWorld ({} sellers, {} products)", self.sellers.len(), self.products.len())
    }
}

impl MarketWorld {
    pub async fn market(&mut self) -> &Marketplace {
        if self.market.is_none() {
            self.market = Some(Marketplace::new().await);
        }
        self.market.as_ref().expect("Marketplace not initialised")
    }

    pub fn seller(&self, name: &str) -> &Seller {
        self.sellers.get(name).unwrap_or_else(|| panic!("No seller named {name}"))
    }

    pub fn product(&self, name: &str) -> &Product {
        self.products.get(name).unwrap_or_else(|| panic!("No product named {name}"))
    }

    pub fn session(&self) -> &CheckoutSession {
        self.session.as_ref().expect("No checkout has taken place")
    }
}
