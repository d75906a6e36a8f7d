//! Customer-facing prices and the platform commission.
//!
//! Sellers list products at a wholesale price. Customers pay
//!
//! ```text
//! customer_price = wholesale + BASE_FEE + round(wholesale × FEE_RATE)
//! ```
//!
//! and the platform keeps `customer_price - wholesale`. Rounding is half-away-from-zero.
use mkt_common::Naira;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_FEE: i64 = 5_000;
pub const DEFAULT_FEE_RATE: f64 = 0.07;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub base_fee: Naira,
    pub fee_rate: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { base_fee: Naira::from(DEFAULT_BASE_FEE), fee_rate: DEFAULT_FEE_RATE }
    }
}

/// How a line's gross amount is divided between the seller and the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub gross: Naira,
    pub seller_earning: Naira,
    pub commission: Naira,
}

impl PricingPolicy {
    pub fn new(base_fee: Naira, fee_rate: f64) -> Self {
        Self { base_fee, fee_rate }
    }

    pub fn customer_price(&self, wholesale: Naira) -> Naira {
        #[allow(clippy::cast_possible_truncation)]
        let markup = (wholesale.as_f64() * self.fee_rate).round() as i64;
        wholesale + self.base_fee + Naira::from(markup)
    }

    pub fn commission(&self, customer_price: Naira, wholesale: Naira) -> Naira {
        customer_price - wholesale
    }

    pub fn split(&self, wholesale: Naira, quantity: i64) -> CommissionSplit {
        let unit = self.customer_price(wholesale);
        let gross = unit * quantity;
        let seller_earning = wholesale * quantity;
        CommissionSplit { gross, seller_earning, commission: gross - seller_earning }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.customer_price(Naira::from(850_000)), Naira::from(914_500));
        assert_eq!(policy.customer_price(Naira::from(0)), Naira::from(5_000));
        assert_eq!(policy.commission(Naira::from(914_500), Naira::from(850_000)), Naira::from(64_500));
    }

    #[test]
    fn markup_rounds_half_away_from_zero() {
        let policy = PricingPolicy::default();
        // 50 × 0.07 = 3.5
        assert_eq!(policy.customer_price(Naira::from(50)), Naira::from(5_054));
        // 7 × 0.07 = 0.49
        assert_eq!(policy.customer_price(Naira::from(7)), Naira::from(5_007));
        // 64 × 0.07 = 4.48
        assert_eq!(policy.customer_price(Naira::from(64)), Naira::from(5_068));
    }

    #[test]
    fn pricing_identity_holds() {
        let policy = PricingPolicy::default();
        for w in (0..2_000_000).step_by(7_919) {
            let w = Naira::from(w);
            let price = policy.customer_price(w);
            assert_eq!(policy.commission(price, w) + w, price);
            assert!(price >= w + policy.base_fee);
        }
    }

    #[test]
    fn custom_policy() {
        let policy = PricingPolicy::new(Naira::from(1_000), 0.1);
        assert_eq!(policy.customer_price(Naira::from(10_000)), Naira::from(12_000));
    }

    #[test]
    fn split_for_quantity() {
        let policy = PricingPolicy::default();
        let split = policy.split(Naira::from(850_000), 2);
        assert_eq!(split.gross, Naira::from(1_829_000));
        assert_eq!(split.seller_earning, Naira::from(1_700_000));
        assert_eq!(split.commission, Naira::from(129_000));
    }
}
