use mkt_common::Naira;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Aggregated earnings for a single seller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsTotals {
    /// Gross value of completed transactions
    pub total_gross: Naira,
    /// The seller's share of completed transactions
    pub total_earnings: Naira,
    /// The platform's share of completed transactions
    pub total_commission: Naira,
    /// The seller's share of transactions on orders still awaiting payment
    pub pending_earnings: Naira,
    /// Sum of successful transfers
    pub paid_out: Naira,
    /// Sum of transfers still in flight
    pub payouts_in_flight: Naira,
    pub completed_transactions: i64,
}

impl EarningsTotals {
    /// Earnings that have been collected but not paid out yet
    pub fn outstanding(&self) -> Naira {
        self.total_earnings - self.paid_out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub total_gross: Naira,
    pub total_commission: Naira,
    pub completed_transactions: i64,
}
