use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Naira, PaymentTransaction, Transfer},
    traits::{EarningsTotals, PlatformSummary, SettlementManagement, StoreError},
};

/// A seller's earnings position, with the history behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerEarnings {
    pub seller_id: i64,
    #[serde(flatten)]
    pub totals: EarningsTotals,
    /// Completed earnings that have not yet reached the seller's bank account
    pub outstanding: Naira,
    pub transactions: Vec<PaymentTransaction>,
    pub transfers: Vec<Transfer>,
}

/// Read-only views over payment transactions and transfers.
#[derive(Clone)]
pub struct EarningsApi<B> {
    db: B,
}

impl<B> Debug for EarningsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EarningsApi")
    }
}

impl<B> EarningsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> EarningsApi<B>
where B: SettlementManagement
{
    pub async fn earnings_for_seller(&self, seller_id: i64) -> Result<SellerEarnings, StoreError> {
        let totals = self.db.earnings_totals(seller_id).await?;
        let transactions = self.db.fetch_transactions_for_seller(seller_id).await?;
        let transfers = self.db.fetch_transfers_for_seller(seller_id).await?;
        trace!(
            "📒️ Seller #{seller_id}: {} transactions, {} transfers, {} earned",
            transactions.len(),
            transfers.len(),
            totals.total_earnings
        );
        Ok(SellerEarnings { seller_id, outstanding: totals.outstanding(), totals, transactions, transfers })
    }

    pub async fn platform_summary(&self) -> Result<PlatformSummary, StoreError> {
        self.db.platform_summary().await
    }
}
