use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{Order, StockAlert},
    settlement_api::{
        errors::PaymentFlowError,
        payment_flow_api::PaymentFlowApi,
        payment_objects::{ReconciledOrder, ReconciliationOutcome, ReconciliationReport, VerifyOutcome},
    },
    traits::{GatewayTransaction, MarketplaceDatabase, PaymentGateway, StoreError},
};

/// How long a customer has to complete a payment session before the sweep gives up on it.
pub const DEFAULT_SESSION_EXPIRY: Duration = Duration::hours(24);

/// Sweeps for payments that slipped through the cracks: orders stuck in `pending` because a callback or webhook never
/// arrived, and gateway sessions with no order behind them. Also the place to clear stock alerts.
#[derive(Clone)]
pub struct ReconciliationApi<B, G> {
    flow: PaymentFlowApi<B, G>,
    session_expiry: Duration,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(flow: PaymentFlowApi<B, G>) -> Self {
        Self { flow, session_expiry: DEFAULT_SESSION_EXPIRY }
    }

    /// Orders that the gateway still reports as unpaid this long after they were created are failed by the sweep.
    pub fn with_session_expiry(mut self, session_expiry: Duration) -> Self {
        self.session_expiry = session_expiry;
        self
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    /// Re-verifies every pending order created more than `older_than` ago. A failure for one order is recorded in the
    /// report and does not stop the sweep.
    ///
    /// An order the gateway still has as unpaid is left alone until its session expires. After that it is failed, so
    /// abandoned checkouts do not stay pending forever.
    pub async fn reconcile_pending(&self, older_than: Duration) -> Result<ReconciliationReport, PaymentFlowError> {
        let cutoff = Utc::now() - older_than;
        let pending = self.flow.db().fetch_pending_orders(cutoff).await?;
        let mut report = ReconciliationReport::default();
        if pending.is_empty() {
            trace!("🔍️ No pending orders older than {cutoff}");
            return Ok(report);
        }
        info!("🔍️ Reconciling {} pending orders created before {cutoff}", pending.len());
        let expired_before = Utc::now() - self.session_expiry;
        for order in pending {
            let reference = order.payment_reference;
            let result = match self.flow.verify(&reference).await {
                Ok(VerifyOutcome::Pending { order }) if order.created_at < expired_before => self.expire(&order).await,
                result => result,
            };
            let outcome = match result {
                Ok(outcome) => ReconciliationOutcome::Verified { outcome },
                Err(e) => {
                    warn!("🔍️ Could not reconcile [{reference}]. {e}");
                    ReconciliationOutcome::Error { message: e.to_string() }
                },
            };
            report.orders.push(ReconciledOrder { reference, outcome });
        }
        info!(
            "🔍️ Reconciliation complete. {} confirmed, {} failed, {} still pending, {} errors",
            report.confirmed(),
            report.failed(),
            report.still_pending(),
            report.errors()
        );
        Ok(report)
    }

    async fn expire(&self, order: &Order) -> Result<VerifyOutcome, PaymentFlowError> {
        info!(
            "🔍️ The payment session for order [{}] was opened at {} and has not been paid. Failing the order.",
            order.order_number, order.created_at
        );
        self.flow.mark_failed(&order.payment_reference).await
    }

    /// Lists gateway transactions since `since` that have no matching order in the store.
    pub async fn find_orphaned_sessions(&self, since: DateTime<Utc>) -> Result<Vec<GatewayTransaction>, PaymentFlowError> {
        let transactions = self.flow.gateway().list_transactions(since).await?;
        let mut orphans = Vec::new();
        for tx in transactions {
            if self.flow.db().fetch_order_by_reference(&tx.reference).await?.is_none() {
                warn!(
                    "🔍️ Gateway transaction {} ({:?}, {}) has no matching order. It needs manual attention.",
                    tx.reference, tx.status, tx.amount
                );
                orphans.push(tx);
            }
        }
        Ok(orphans)
    }

    pub async fn unresolved_stock_alerts(&self) -> Result<Vec<StockAlert>, StoreError> {
        self.flow.db().fetch_unresolved_stock_alerts().await
    }

    pub async fn resolve_stock_alert(&self, alert_id: i64) -> Result<bool, StoreError> {
        let resolved = self.flow.db().resolve_stock_alert(alert_id).await?;
        if resolved {
            info!("🔍️ Stock alert #{alert_id} resolved");
        }
        Ok(resolved)
    }
}
