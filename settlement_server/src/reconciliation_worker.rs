use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use log::*;
use settlement_engine::{
    payment_objects::{ReconciliationOutcome, ReconciliationReport},
    PaymentFlowApi,
    ReconciliationApi,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::integrations::paystack::PaystackGateway;

/// How far back the first orphan scan looks, and how much each later scan overlaps the previous one.
const ORPHAN_SCAN_OVERLAP: Duration = Duration::hours(1);

/// Starts the reconciliation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// On every tick the worker re-verifies pending orders older than `pending_after` (a callback or webhook may never
/// have arrived for them) and fails those still unpaid after `session_expiry`. Then it asks the gateway for recent
/// transactions and warns about any that have no order.
pub fn start_reconciliation_worker(
    flow: PaymentFlowApi<SqliteDatabase, PaystackGateway>,
    interval: StdDuration,
    pending_after: Duration,
    session_expiry: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ReconciliationApi::new(flow).with_session_expiry(session_expiry);
        let mut last_scan = Utc::now() - ORPHAN_SCAN_OVERLAP;
        info!("🔍️ Reconciliation worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            info!("🔍️ Running reconciliation sweep");
            match api.reconcile_pending(pending_after).await {
                Ok(report) => {
                    info!("🔍️ {} pending orders re-verified", report.orders.len());
                    debug!("🔍️ Reconciled orders: {}", order_list(&report));
                },
                Err(e) => error!("🔍️ Error reconciling pending orders: {e}"),
            }
            let scan_started = Utc::now();
            match api.find_orphaned_sessions(last_scan).await {
                Ok(orphans) if orphans.is_empty() => {
                    trace!("🔍️ No orphaned payment sessions since {last_scan}");
                    last_scan = scan_started - ORPHAN_SCAN_OVERLAP;
                },
                Ok(orphans) => {
                    warn!("🔍️ {} gateway transactions since {last_scan} have no matching order", orphans.len());
                    last_scan = scan_started - ORPHAN_SCAN_OVERLAP;
                },
                Err(e) => error!("🔍️ Error scanning for orphaned payment sessions: {e}"),
            }
            match api.unresolved_stock_alerts().await {
                Ok(alerts) if !alerts.is_empty() => {
                    warn!("🔍️ There are {} unresolved stock alerts", alerts.len());
                },
                Ok(_) => {},
                Err(e) => error!("🔍️ Could not fetch stock alerts: {e}"),
            }
        }
    })
}

fn order_list(report: &ReconciliationReport) -> String {
    report
        .orders
        .iter()
        .map(|o| match &o.outcome {
            ReconciliationOutcome::Verified { outcome } => {
                format!("[{}] {}/{}", o.reference, outcome.order().payment_status, outcome.order().fulfillment_status)
            },
            ReconciliationOutcome::Error { message } => format!("[{}] error: {message}", o.reference),
        })
        .collect::<Vec<String>>()
        .join(", ")
}
