use log::{debug, trace};
use sqlx::SqliteConnection;

use super::single_row;

use crate::{
    db_types::{Naira, NewPaymentTransaction, PaymentTransaction},
    traits::{EarningsTotals, PlatformSummary},
};

/// Inserts the transactions, skipping any that already exist for the same (gateway reference, line item). Returns the
/// stored row for every input, whether it was inserted by this call or not.
pub async fn insert_transactions(
    transactions: &[NewPaymentTransaction],
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    let mut result = Vec::with_capacity(transactions.len());
    for tx in transactions {
        let inserted = sqlx::query(
            r#"
                INSERT INTO payment_transactions (
                    order_id,
                    line_item_id,
                    seller_id,
                    gross_amount,
                    seller_earning,
                    platform_commission,
                    gateway_reference
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (gateway_reference, line_item_id) DO NOTHING;
            "#,
        )
        .bind(tx.order_id)
        .bind(tx.line_item_id)
        .bind(tx.seller_id)
        .bind(tx.gross_amount)
        .bind(tx.seller_earning)
        .bind(tx.platform_commission)
        .bind(&tx.gateway_reference)
        .execute(&mut *conn)
        .await?;
        if inserted.rows_affected() == 0 {
            trace!("💸️ Transaction for line item #{} already exists", tx.line_item_id);
        }
        let row: PaymentTransaction =
            sqlx::query_as("SELECT * FROM payment_transactions WHERE gateway_reference = $1 AND line_item_id = $2")
                .bind(&tx.gateway_reference)
                .bind(tx.line_item_id)
                .fetch_all(&mut *conn)
                .await
                .and_then(single_row)?;
        result.push(row);
    }
    Ok(result)
}

pub async fn complete_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_transactions SET status = 'completed', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND \
         status = 'pending'",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    debug!("💸️ {} transactions completed for order #{order_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM payment_transactions WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

pub async fn fetch_for_seller(
    seller_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM payment_transactions WHERE seller_id = $1 ORDER BY id DESC")
        .bind(seller_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

pub async fn earnings_totals(seller_id: i64, conn: &mut SqliteConnection) -> Result<EarningsTotals, sqlx::Error> {
    let (total_gross, total_earnings, total_commission, pending_earnings, completed_transactions): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
            SELECT
                COALESCE(SUM(CASE WHEN t.status = 'completed' THEN t.gross_amount END), 0),
                COALESCE(SUM(CASE WHEN t.status = 'completed' THEN t.seller_earning END), 0),
                COALESCE(SUM(CASE WHEN t.status = 'completed' THEN t.platform_commission END), 0),
                COALESCE(SUM(CASE WHEN t.status = 'pending' AND o.payment_status = 'pending'
                    THEN t.seller_earning END), 0),
                COUNT(CASE WHEN t.status = 'completed' THEN 1 END)
            FROM payment_transactions t JOIN orders o ON o.id = t.order_id
            WHERE t.seller_id = $1;
        "#,
    )
    .bind(seller_id)
    .fetch_all(&mut *conn)
    .await
    .and_then(single_row)?;
    let (paid_out, in_flight): (i64, i64) = sqlx::query_as(
        r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'success' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN status = 'pending' THEN amount END), 0)
            FROM transfers WHERE seller_id = $1;
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    Ok(EarningsTotals {
        total_gross: Naira::from(total_gross),
        total_earnings: Naira::from(total_earnings),
        total_commission: Naira::from(total_commission),
        pending_earnings: Naira::from(pending_earnings),
        paid_out: Naira::from(paid_out),
        payouts_in_flight: Naira::from(in_flight),
        completed_transactions,
    })
}

pub async fn platform_summary(conn: &mut SqliteConnection) -> Result<PlatformSummary, sqlx::Error> {
    let summary = sqlx::query_as(
        r#"
            SELECT
                COALESCE(SUM(gross_amount), 0) AS total_gross,
                COALESCE(SUM(platform_commission), 0) AS total_commission,
                COUNT(*) AS completed_transactions
            FROM payment_transactions WHERE status = 'completed';
        "#,
    )
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    Ok(summary)
}
