use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransfer, Transfer, TransferStatus},
    traits::StoreError,
};

/// Creates a pending transfer, or resets a failed one to pending. Returns `None` if a pending or successful transfer
/// already exists for the (order, seller) pair.
pub async fn claim_transfer(transfer: NewTransfer, conn: &mut SqliteConnection) -> Result<Option<Transfer>, StoreError> {
    let claimed: Option<Transfer> = sqlx::query_as(
        r#"
            INSERT INTO transfers (order_id, seller_id, amount, reference) VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id, seller_id) DO UPDATE SET
                status = 'pending',
                amount = excluded.amount,
                failure_reason = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE transfers.status = 'failed'
            RETURNING *;
        "#,
    )
    .bind(transfer.order_id)
    .bind(transfer.seller_id)
    .bind(transfer.amount)
    .bind(transfer.reference)
    .fetch_all(conn)
    .await?
    .pop();
    if let Some(t) = &claimed {
        debug!("🏦️ Transfer #{} [{}] claimed for {}", t.id, t.reference, t.amount);
    }
    Ok(claimed)
}

pub async fn mark_initiated(
    transfer_id: i64,
    transfer_code: &str,
    conn: &mut SqliteConnection,
) -> Result<Transfer, StoreError> {
    let transfer: Option<Transfer> = sqlx::query_as(
        "UPDATE transfers SET transfer_code = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(transfer_code)
    .bind(transfer_id)
    .fetch_all(conn)
    .await?
    .pop();
    transfer.ok_or(StoreError::TransferNotFound(transfer_id))
}

pub async fn update_status(
    transfer_id: i64,
    status: TransferStatus,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Transfer, StoreError> {
    let transfer: Option<Transfer> = sqlx::query_as(
        r#"
            UPDATE transfers SET status = $1, failure_reason = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(transfer_id)
    .fetch_all(conn)
    .await?
    .pop();
    let transfer = transfer.ok_or(StoreError::TransferNotFound(transfer_id))?;
    debug!("🏦️ Transfer #{transfer_id} is now {status}");
    Ok(transfer)
}

pub async fn fetch_transfer(transfer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Transfer>, sqlx::Error> {
    let transfer =
        sqlx::query_as("SELECT * FROM transfers WHERE id = $1").bind(transfer_id).fetch_all(conn).await?.pop();
    Ok(transfer)
}

pub async fn fetch_by_reference(reference: &str, conn: &mut SqliteConnection) -> Result<Option<Transfer>, sqlx::Error> {
    let transfer =
        sqlx::query_as("SELECT * FROM transfers WHERE reference = $1").bind(reference).fetch_all(conn).await?.pop();
    Ok(transfer)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Transfer>, sqlx::Error> {
    let transfers = sqlx::query_as("SELECT * FROM transfers WHERE order_id = $1 ORDER BY seller_id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(transfers)
}

pub async fn fetch_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Transfer>, sqlx::Error> {
    let transfers = sqlx::query_as("SELECT * FROM transfers WHERE seller_id = $1 ORDER BY id DESC")
        .bind(seller_id)
        .fetch_all(conn)
        .await?;
    Ok(transfers)
}
