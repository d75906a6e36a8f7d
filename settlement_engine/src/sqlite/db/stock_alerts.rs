use log::warn;
use sqlx::SqliteConnection;

use super::single_row;

use crate::db_types::{NewStockAlert, StockAlert};

pub async fn insert_alert(alert: NewStockAlert, conn: &mut SqliteConnection) -> Result<StockAlert, sqlx::Error> {
    let alert: StockAlert = sqlx::query_as(
        r#"
            INSERT INTO stock_alerts (order_id, product_id, quantity, reason) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(alert.order_id)
    .bind(alert.product_id)
    .bind(alert.quantity)
    .bind(alert.reason)
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    warn!(
        "🚨️ Stock alert #{} recorded: order #{}, product #{} x{}. {}",
        alert.id, alert.order_id, alert.product_id, alert.quantity, alert.reason
    );
    Ok(alert)
}

pub async fn fetch_unresolved(conn: &mut SqliteConnection) -> Result<Vec<StockAlert>, sqlx::Error> {
    let alerts =
        sqlx::query_as("SELECT * FROM stock_alerts WHERE resolved = FALSE ORDER BY id ASC").fetch_all(conn).await?;
    Ok(alerts)
}

pub async fn resolve(alert_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE stock_alerts SET resolved = TRUE WHERE id = $1 AND resolved = FALSE")
        .bind(alert_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
