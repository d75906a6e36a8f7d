use log::debug;
use sqlx::SqliteConnection;

use super::single_row;

use crate::db_types::{LineItem, NewLineItem};

/// Inserts the line items for an order. This is not atomic on its own; embed it in a transaction to get an
/// all-or-nothing insert.
pub async fn insert_line_items(
    order_id: i64,
    items: &[NewLineItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<LineItem>, sqlx::Error> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let line: LineItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (
                    order_id,
                    product_id,
                    seller_id,
                    quantity,
                    unit_price,
                    unit_wholesale_price,
                    line_total
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.seller_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.unit_wholesale_price)
        .bind(item.line_total)
        .fetch_all(&mut *conn)
        .await
        .and_then(single_row)?;
        result.push(line);
    }
    debug!("📝️ {} line items written for order #{order_id}", result.len());
    Ok(result)
}

pub async fn fetch_line_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
