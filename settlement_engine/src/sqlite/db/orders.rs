use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use super::single_row;

use crate::{
    db_types::{FulfillmentStatus, NewOrder, Order},
    traits::StoreError,
};

/// Inserts a new order header into the database using the given connection. The payment reference is the order
/// number.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order_number = order.order_number.to_string();
    let reference = order.payment_reference().to_string();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_email,
                customer_name,
                customer_phone,
                shipping_address,
                total_amount,
                payment_reference,
                authorization_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer.email)
    .bind(order.customer.name)
    .bind(order.customer.phone)
    .bind(order.customer.shipping_address)
    .bind(order.total_amount)
    .bind(reference)
    .bind(order.authorization_url)
    .fetch_all(conn)
    .await
    .and_then(single_row)
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::OrderAlreadyExists(order_number),
        _ => StoreError::from(e),
    })?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(conn).await?;
    debug!("📝️ Order #{order_id} deleted");
    Ok(())
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_all(conn).await?.pop();
    Ok(order)
}

pub async fn fetch_order_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(order)
}

/// The `pending → successful` payment edge. Only one caller can ever see `Some` for a given reference.
///
/// Orders that were cancelled before payment landed stay cancelled.
pub async fn mark_paid(reference: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'successful',
                fulfillment_status = CASE fulfillment_status WHEN 'cancelled' THEN 'cancelled' ELSE 'processing' END,
                updated_at = CURRENT_TIMESTAMP
            WHERE payment_reference = $1 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(reference)
    .fetch_all(conn)
    .await?
    .pop();
    trace!("📝️ mark_paid({reference}) applied: {}", order.is_some());
    Ok(order)
}

/// The `pending → failed` payment edge.
pub async fn mark_failed(reference: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'failed', updated_at = CURRENT_TIMESTAMP
            WHERE payment_reference = $1 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(reference)
    .fetch_all(conn)
    .await?
    .pop();
    trace!("📝️ mark_failed({reference}) applied: {}", order.is_some());
    Ok(order)
}

pub async fn update_fulfillment_status(
    order_id: i64,
    from: FulfillmentStatus,
    to: FulfillmentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET fulfillment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND fulfillment_status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(order_id)
    .bind(from)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(order)
}

pub async fn fetch_orders_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE id IN (SELECT DISTINCT order_id FROM order_items WHERE seller_id = $1)
            ORDER BY created_at DESC, id DESC;
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn fetch_pending_orders(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    // created_at holds SQLite's own timestamp format, while bound chrono values are RFC 3339. Normalise both sides.
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE payment_status = 'pending' AND datetime(created_at) < datetime($1)
            ORDER BY created_at ASC, id ASC;
        "#,
    )
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
