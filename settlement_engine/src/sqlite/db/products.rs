use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::single_row;

use crate::{
    db_types::{Naira, NewProduct, Product},
    traits::StoreError,
};

pub async fn insert_product(
    product: NewProduct,
    customer_price: Naira,
    conn: &mut SqliteConnection,
) -> Result<Product, StoreError> {
    if product.stock < 0 {
        return Err(StoreError::InvalidData(format!("Stock cannot be negative ({})", product.stock)));
    }
    let seller_id = product.seller_id;
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, name, wholesale_price, customer_price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(product.name)
    .bind(product.wholesale_price)
    .bind(customer_price)
    .bind(product.stock)
    .fetch_all(conn)
    .await
    .and_then(single_row)
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => StoreError::SellerNotFound(seller_id),
        _ => StoreError::from(e),
    })?;
    debug!("🛍️ Product #{} ({}) listed at {} by seller #{seller_id}", product.id, product.name, product.customer_price);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_all(conn).await?.pop();
    Ok(product)
}

pub async fn fetch_products(product_ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in product_ids {
        ids.push_bind(*id);
    }
    builder.push(")");
    trace!("🛍️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn update_prices(
    product_id: i64,
    seller_id: i64,
    wholesale_price: Naira,
    customer_price: Naira,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            UPDATE products SET wholesale_price = $1, customer_price = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND seller_id = $4 AND deleted = FALSE
            RETURNING *;
        "#,
    )
    .bind(wholesale_price)
    .bind(customer_price)
    .bind(product_id)
    .bind(seller_id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(product)
}

pub async fn soft_delete(product_id: i64, seller_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET deleted = TRUE, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND seller_id = $2 AND \
         deleted = FALSE",
    )
    .bind(product_id)
    .bind(seller_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_stock(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 AND deleted = FALSE")
        .bind(product_id)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(stock)
}

/// The compare-and-swap primitive for stock. Returns true if exactly one row was updated.
pub async fn compare_and_set_stock(
    product_id: i64,
    expected: i64,
    new_stock: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, StoreError> {
    if new_stock < 0 {
        return Err(StoreError::InvalidData(format!("Stock for product #{product_id} cannot become {new_stock}")));
    }
    let result = sqlx::query(
        "UPDATE products SET stock = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock = $3 AND deleted = \
         FALSE",
    )
    .bind(new_stock)
    .bind(product_id)
    .bind(expected)
    .execute(conn)
    .await?;
    trace!("🛍️ CAS stock #{product_id}: {expected} -> {new_stock}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}
