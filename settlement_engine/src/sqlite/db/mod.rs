//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Single-row queries are still run with `fetch_all`. Every statement is stepped to completion before the connection
//! goes back to the pool, so no half-read statement can hold a write transaction or read snapshot open on it.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod line_items;
pub mod orders;
pub mod products;
pub mod sellers;
pub mod stock_alerts;
pub mod transactions;
pub mod transfers;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace.db";

pub fn db_url() -> String {
    let result = env::var("MKT_DATABASE_URL").unwrap_or_else(|_| {
        info!("MKT_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    // Cascading deletes on order items rely on foreign key enforcement
    let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Takes the only row of a query that must return exactly one.
pub(crate) fn single_row<T>(mut rows: Vec<T>) -> Result<T, SqlxError> {
    rows.pop().ok_or(SqlxError::RowNotFound)
}
