use log::debug;
use sqlx::SqliteConnection;

use super::single_row;

use crate::{
    db_types::{NewSeller, Seller},
    traits::StoreError,
};

pub async fn insert_seller(seller: NewSeller, conn: &mut SqliteConnection) -> Result<Seller, StoreError> {
    let email = seller.email.clone();
    let seller: Seller = sqlx::query_as(
        r#"
            INSERT INTO sellers (name, email, bank_account_number, bank_code, account_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(seller.name)
    .bind(seller.email)
    .bind(seller.bank_account_number)
    .bind(seller.bank_code)
    .bind(seller.account_name)
    .fetch_all(conn)
    .await
    .and_then(single_row)
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            StoreError::InvalidData(format!("A seller with email {email} already exists"))
        },
        _ => StoreError::from(e),
    })?;
    debug!("🧑‍💼️ Seller #{} ({}) created", seller.id, seller.name);
    Ok(seller)
}

pub async fn fetch_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    let seller = sqlx::query_as("SELECT * FROM sellers WHERE id = $1").bind(seller_id).fetch_all(conn).await?.pop();
    Ok(seller)
}

pub async fn update_payout_details(
    seller_id: i64,
    account_number: &str,
    bank_code: &str,
    account_name: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Seller>, sqlx::Error> {
    let seller = sqlx::query_as(
        r#"
            UPDATE sellers SET
                bank_account_number = $1,
                bank_code = $2,
                account_name = COALESCE($3, account_name),
                recipient_code = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(account_number)
    .bind(bank_code)
    .bind(account_name)
    .bind(seller_id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(seller)
}

pub async fn save_recipient_code(
    seller_id: i64,
    recipient_code: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    let result =
        sqlx::query("UPDATE sellers SET recipient_code = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(recipient_code)
            .bind(seller_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::SellerNotFound(seller_id));
    }
    debug!("🧑‍💼️ Saved payout recipient for seller #{seller_id}");
    Ok(())
}
