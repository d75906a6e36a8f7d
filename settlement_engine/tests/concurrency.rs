use futures_util::future::join_all;
use settlement_engine::{
    cart_objects::CartLine,
    db_types::Naira,
    payment_objects::{CheckoutRequest, VerifyOutcome},
    SettlementManagement,
    StockError,
    StockLedger,
};

use crate::support::{cart_line, customer, Marketplace};

mod support;

#[tokio::test]
async fn two_buyers_one_item() {
    let market = Marketplace::new().await;
    let seller = market.seller("Chidi").await;
    let lamp = market.product(&seller, "Lamp", 10_000, 1).await;
    let ledger = StockLedger::new(market.db.clone());

    let (a, b) = tokio::join!(ledger.decrement(lamp.id, 1), ledger.decrement(lamp.id, 1));
    let results = [a, b];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "{results:?}");
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(
        matches!(failure, StockError::InsufficientStock { available: 0, .. } | StockError::ConcurrentModification(_)),
        "{failure:?}"
    );
    assert_eq!(market.stock(lamp.id).await, 0);
    market.tear_down().await;
}

#[tokio::test]
async fn burst_of_decrements_never_oversells() {
    let market = Marketplace::new().await;
    let seller = market.seller("Chidi").await;
    let lamp = market.product(&seller, "Lamp", 10_000, 10).await;
    // Every conflict means another writer succeeded, so 20 writers can never need more than 11 attempts
    let ledger = StockLedger::new(market.db.clone()).with_max_attempts(50);

    let results = join_all((0..20).map(|_| ledger.decrement(lamp.id, 1))).await;
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 10);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(e, StockError::InsufficientStock { .. })));
    assert_eq!(market.stock(lamp.id).await, 0);

    let results = join_all((0..5).map(|_| ledger.increment(lamp.id, 2))).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(market.stock(lamp.id).await, 10);
    market.tear_down().await;
}

#[tokio::test]
async fn availability_checks() {
    let market = Marketplace::new().await;
    let seller = market.seller("Chidi").await;
    let lamp = market.product(&seller, "Lamp", 10_000, 3).await;
    let ledger = StockLedger::new(market.db.clone());

    let check = ledger.check_available(lamp.id, 5).await.unwrap();
    assert!(!check.available);
    assert_eq!(check.current_stock, 3);
    assert_eq!(check.shortage, 2);
    let check = ledger.check_available(lamp.id, 3).await.unwrap();
    assert!(check.available);
    assert_eq!(check.shortage, 0);

    assert!(matches!(ledger.check_available(9_999, 1).await, Err(StockError::ProductNotFound(9_999))));
    assert!(matches!(ledger.decrement(lamp.id, 0).await, Err(StockError::InvalidQuantity(0))));
    assert!(matches!(ledger.increment(lamp.id, -4).await, Err(StockError::InvalidQuantity(-4))));
    let err = ledger.decrement(lamp.id, 4).await.unwrap_err();
    assert!(matches!(err, StockError::InsufficientStock { requested: 4, available: 3, .. }));
    assert_eq!(market.stock(lamp.id).await, 3);
    market.tear_down().await;
}

#[tokio::test]
async fn racing_verifications_apply_side_effects_once() {
    let market = Marketplace::new().await;
    let seller = market.seller("Chidi").await;
    let phone = market.product(&seller, "Pixel 8", 850_000, 15).await;
    let items: Vec<CartLine> = vec![cart_line(&phone, 1)];
    let session = market.flow.initialize(CheckoutRequest { customer: customer(), items }).await.unwrap();
    market.gateway.pay(&session.reference, Naira::from(914_500));

    let outcomes = join_all((0..5).map(|_| market.flow.verify(&session.reference))).await;
    let confirmed = outcomes.iter().filter(|o| matches!(o, Ok(VerifyOutcome::Confirmed { .. }))).count();
    let already = outcomes.iter().filter(|o| matches!(o, Ok(VerifyOutcome::AlreadyConfirmed { .. }))).count();
    assert_eq!(confirmed, 1, "{outcomes:?}");
    assert_eq!(already, 4, "{outcomes:?}");
    assert_eq!(market.stock(phone.id).await, 14);

    let order_id = session.placed.order.id;
    let totals = market.db.earnings_totals(seller.id).await.unwrap();
    assert_eq!(totals.completed_transactions, 1);
    assert_eq!(totals.total_earnings, Naira::from(850_000));
    assert_eq!(market.db.fetch_transactions_for_order(order_id).await.unwrap().len(), 1);
    market.tear_down().await;
}

#[tokio::test]
async fn writes_are_visible_on_every_connection() {
    let market = Marketplace::new().await;
    // Held for the whole test, so every write below goes through some other connection in the pool
    let mut observer = market.db.pool().acquire().await.unwrap();
    let count = |table: &'static str| format!("SELECT COUNT(*) FROM {table}");

    let seller = market.seller("Chidi").await;
    let sellers: Vec<i64> = sqlx::query_scalar(&count("sellers")).fetch_all(&mut *observer).await.unwrap();
    assert_eq!(sellers, vec![1]);

    // The product insert checks the seller's foreign key on yet another connection
    let phone = market.product(&seller, "Pixel 8", 850_000, 15).await;
    let stock: Vec<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(phone.id)
        .fetch_all(&mut *observer)
        .await
        .unwrap();
    assert_eq!(stock, vec![15]);

    let session = market
        .flow
        .initialize(CheckoutRequest { customer: customer(), items: vec![cart_line(&phone, 2)] })
        .await
        .unwrap();
    let orders: Vec<i64> = sqlx::query_scalar(&count("orders")).fetch_all(&mut *observer).await.unwrap();
    assert_eq!(orders, vec![1]);

    market.gateway.pay(&session.reference, Naira::from(1_829_000));
    let outcome = market.flow.verify(&session.reference).await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::Confirmed { .. }), "{outcome:?}");
    let status: Vec<String> = sqlx::query_scalar("SELECT payment_status FROM orders WHERE payment_reference = $1")
        .bind(&session.reference)
        .fetch_all(&mut *observer)
        .await
        .unwrap();
    assert_eq!(status, vec!["successful".to_string()]);
    let completed: Vec<i64> =
        sqlx::query_scalar("SELECT COUNT(*) FROM payment_transactions WHERE status = 'completed'")
            .fetch_all(&mut *observer)
            .await
            .unwrap();
    assert_eq!(completed, vec![1]);
    assert_eq!(market.stock(phone.id).await, 13);
    drop(observer);
    market.tear_down().await;
}
