use cucumber::{given, then, when};
use settlement_engine::{
    cart_objects::CartLine,
    db_types::{Naira, PaymentStatus},
    payment_objects::{CheckoutRequest, VerifyOutcome},
    OrderManagement,
    PaymentFlowError,
    PayoutApi,
    PayoutResult,
    SettlementManagement,
};

use crate::{
    cucumber::MarketWorld,
    support::{customer, mock_gateway::MockGateway},
};

#[given(expr = "a seller named {string} with bank details")]
async fn seller_with_bank_details(world: &mut MarketWorld, name: String) {
    let seller = world.market().await.seller(&name).await;
    world.sellers.insert(name, seller);
}

#[given(expr = "a seller named {string} without bank details")]
async fn seller_without_bank_details(world: &mut MarketWorld, name: String) {
    let seller = world.market().await.seller_without_bank_details(&name).await;
    world.sellers.insert(name, seller);
}

#[given(expr = "{string} lists {string} at a wholesale price of {int} with {int} in stock")]
async fn list_product(world: &mut MarketWorld, seller: String, product: String, wholesale: i64, stock: i64) {
    let seller = world.seller(&seller).clone();
    let listed = world.market().await.product(&seller, &product, wholesale, stock).await;
    world.products.insert(product, listed);
}

#[then(expr = "{string} sells for {int}")]
async fn check_customer_price(world: &mut MarketWorld, product: String, price: i64) {
    assert_eq!(world.product(&product).customer_price, Naira::from(price));
}

fn listed_line(world: &MarketWorld, product: &str, quantity: i64) -> CartLine {
    let product = world.product(product);
    CartLine::new(product.id, product.seller_id, quantity, product.customer_price.as_f64())
}

async fn checkout(world: &mut MarketWorld, items: Vec<CartLine>) {
    let request = CheckoutRequest { customer: customer(), items };
    match world.market().await.flow.initialize(request).await {
        Ok(session) => world.session = Some(session),
        Err(e) => world.checkout_error = Some(e),
    }
}

#[when(expr = "a customer checks out {int} {string} at the listed price")]
async fn checkout_at_listed_price(world: &mut MarketWorld, quantity: i64, product: String) {
    let line = listed_line(world, &product, quantity);
    checkout(world, vec![line]).await;
}

#[when(expr = "a customer checks out {int} {string} and {int} {string} at the listed price")]
async fn checkout_two_products(world: &mut MarketWorld, qty_a: i64, product_a: String, qty_b: i64, product_b: String) {
    let lines = vec![listed_line(world, &product_a, qty_a), listed_line(world, &product_b, qty_b)];
    checkout(world, lines).await;
}

#[when(expr = "a customer checks out {int} {string} claiming a price of {int}")]
async fn checkout_at_claimed_price(world: &mut MarketWorld, quantity: i64, product: String, price: i64) {
    let product = world.product(&product);
    #[allow(clippy::cast_precision_loss)]
    let line = CartLine::new(product.id, product.seller_id, quantity, price as f64);
    checkout(world, vec![line]).await;
}

#[then(expr = "the order total is {int}")]
async fn check_order_total(world: &mut MarketWorld, total: i64) {
    assert_eq!(world.session().placed.order.total_amount, Naira::from(total));
}

#[then(expr = "the checkout is rejected with {string}")]
async fn check_checkout_rejected(world: &mut MarketWorld, message: String) {
    assert!(world.session.is_none(), "The checkout went through");
    let Some(PaymentFlowError::Validation(report)) = &world.checkout_error else {
        panic!("Expected a validation error, got {:?}", world.checkout_error);
    };
    let summary = report.summary();
    assert!(summary.contains(&message), "'{summary}' does not mention '{message}'");
}

#[when(expr = "the gateway reports the payment as successful")]
async fn gateway_success(world: &mut MarketWorld) {
    let session = world.session().clone();
    world.market().await.gateway.pay(&session.reference, session.placed.order.total_amount);
}

#[when(expr = "the gateway reports the payment as failed")]
async fn gateway_failure(world: &mut MarketWorld) {
    let reference = world.session().reference.clone();
    world.market().await.gateway.decline(&reference);
}

#[when(expr = "the payment is verified")]
async fn verify_payment(world: &mut MarketWorld) {
    let reference = world.session().reference.clone();
    let outcome = world.market().await.flow.verify(&reference).await.expect("Error verifying payment");
    world.verify_outcome = Some(outcome);
}

#[then(expr = "the payment was already confirmed")]
async fn check_already_confirmed(world: &mut MarketWorld) {
    assert!(matches!(world.verify_outcome, Some(VerifyOutcome::AlreadyConfirmed { .. })));
}

#[then(expr = "the order payment status is {string}")]
async fn check_payment_status(world: &mut MarketWorld, status: String) {
    let reference = world.session().reference.clone();
    let order = world.market().await.db.fetch_order_by_reference(&reference).await.unwrap().expect("Order not found");
    let expected: PaymentStatus = status.parse().expect("Not a payment status");
    assert_eq!(order.payment_status, expected);
}

#[then(expr = "{string} has {int} in stock")]
async fn check_stock(world: &mut MarketWorld, product: String, stock: i64) {
    let id = world.product(&product).id;
    assert_eq!(world.market().await.stock(id).await, stock);
}

#[then(expr = "{string} has earned {int} from {int} sales, with {int} commission to the platform")]
async fn check_earnings(world: &mut MarketWorld, seller: String, earned: i64, sales: i64, commission: i64) {
    let id = world.seller(&seller).id;
    let totals = world.market().await.db.earnings_totals(id).await.unwrap();
    assert_eq!(totals.total_earnings, Naira::from(earned));
    assert_eq!(totals.completed_transactions, sales);
    assert_eq!(totals.total_commission, Naira::from(commission));
}

#[when(expr = "a webhook for the payment arrives with a forged signature")]
async fn forged_webhook(world: &mut MarketWorld) {
    let reference = world.session().reference.clone();
    let body = MockGateway::webhook("charge.success", &reference);
    let signature = MockGateway::sign(b"something else entirely");
    let result = world.market().await.flow.handle_webhook(&body, Some(&signature)).await;
    world.webhook_error = result.err();
}

#[when(expr = "a signed webhook for the payment arrives")]
async fn signed_webhook(world: &mut MarketWorld) {
    let reference = world.session().reference.clone();
    let body = MockGateway::webhook("charge.success", &reference);
    let signature = MockGateway::sign(&body);
    let result = world.market().await.flow.handle_webhook(&body, Some(&signature)).await;
    world.webhook_error = result.err();
}

#[then(expr = "the webhook is rejected")]
async fn check_webhook_rejected(world: &mut MarketWorld) {
    assert!(matches!(world.webhook_error, Some(PaymentFlowError::InvalidSignature)));
    assert_eq!(world.market().await.gateway.verify_calls(), 0);
}

#[when(expr = "the order is settled")]
async fn settle_order(world: &mut MarketWorld) {
    let order_id = world.session().placed.order.id;
    let market = world.market().await;
    let api = PayoutApi::new(market.db.clone(), market.gateway.clone());
    world.payouts = api.dispatch_for_order(order_id).await.expect("Error settling order");
}

#[then(expr = "{string} is sent a transfer of {int}")]
async fn check_transfer_sent(world: &mut MarketWorld, seller: String, amount: i64) {
    let id = world.seller(&seller).id;
    let payout = world.payouts.iter().find(|p| p.seller_id == id).expect("No payout for seller");
    assert_eq!(payout.amount, Naira::from(amount));
    assert!(matches!(payout.result, PayoutResult::Initiated { .. }), "{:?}", payout.result);
}

#[then(expr = "the transfer to {string} failed because {string}")]
async fn check_transfer_failed(world: &mut MarketWorld, seller: String, reason: String) {
    let id = world.seller(&seller).id;
    let payout = world.payouts.iter().find(|p| p.seller_id == id).expect("No payout for seller");
    let PayoutResult::Failed { reason: actual, .. } = &payout.result else {
        panic!("Expected the transfer to fail, got {:?}", payout.result);
    };
    assert!(actual.contains(&reason), "'{actual}' does not mention '{reason}'");
    let order_id = world.session().placed.order.id;
    let transfers = world.market().await.db.fetch_transfers_for_order(order_id).await.unwrap();
    assert!(transfers.iter().any(|t| t.seller_id == id && t.failure_reason.is_some()));
}
