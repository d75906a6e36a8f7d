use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Days, TimeZone, Utc};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{FulfillmentStatus, LineItem, Naira, Order, OrderNumber, PaymentStatus},
    OrderApi,
};

use super::helpers::{issue_token, send_request, with_token};
use crate::{
    endpoint_tests::mocks::MockOrderManager,
    routes::{SellerOrderRoute, SellerOrdersRoute, UpdateOrderStatusRoute},
};

const SELLER: i64 = 3;
const OTHER_SELLER: i64 = 4;

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/orders"), configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication Error. No bearer token was provided.");
}

#[actix_web::test]
async fn fetch_my_orders_bad_token() {
    let _ = env_logger::try_init().ok();
    let mut token = valid_token(SELLER);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = with_token(TestRequest::get().uri("/orders"), &token);
    let (status, _) = send_request(req, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SELLER, Utc::now() - Days::new(1));
    let req = with_token(TestRequest::get().uri("/orders"), &token);
    let (status, _) = send_request(req, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_seller()
        .withf(|seller_id| *seller_id == SELLER)
        .times(1)
        .returning(|_| Ok(vec![order(1, PaymentStatus::Successful, FulfillmentStatus::Processing)]));
    let req = with_token(TestRequest::get().uri("/orders"), &valid_token(SELLER));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["order_number"], "ORD-1709213400000-ABC123");
    assert_eq!(body["data"][0]["total_amount"], 914_500);
    assert_eq!(body["data"][0]["payment_status"], "successful");
}

#[actix_web::test]
async fn fetch_order_only_shows_my_lines() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(order(id, PaymentStatus::Successful, FulfillmentStatus::Processing))));
    db.expect_fetch_line_items().returning(|id| Ok(vec![line(1, id, SELLER), line(2, id, OTHER_SELLER)]));
    let req = with_token(TestRequest::get().uri("/orders/1"), &valid_token(SELLER));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["seller_id"], SELLER);
}

#[actix_web::test]
async fn fetch_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(order(id, PaymentStatus::Successful, FulfillmentStatus::Processing))));
    db.expect_fetch_line_items().returning(|id| Ok(vec![line(2, id, OTHER_SELLER)]));
    let req = with_token(TestRequest::get().uri("/orders/1"), &valid_token(SELLER));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Seller 3 has no items in order 1"));
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    db.expect_fetch_line_items().never();
    let req = with_token(TestRequest::get().uri("/orders/99"), &valid_token(SELLER));
    let (status, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn non_numeric_order_id() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/orders/abc"), &valid_token(SELLER));
    let (status, body) = send_request(req, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#""success":false"#));
}

#[actix_web::test]
async fn ship_an_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(order(id, PaymentStatus::Successful, FulfillmentStatus::Processing))));
    db.expect_fetch_line_items().returning(|id| Ok(vec![line(1, id, SELLER)]));
    db.expect_update_fulfillment_status()
        .withf(|_, from, to| *from == FulfillmentStatus::Processing && *to == FulfillmentStatus::Shipped)
        .times(1)
        .returning(|id, _, to| Ok(Some(order(id, PaymentStatus::Successful, to))));
    let req = with_token(TestRequest::put().uri("/orders/1/status"), &valid_token(SELLER))
        .set_json(json!({"status": "shipped"}));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["fulfillment_status"], "shipped");
}

#[actix_web::test]
async fn cannot_ship_an_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, PaymentStatus::Pending, FulfillmentStatus::Pending))));
    db.expect_fetch_line_items().returning(|id| Ok(vec![line(1, id, SELLER)]));
    db.expect_update_fulfillment_status().never();
    let req = with_token(TestRequest::put().uri("/orders/1/status"), &valid_token(SELLER))
        .set_json(json!({"status": "processing"}));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Order 1 has not been paid"));
}

#[actix_web::test]
async fn unknown_status_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::put().uri("/orders/1/status"), &valid_token(SELLER))
        .set_json(json!({"status": "teleported"}));
    let (status, body) = send_request(req, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Could not read request body"));
}

fn valid_token(seller_id: i64) -> String {
    issue_token(seller_id, Utc::now() + Days::new(1))
}

fn configure(db: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let orders_api = OrderApi::new(db);
        cfg.service(SellerOrdersRoute::<MockOrderManager>::new())
            .service(SellerOrderRoute::<MockOrderManager>::new())
            .service(UpdateOrderStatusRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(orders_api));
    }
}

fn order(id: i64, payment_status: PaymentStatus, fulfillment_status: FulfillmentStatus) -> Order {
    Order {
        id,
        order_number: OrderNumber::from("ORD-1709213400000-ABC123"),
        customer_email: "ada@example.com".to_string(),
        customer_name: "Ada Obi".to_string(),
        customer_phone: None,
        shipping_address: "12 Marina Road, Lagos".to_string(),
        total_amount: Naira::from(914_500),
        payment_reference: "ORD-1709213400000-ABC123".to_string(),
        payment_status,
        fulfillment_status,
        authorization_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn line(id: i64, order_id: i64, seller_id: i64) -> LineItem {
    LineItem {
        id,
        order_id,
        product_id: 10 + id,
        seller_id,
        quantity: 1,
        unit_price: Naira::from(914_500),
        unit_wholesale_price: Naira::from(850_000),
        line_total: Naira::from(914_500),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}
