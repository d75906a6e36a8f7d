use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{Naira, NewProduct, NewSeller, Product},
    events::EventProducers,
    test_utils::prepare_env::new_test_db,
    traits::{GatewayError, GatewayPaymentStatus, GatewaySession, GatewayVerification},
    CatalogApi,
    PaymentFlowApi,
    PricingPolicy,
    SqliteDatabase,
};

use super::helpers::send_request;
use crate::{
    endpoint_tests::mocks::MockGateway,
    routes::{CreateOrderRoute, InitializePaymentRoute, PaymentWebhookRoute, VerifyPaymentRoute, SIGNATURE_HEADER},
};

const WEBHOOK_BODY: &str = r#"{"event":"charge.success","data":{"reference":"ORD-1709213400000-NOPE00"}}"#;

#[actix_web::test]
async fn webhook_without_signature() {
    let db = new_test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_webhook_signature().never();
    gateway.expect_verify().never();
    let req = TestRequest::post().uri("/payments/webhook").set_payload(WEBHOOK_BODY);
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The webhook signature is missing or invalid"));
}

#[actix_web::test]
async fn webhook_with_bad_signature() {
    let db = new_test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_webhook_signature().times(1).returning(|_, sig| sig == "a-good-signature");
    gateway.expect_verify().never();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, "a-bad-signature"))
        .set_payload(WEBHOOK_BODY);
    let (status, _) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn webhook_for_unknown_order_is_acknowledged() {
    let db = new_test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_webhook_signature().returning(|body, _| body == WEBHOOK_BODY.as_bytes());
    gateway.expect_verify().never();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, "a-good-signature"))
        .set_payload(WEBHOOK_BODY);
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["result"], "unknown_reference");
    assert_eq!(body["data"]["reference"], "ORD-1709213400000-NOPE00");
}

#[actix_web::test]
async fn malformed_webhook() {
    let db = new_test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_webhook_signature().returning(|_, _| true);
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, "a-good-signature"))
        .set_payload("{not json");
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Could not parse webhook payload"));
}

#[actix_web::test]
async fn verify_unknown_reference() {
    let db = new_test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify().never();
    let req = TestRequest::get().uri("/payments/verify/ORD-1709213400000-NOPE00");
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No order exists for payment reference ORD-1709213400000-NOPE00"));
}

#[actix_web::test]
async fn checkout_with_tampered_price() {
    let db = new_test_db().await;
    let product = seed_product(&db, 850_000, 15).await;
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_session().never();
    let cart = checkout_body(&product, 1, 100.0);
    let req = TestRequest::post().uri("/payments/initialize").set_json(cart);
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["lines"][0]["product_id"], product.id);
    assert_eq!(body["data"]["lines"][0]["issues"][0]["kind"], "price_mismatch");
    assert!(body["error"].as_str().unwrap().contains(&format!("Product {}", product.id)));
}

#[actix_web::test]
async fn checkout_and_verify() {
    let db = new_test_db().await;
    let product = seed_product(&db, 850_000, 15).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_session()
        .withf(|req| req.amount == Naira::from(914_500))
        .times(1)
        .returning(|req| {
            Ok(GatewaySession {
                authorization_url: format!("https://checkout.example.com/{}", req.reference),
                access_code: "ac_123".to_string(),
                reference: req.reference,
            })
        });
    gateway.expect_verify().times(1).returning(|reference| {
        Ok(GatewayVerification {
            reference: reference.to_string(),
            status: GatewayPaymentStatus::Success,
            amount: Naira::from(914_500),
            message: Some("Approved".to_string()),
            raw: json!({}),
        })
    });
    let cart = checkout_body(&product, 1, 914_500.0);
    let req = TestRequest::post().uri("/payments/initialize").set_json(cart);
    let (status, body) = send_request(req, configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["order"]["total_amount"], 914_500);
    let reference = body["data"]["reference"].as_str().unwrap().to_string();
    assert!(body["data"]["authorization_url"].as_str().unwrap().ends_with(&reference));

    // Second round-trip shares the same database, but needs a fresh app
    let mut gateway = MockGateway::new();
    gateway.expect_verify().times(1).returning(|reference| {
        Ok(GatewayVerification {
            reference: reference.to_string(),
            status: GatewayPaymentStatus::Success,
            amount: Naira::from(914_500),
            message: None,
            raw: json!({}),
        })
    });
    let req = TestRequest::get().uri(&format!("/payments/verify/{reference}"));
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["result"], "confirmed");
    assert_eq!(body["data"]["order"]["payment_status"], "successful");
}

#[actix_web::test]
async fn verify_while_gateway_is_down() {
    let db = new_test_db().await;
    let product = seed_product(&db, 20_000, 5).await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify().returning(|_| Err(GatewayError::Unavailable("connection reset".to_string())));
    let req = TestRequest::post().uri("/orders").set_json(checkout_body(&product, 2, 26_400.0));
    let (status, body) = send_request(req, configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    let reference = body["data"]["order"]["payment_reference"].as_str().unwrap().to_string();

    let mut gateway = MockGateway::new();
    gateway.expect_verify().returning(|_| Err(GatewayError::Unavailable("connection reset".to_string())));
    let req = TestRequest::get().uri(&format!("/payments/verify/{reference}"));
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection reset"));
}

#[actix_web::test]
async fn checkout_with_bad_json() {
    let db = new_test_db().await;
    let req = TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"email": "ada@example.com"}"#);
    let (status, body) = send_request(req, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Could not read request body"));
}

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let flow_api = PaymentFlowApi::new(db, gateway, EventProducers::default());
        cfg.service(InitializePaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase, MockGateway>::new())
            .service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new())
            .app_data(web::Data::new(flow_api));
    }
}

async fn seed_product(db: &SqliteDatabase, wholesale: i64, stock: i64) -> Product {
    let catalog = CatalogApi::new(db.clone(), PricingPolicy::default());
    let seller = catalog
        .add_seller(NewSeller::new("Kemi Stores", "kemi@example.com").with_bank_details("0123456789", "058", "Kemi"))
        .await
        .expect("Error adding seller");
    catalog
        .add_product(NewProduct::new(seller.id, "Ankara throw", Naira::from(wholesale), stock))
        .await
        .expect("Error adding product")
}

fn checkout_body(product: &Product, quantity: i64, unit_price: f64) -> Value {
    json!({
        "email": "ada@example.com",
        "name": "Ada Obi",
        "shipping_address": "12 Marina Road, Lagos",
        "items": [{
            "product_id": product.id,
            "seller_id": product.seller_id,
            "quantity": quantity,
            "unit_price": unit_price,
            "line_total": unit_price * quantity as f64,
        }]
    })
}
