use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;

use crate::{auth::SellerClaims, config::AuthConfig, server::configure_extractors};

// DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "a3f2a09c1e7e4d6b9b8b0c3d5e7f90112233445566778899";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(seller_id: i64, expiry: DateTime<Utc>) -> String {
    let claims = SellerClaims { seller_id, exp: expiry.timestamp() as u64 };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(get_auth_config()))
        .configure(configure_extractors)
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }
}
