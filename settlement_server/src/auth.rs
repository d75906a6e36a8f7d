//! Seller identity.
//!
//! Seller routes expect an `Authorization: Bearer <jwt>` header. The token is an HS256 JWT carrying a `seller_id`
//! claim and an expiry, signed with `MKT_JWT_SECRET`. Tokens are issued by the marketplace's account service; this
//! server only verifies them.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerClaims {
    pub seller_id: i64,
    /// Expiry, in seconds since the unix epoch
    pub exp: u64,
}

/// Pulls the bearer token out of the `Authorization` header, if there is one.
fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".to_string()))?;
    Ok(token.trim())
}

pub fn validate_seller_token(token: &str, config: &AuthConfig) -> Result<SellerClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<SellerClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::PoorlyFormattedToken(e.to_string())
        },
        _ => AuthError::ValidationError(e.to_string()),
    })?;
    trace!("🔑️ Seller token validated for seller #{}", data.claims.seller_id);
    Ok(data.claims)
}

impl FromRequest for SellerClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AuthConfig>>() {
            None => {
                error!("🔑️ No AuthConfig has been registered with the app. Seller routes cannot be authenticated.");
                Err(ServerError::ConfigurationError("Authentication is not configured".to_string()))
            },
            Some(config) => bearer_token(req)
                .and_then(|token| validate_seller_token(token, config))
                .map_err(|e| {
                    debug!("🔑️ Seller authentication failed for {}. {e}", req.path());
                    ServerError::AuthenticationError(e)
                }),
        };
        ready(result)
    }
}
