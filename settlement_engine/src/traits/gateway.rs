//! Contracts for the external payment and payout services.
//!
//! Amounts cross this boundary in whole naira. Implementations convert to whatever unit the provider uses.
use chrono::{DateTime, Utc};
use mkt_common::Naira;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db_types::PayoutAccount;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The call may succeed if repeated later (timeouts, transport errors, 5xx responses).
    #[error("Payment gateway is unavailable: {0}")]
    Unavailable(String),
    /// The gateway gave a definitive negative answer, e.g. it does not recognise the reference.
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Success,
    /// Failed or reversed. The customer will not be charged for this session.
    Failed,
    /// Still in progress at the gateway
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub email: String,
    pub amount: Naira,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub reference: String,
    pub status: GatewayPaymentStatus,
    pub amount: Naira,
    /// Gateway's explanation of the status, if any
    pub message: Option<String>,
    /// The unmodified verification payload
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub reference: String,
    pub status: GatewayPaymentStatus,
    pub amount: Naira,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub amount: Naira,
    pub recipient_code: String,
    pub reference: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_code: String,
    pub status: String,
}

/// A hosted-checkout payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Opens a hosted payment session for `request.amount`, keyed by `request.reference`.
    async fn initialize_session(&self, request: SessionRequest) -> Result<GatewaySession, GatewayError>;

    /// Asks the gateway for the current state of the payment identified by `reference`.
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError>;

    /// Lists the transactions the gateway has seen since `since`.
    async fn list_transactions(&self, since: DateTime<Utc>) -> Result<Vec<GatewayTransaction>, GatewayError>;

    /// Checks the webhook signature against the raw request body. Must be called before the body is parsed.
    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool;
}

/// A disbursement provider.
#[allow(async_fn_in_trait)]
pub trait PayoutGateway: Clone {
    /// Registers a bank account and returns the recipient token to use for transfers to it.
    async fn create_recipient(&self, account: &PayoutAccount) -> Result<String, GatewayError>;

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError>;
}
