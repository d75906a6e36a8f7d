use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

//--------------------------------------    Transactions     ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Amount in kobo
    pub amount: i64,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    Pending,
    Ongoing,
    Processing,
    Queued,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// The payment cannot succeed any more.
    ///
    /// `abandoned` is not a failure. Paystack reports every initialized session that has not been paid yet as
    /// abandoned, and the customer can still complete it.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Reversed)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
            Self::Reversed => "reversed",
            Self::Pending => "pending",
            Self::Ongoing => "ongoing",
            Self::Processing => "processing",
            Self::Queued => "queued",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackTransaction {
    pub id: i64,
    pub status: TransactionStatus,
    pub reference: String,
    /// Amount in kobo
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The result of a verification call. `raw` holds the full `data` object as Paystack sent it.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionVerification {
    pub transaction: PaystackTransaction,
    pub raw: Value,
}

//--------------------------------------      Transfers      ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransferRecipient {
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

impl NewTransferRecipient {
    pub fn nuban(name: &str, account_number: &str, bank_code: &str) -> Self {
        Self {
            recipient_type: "nuban".to_string(),
            name: name.to_string(),
            account_number: account_number.to_string(),
            bank_code: bank_code.to_string(),
            currency: mkt_common::NAIRA_CURRENCY_CODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecipient {
    pub recipient_code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfer {
    pub source: String,
    /// Amount in kobo
    pub amount: i64,
    pub recipient: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NewTransfer {
    pub fn from_balance(amount: i64, recipient: &str, reference: &str) -> Self {
        Self {
            source: "balance".to_string(),
            amount,
            recipient: recipient.to_string(),
            reference: reference.to_string(),
            reason: None,
        }
    }

    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedTransfer {
    pub transfer_code: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub status: String,
    pub amount: i64,
}

//--------------------------------------       Webhooks      ---------------------------------------------------------

/// A webhook notification. Only `event` and `data` are interpreted; the rest of the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    pub fn reference(&self) -> Option<&str> {
        self.data["reference"].as_str()
    }

    pub fn transfer_code(&self) -> Option<&str> {
        self.data["transfer_code"].as_str()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.data["reason"].as_str().or_else(|| self.data["gateway_response"].as_str())
    }
}
