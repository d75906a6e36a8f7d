use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::PaystackConfig,
    data_objects::{
        InitializeTransaction,
        InitializedTransaction,
        InitiatedTransfer,
        NewTransfer,
        NewTransferRecipient,
        PaystackResponse,
        PaystackTransaction,
        TransactionVerification,
        TransferRecipient,
    },
    PaystackApiError,
};

const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 50;

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for PaystackApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaystackApi({})", self.config.base_url)
    }
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends a request and unwraps the `{status, message, data}` envelope.
    ///
    /// * Non-2xx responses give [`PaystackApiError::QueryError`], with the gateway's message if it sent one.
    /// * `status: false` gives [`PaystackApiError::Rejected`].
    /// * A missing `data` field gives [`PaystackApiError::EmptyResponse`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("📬️ Sending {method} request to {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(text);
            debug!("📬️ Paystack returned {status}. {message}");
            return Err(PaystackApiError::QueryError { status: status.as_u16(), message });
        }
        trace!("📬️ Request successful. {status}");
        let envelope = serde_json::from_str::<PaystackResponse<T>>(&text)
            .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
        if !envelope.status {
            return Err(PaystackApiError::Rejected(envelope.message));
        }
        envelope.data.ok_or(PaystackApiError::EmptyResponse)
    }

    /// Opens a checkout session. `amount` is in kobo.
    pub async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, PaystackApiError> {
        debug!("📬️ Initializing transaction {} for {} kobo", request.reference, request.amount);
        let session = self
            .rest_query::<InitializedTransaction, _>(Method::POST, "/transaction/initialize", &[], Some(request))
            .await?;
        info!("📬️ Checkout session {} opened", session.reference);
        Ok(session)
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<TransactionVerification, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("📬️ Verifying transaction {reference}");
        let raw = self.rest_query::<Value, ()>(Method::GET, &path, &[], None).await?;
        let transaction = serde_json::from_value::<PaystackTransaction>(raw.clone())
            .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
        debug!("📬️ Transaction {reference} has status {}", transaction.status);
        Ok(TransactionVerification { transaction, raw })
    }

    /// Lists every transaction created since `from`, following pagination.
    pub async fn list_transactions(&self, from: DateTime<Utc>) -> Result<Vec<PaystackTransaction>, PaystackApiError> {
        let from = from.to_rfc3339();
        let per_page = PAGE_SIZE.to_string();
        let mut result = Vec::new();
        for page in 1..=MAX_PAGES {
            let page = page.to_string();
            let params = [("from", from.as_str()), ("perPage", per_page.as_str()), ("page", page.as_str())];
            let batch = self.rest_query::<Vec<PaystackTransaction>, ()>(Method::GET, "/transaction", &params, None).await?;
            let done = batch.len() < PAGE_SIZE;
            result.extend(batch);
            if done {
                break;
            }
        }
        debug!("📬️ Fetched {} transactions since {from}", result.len());
        Ok(result)
    }

    pub async fn create_transfer_recipient(
        &self,
        recipient: NewTransferRecipient,
    ) -> Result<TransferRecipient, PaystackApiError> {
        debug!("📬️ Creating transfer recipient for {}", recipient.name);
        let result =
            self.rest_query::<TransferRecipient, _>(Method::POST, "/transferrecipient", &[], Some(recipient)).await?;
        info!("📬️ Created transfer recipient {}", result.recipient_code);
        Ok(result)
    }

    pub async fn initiate_transfer(&self, transfer: NewTransfer) -> Result<InitiatedTransfer, PaystackApiError> {
        #[derive(Deserialize)]
        struct Fallback {
            transfer_code: Option<String>,
            status: Option<String>,
        }
        debug!("📬️ Initiating transfer {} of {} kobo to {}", transfer.reference, transfer.amount, transfer.recipient);
        let amount = transfer.amount;
        let reference = transfer.reference.clone();
        let value = self.rest_query::<Value, _>(Method::POST, "/transfer", &[], Some(transfer)).await?;
        let result = match serde_json::from_value::<InitiatedTransfer>(value.clone()) {
            Ok(t) => t,
            Err(_) => {
                // Some responses omit the amount. Only the transfer code and status matter to callers.
                let fallback =
                    serde_json::from_value::<Fallback>(value).map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
                InitiatedTransfer {
                    transfer_code: fallback.transfer_code.ok_or(PaystackApiError::EmptyResponse)?,
                    reference: Some(reference),
                    status: fallback.status.unwrap_or_else(|| "pending".to_string()),
                    amount,
                }
            },
        };
        info!("📬️ Transfer {} initiated with status {}", result.transfer_code, result.status);
        Ok(result)
    }
}
