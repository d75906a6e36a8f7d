use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use paystack_tools::signature::{calculate_signature, verify_signature};
use serde_json::json;
use settlement_engine::{
    db_types::{Naira, PayoutAccount},
    traits::{
        GatewayError,
        GatewayPaymentStatus,
        GatewaySession,
        GatewayTransaction,
        GatewayVerification,
        PaymentGateway,
        PayoutGateway,
        SessionRequest,
        TransferReceipt,
        TransferRequest,
    },
};

pub const WEBHOOK_SECRET: &str = "sk_test_marketplace";

#[derive(Default)]
struct GatewayState {
    sessions: Vec<SessionRequest>,
    payments: HashMap<String, (GatewayPaymentStatus, Naira)>,
    verify_calls: usize,
    verify_error: Option<GatewayError>,
    listed: Vec<GatewayTransaction>,
    recipients: Vec<PayoutAccount>,
    transfers: Vec<TransferRequest>,
    transfer_error: Option<GatewayError>,
}

/// An in-memory stand-in for the payment and payout gateway.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().expect("Mock gateway lock poisoned")
    }

    /// The customer paid `amount` for `reference`.
    pub fn pay(&self, reference: &str, amount: Naira) {
        self.state().payments.insert(reference.to_string(), (GatewayPaymentStatus::Success, amount));
    }

    pub fn decline(&self, reference: &str) {
        self.state().payments.insert(reference.to_string(), (GatewayPaymentStatus::Failed, Naira::from(0)));
    }

    pub fn leave_pending(&self, reference: &str, amount: Naira) {
        self.state().payments.insert(reference.to_string(), (GatewayPaymentStatus::Pending, amount));
    }

    pub fn fail_verification_with(&self, error: Option<GatewayError>) {
        self.state().verify_error = error;
    }

    pub fn fail_transfers_with(&self, error: Option<GatewayError>) {
        self.state().transfer_error = error;
    }

    pub fn list_transaction(&self, reference: &str, amount: Naira) {
        self.state().listed.push(GatewayTransaction {
            reference: reference.to_string(),
            status: GatewayPaymentStatus::Success,
            amount,
            created_at: Some(Utc::now().to_rfc3339()),
        });
    }

    pub fn sessions(&self) -> Vec<SessionRequest> {
        self.state().sessions.clone()
    }

    pub fn verify_calls(&self) -> usize {
        self.state().verify_calls
    }

    pub fn recipients(&self) -> Vec<PayoutAccount> {
        self.state().recipients.clone()
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.state().transfers.clone()
    }

    /// Signs a webhook body the way the gateway would.
    pub fn sign(body: &[u8]) -> String {
        calculate_signature(WEBHOOK_SECRET, body)
    }

    pub fn webhook(event: &str, reference: &str) -> Vec<u8> {
        json!({ "event": event, "data": { "reference": reference, "status": event } }).to_string().into_bytes()
    }
}

impl PaymentGateway for MockGateway {
    async fn initialize_session(&self, request: SessionRequest) -> Result<GatewaySession, GatewayError> {
        let reference = request.reference.clone();
        self.state().sessions.push(request);
        Ok(GatewaySession {
            authorization_url: format!("https://checkout.example.com/{reference}"),
            access_code: format!("access_{reference}"),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError> {
        let mut state = self.state();
        state.verify_calls += 1;
        if let Some(e) = state.verify_error.clone() {
            return Err(e);
        }
        let (status, amount) = state
            .payments
            .get(reference)
            .copied()
            .ok_or_else(|| GatewayError::Rejected("Transaction reference not found".into()))?;
        Ok(GatewayVerification {
            reference: reference.to_string(),
            status,
            amount,
            message: None,
            raw: json!({ "reference": reference, "amount": amount.to_kobo() }),
        })
    }

    async fn list_transactions(&self, _since: DateTime<Utc>) -> Result<Vec<GatewayTransaction>, GatewayError> {
        Ok(self.state().listed.clone())
    }

    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        verify_signature(WEBHOOK_SECRET, body, signature)
    }
}

impl PayoutGateway for MockGateway {
    async fn create_recipient(&self, account: &PayoutAccount) -> Result<String, GatewayError> {
        let mut state = self.state();
        state.recipients.push(account.clone());
        Ok(format!("RCP_{}", account.account_number))
    }

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError> {
        let mut state = self.state();
        if let Some(e) = state.transfer_error.clone() {
            return Err(e);
        }
        let transfer_code = format!("TRF_{}", state.transfers.len() + 1);
        state.transfers.push(request);
        Ok(TransferReceipt { transfer_code, status: "pending".to_string() })
    }
}
