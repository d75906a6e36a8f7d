//! Binds the Paystack REST client to the engine's gateway contracts.
//!
//! The engine works in whole naira; Paystack works in kobo. The conversion happens here and nowhere else.
use chrono::{DateTime, Utc};
use log::*;
use mkt_common::Naira;
use paystack_tools::{
    data_objects::{InitializeTransaction, NewTransfer, NewTransferRecipient, PaystackTransaction, TransactionStatus},
    signature::verify_signature,
    PaystackApi,
    PaystackApiError,
    PaystackConfig,
};
use settlement_engine::{
    db_types::PayoutAccount,
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

#[derive(Clone, Debug)]
pub struct PaystackGateway {
    api: PaystackApi,
    webhook_checks: bool,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig, webhook_checks: bool) -> Result<Self, PaystackApiError> {
        let api = PaystackApi::new(config)?;
        Ok(Self { api, webhook_checks })
    }
}

fn to_gateway_error(e: PaystackApiError) -> GatewayError {
    if e.is_transient() {
        GatewayError::Unavailable(e.to_string())
    } else {
        GatewayError::Rejected(e.to_string())
    }
}

fn payment_status(status: TransactionStatus) -> GatewayPaymentStatus {
    match status {
        TransactionStatus::Success => GatewayPaymentStatus::Success,
        s if s.is_failure() => GatewayPaymentStatus::Failed,
        _ => GatewayPaymentStatus::Pending,
    }
}

fn to_gateway_transaction(tx: PaystackTransaction) -> GatewayTransaction {
    GatewayTransaction {
        reference: tx.reference,
        status: payment_status(tx.status),
        amount: Naira::from_kobo(tx.amount),
        created_at: tx.created_at,
    }
}

impl PaymentGateway for PaystackGateway {
    async fn initialize_session(&self, request: SessionRequest) -> Result<GatewaySession, GatewayError> {
        let request = InitializeTransaction {
            email: request.email,
            amount: request.amount.to_kobo(),
            reference: request.reference,
            callback_url: request.callback_url,
            metadata: request.metadata,
        };
        let session = self.api.initialize_transaction(request).await.map_err(to_gateway_error)?;
        Ok(GatewaySession {
            authorization_url: session.authorization_url,
            access_code: session.access_code,
            reference: session.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError> {
        let verification = self.api.verify_transaction(reference).await.map_err(to_gateway_error)?;
        let tx = verification.transaction;
        Ok(GatewayVerification {
            reference: tx.reference,
            status: payment_status(tx.status),
            amount: Naira::from_kobo(tx.amount),
            message: tx.gateway_response,
            raw: verification.raw,
        })
    }

    async fn list_transactions(&self, since: DateTime<Utc>) -> Result<Vec<GatewayTransaction>, GatewayError> {
        let txs = self.api.list_transactions(since).await.map_err(to_gateway_error)?;
        Ok(txs.into_iter().map(to_gateway_transaction).collect())
    }

    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        if !self.webhook_checks {
            warn!("🪝️ Webhook signature checks are disabled. Accepting the webhook without checking it.");
            return true;
        }
        verify_signature(self.api.config().secret_key.reveal(), body, signature)
    }
}

impl PayoutGateway for PaystackGateway {
    async fn create_recipient(&self, account: &PayoutAccount) -> Result<String, GatewayError> {
        let recipient = NewTransferRecipient::nuban(&account.name, &account.account_number, &account.bank_code);
        let result = self.api.create_transfer_recipient(recipient).await.map_err(to_gateway_error)?;
        Ok(result.recipient_code)
    }

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError> {
        let transfer = NewTransfer::from_balance(request.amount.to_kobo(), &request.recipient_code, &request.reference)
            .with_reason(request.reason);
        let result = self.api.initiate_transfer(transfer).await.map_err(to_gateway_error)?;
        Ok(TransferReceipt { transfer_code: result.transfer_code, status: result.status })
    }
}
