//! Pays sellers their share of a settled order.
//!
//! Each (order, seller) pair gets at most one transfer row. A transfer is claimed before the gateway is called, and
//! only `failed` transfers can be claimed again, so a seller is never paid twice for the same order.
use std::{collections::BTreeMap, fmt::Debug};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Naira, NewTransfer, Order, PaymentStatus, Transfer, TransferStatus},
    settlement_api::errors::SettlementError,
    traits::{CatalogManagement, OrderManagement, PayoutGateway, SettlementManagement, TransferRequest},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PayoutResult {
    /// The gateway accepted the transfer.
    Initiated { transfer: Transfer },
    /// A transfer for this seller is already pending or has succeeded.
    Skipped { existing: Option<Transfer> },
    /// The transfer could not be made. It can be retried.
    Failed { transfer: Transfer, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerPayout {
    pub seller_id: i64,
    pub amount: Naira,
    #[serde(flatten)]
    pub result: PayoutResult,
}

#[derive(Clone)]
pub struct PayoutApi<B, P> {
    db: B,
    gateway: P,
}

impl<B, P> Debug for PayoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi")
    }
}

impl<B, P> PayoutApi<B, P> {
    pub fn new(db: B, gateway: P) -> Self {
        Self { db, gateway }
    }
}

impl<B, P> PayoutApi<B, P>
where
    B: CatalogManagement + OrderManagement + SettlementManagement,
    P: PayoutGateway,
{
    /// Sends every seller in a paid order their wholesale earnings. Sellers are handled independently: one seller's
    /// failure does not stop the others from being paid.
    ///
    /// Order and payment state are never modified.
    pub async fn dispatch_for_order(&self, order_id: i64) -> Result<Vec<SellerPayout>, SettlementError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        if order.payment_status != PaymentStatus::Successful {
            return Err(SettlementError::OrderNotPaid(order_id, order.payment_status));
        }
        let items = self.db.fetch_line_items(order_id).await?;
        let mut amounts = BTreeMap::<i64, Naira>::new();
        for item in &items {
            *amounts.entry(item.seller_id).or_default() += item.seller_earning();
        }
        debug!("💸️ Settling order [{}] with {} sellers", order.order_number, amounts.len());
        let mut payouts = Vec::with_capacity(amounts.len());
        for (seller_id, amount) in amounts {
            let result = match self.db.claim_transfer(NewTransfer::new(&order, seller_id, amount)).await? {
                Some(transfer) => self.pay_out(&order, transfer).await?,
                None => {
                    let existing = self.existing_transfer(order_id, seller_id).await?;
                    debug!("💸️ Seller #{seller_id} already has a live transfer for order [{}]", order.order_number);
                    PayoutResult::Skipped { existing }
                },
            };
            payouts.push(SellerPayout { seller_id, amount, result });
        }
        Ok(payouts)
    }

    /// Makes another attempt at a failed transfer.
    pub async fn retry_transfer(&self, transfer_id: i64) -> Result<SellerPayout, SettlementError> {
        let transfer = self.db.fetch_transfer(transfer_id).await?.ok_or(SettlementError::TransferNotFound(transfer_id))?;
        self.retry(transfer).await
    }

    /// Like [`Self::retry_transfer`], but only if the transfer belongs to `seller_id`.
    pub async fn retry_transfer_for_seller(
        &self,
        transfer_id: i64,
        seller_id: i64,
    ) -> Result<SellerPayout, SettlementError> {
        let transfer = self.db.fetch_transfer(transfer_id).await?.ok_or(SettlementError::TransferNotFound(transfer_id))?;
        if transfer.seller_id != seller_id {
            warn!("💸️ Seller #{seller_id} tried to retry transfer {transfer_id}, which belongs to #{}", transfer.seller_id);
            return Err(SettlementError::NotTransferOwner(transfer_id));
        }
        self.retry(transfer).await
    }

    pub async fn transfers_for_order(&self, order_id: i64) -> Result<Vec<Transfer>, SettlementError> {
        Ok(self.db.fetch_transfers_for_order(order_id).await?)
    }

    async fn retry(&self, transfer: Transfer) -> Result<SellerPayout, SettlementError> {
        if transfer.status != TransferStatus::Failed {
            return Err(SettlementError::TransferNotRetryable { id: transfer.id, status: transfer.status });
        }
        let order =
            self.db.fetch_order(transfer.order_id).await?.ok_or(SettlementError::OrderNotFound(transfer.order_id))?;
        let claim = NewTransfer::new(&order, transfer.seller_id, transfer.amount);
        let seller_id = transfer.seller_id;
        let amount = transfer.amount;
        let result = match self.db.claim_transfer(claim).await? {
            Some(transfer) => {
                info!("💸️ Retrying transfer {} for seller #{seller_id}", transfer.reference);
                self.pay_out(&order, transfer).await?
            },
            // Someone else retried it first
            None => PayoutResult::Skipped { existing: self.db.fetch_transfer(transfer.id).await? },
        };
        Ok(SellerPayout { seller_id, amount, result })
    }

    async fn existing_transfer(&self, order_id: i64, seller_id: i64) -> Result<Option<Transfer>, SettlementError> {
        let transfers = self.db.fetch_transfers_for_order(order_id).await?;
        Ok(transfers.into_iter().find(|t| t.seller_id == seller_id))
    }

    /// Sends a claimed (pending) transfer to the gateway. Only store errors are returned as `Err`. Everything else is
    /// recorded against the transfer.
    async fn pay_out(&self, order: &Order, transfer: Transfer) -> Result<PayoutResult, SettlementError> {
        let recipient = match self.recipient_for(transfer.seller_id).await {
            Ok(code) => code,
            Err(SettlementError::StoreError(e)) => return Err(e.into()),
            Err(e) => return self.record_failure(transfer, e).await,
        };
        let request = TransferRequest {
            amount: transfer.amount,
            recipient_code: recipient,
            reference: transfer.reference.clone(),
            reason: format!("Payout for order {}", order.order_number),
        };
        match self.gateway.initiate_transfer(request).await {
            Ok(receipt) => {
                let mut transfer = self.db.mark_transfer_initiated(transfer.id, &receipt.transfer_code).await?;
                if receipt.status.eq_ignore_ascii_case("success") {
                    transfer = self.db.update_transfer_status(transfer.id, TransferStatus::Success, None).await?;
                }
                info!(
                    "💸️ Transfer {} of {} to seller #{} initiated ({})",
                    transfer.reference, transfer.amount, transfer.seller_id, receipt.transfer_code
                );
                Ok(PayoutResult::Initiated { transfer })
            },
            Err(e) => self.record_failure(transfer, e.into()).await,
        }
    }

    async fn record_failure(&self, transfer: Transfer, error: SettlementError) -> Result<PayoutResult, SettlementError> {
        let reason = error.to_string();
        warn!("💸️ Transfer {} to seller #{} failed. {reason}", transfer.reference, transfer.seller_id);
        let transfer = self.db.update_transfer_status(transfer.id, TransferStatus::Failed, Some(&reason)).await?;
        Ok(PayoutResult::Failed { transfer, reason })
    }

    /// Returns the seller's gateway recipient code, registering their bank details with the gateway if needed.
    async fn recipient_for(&self, seller_id: i64) -> Result<String, SettlementError> {
        let seller = self.db.fetch_seller(seller_id).await?.ok_or(SettlementError::SellerNotFound(seller_id))?;
        if let Some(code) = seller.recipient_code.clone() {
            return Ok(code);
        }
        let account = seller.payout_account().ok_or(SettlementError::MissingPayoutDetails(seller_id))?;
        let code = self.gateway.create_recipient(&account).await?;
        self.db.save_recipient_code(seller_id, &code).await?;
        debug!("💸️ Registered seller #{seller_id} as transfer recipient {code}");
        Ok(code)
    }
}
