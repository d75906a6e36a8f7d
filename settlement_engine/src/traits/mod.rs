//! # Storage and gateway contracts
//!
//! This module defines the interfaces that the settlement APIs are written against.
//!
//! ## Storage
//! Backends implement a small set of traits, each covering one area of the data model. The APIs in
//! [`crate::settlement_api`] only ask for the traits they need, so a test double only has to implement what is
//! exercised.
//!
//! * [`CatalogManagement`] covers sellers and products.
//! * [`StockManagement`] exposes the raw stock counter reads and conditional writes that the stock ledger is built on.
//! * [`OrderManagement`] handles order headers, line items and the conditional payment and fulfillment status edges.
//! * [`SettlementManagement`] handles payment transactions (the commission split), seller transfers and stock alerts.
//! * [`MarketplaceDatabase`] bundles all of them and is what a full backend provides.
//!
//! All coordination happens through conditional writes in the store. Backends must not cache mutable state.
//!
//! ## Gateways
//! [`PaymentGateway`] and [`PayoutGateway`] describe the hosted-checkout and disbursement services. The engine never
//! talks HTTP itself.
mod catalog_management;
mod data_objects;
mod gateway;
mod marketplace_database;
mod order_management;
mod settlement_management;
mod stock_management;

pub use catalog_management::CatalogManagement;
pub use data_objects::{EarningsTotals, PlatformSummary};
pub use gateway::{
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
};
pub use marketplace_database::{MarketplaceDatabase, StoreError};
pub use order_management::OrderManagement;
pub use settlement_management::SettlementManagement;
pub use stock_management::StockManagement;
