//! Marketplace Settlement Engine
//!
//! The settlement engine holds the core logic of a multi-vendor marketplace's money flow: checking carts against the
//! live catalog, taking payment through a hosted gateway session, confirming payments exactly once, and paying each
//! seller their wholesale share while the platform keeps its commission. It is gateway-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). The traits describe everything the engine needs from a
//!    backend. The data types stored there live in [`mod@db_types`] and are public.
//! 2. The public API (`settlement_api`). This provides the public-facing functionality of the engine: payment flow,
//!    payouts, earnings, orders, catalog and reconciliation.
//!
//! The engine also emits events that can be subscribed to. When an order is paid, an [`events::OrderPaidEvent`] is
//! emitted, and a shortfall in stock while confirming an order produces an [`events::StockAlertEvent`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod pricing;
mod settlement_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use pricing::PricingPolicy;
pub use settlement_api::{
    cart_objects,
    cart_validator::CartValidator,
    catalog_api::CatalogApi,
    earnings_api::{EarningsApi, SellerEarnings},
    errors::{CartError, CatalogApiError, OrderApiError, PaymentFlowError, SettlementError, StockError},
    order_api::{OrderApi, SellerOrder},
    order_builder::OrderBuilder,
    payment_flow_api::PaymentFlowApi,
    payment_objects,
    payout_api::{PayoutApi, PayoutResult, SellerPayout},
    reconciliation_api::{ReconciliationApi, DEFAULT_SESSION_EXPIRY},
    stock_ledger::{StockCheck, StockLedger},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::db::db_url;
pub use traits::{
    CatalogManagement,
    GatewayError,
    MarketplaceDatabase,
    OrderManagement,
    PaymentGateway,
    PayoutGateway,
    SettlementManagement,
    StockManagement,
    StoreError,
};
