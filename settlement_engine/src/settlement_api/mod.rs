//! # Settlement engine public API
//!
//! The `settlement_api` module exposes the programmatic API for the settlement engine. Each API is a thin struct over
//! a backend that implements the storage traits it needs (and, where relevant, a gateway), so clients can pick the
//! pieces they want.
//!
//! * [`payment_flow_api`] takes a cart through checkout, payment verification and gateway webhooks.
//! * [`payout_api`] pays sellers their share of a settled order.
//! * [`earnings_api`] reports what sellers have earned and what the platform has kept.
//! * [`order_api`] gives sellers their view of orders and lets them move fulfillment along.
//! * [`catalog_api`] manages sellers and products.
//! * [`reconciliation_api`] catches payments whose callbacks never arrived.
//!
//! [`stock_ledger`], [`cart_validator`] and [`order_builder`] are the building blocks the payment flow is made of.
//!
//! # API usage
//!
//! ```rust,ignore
//! use settlement_engine::{EarningsApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements SettlementManagement
//! let api = EarningsApi::new(db);
//! let earnings = api.earnings_for_seller(seller_id).await?;
//! ```

pub mod cart_objects;
pub mod cart_validator;
pub mod catalog_api;
pub mod earnings_api;
pub mod errors;
pub mod order_api;
pub mod order_builder;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod payout_api;
pub mod reconciliation_api;
pub mod stock_ledger;
