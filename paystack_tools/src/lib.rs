//! A thin client for the Paystack REST API.
//!
//! Only the calls the marketplace settlement flow needs are implemented: hosted checkout sessions, transaction
//! verification and listing, transfer recipients and transfers. Webhook signature helpers live in [`signature`].
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod signature;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use error::PaystackApiError;
