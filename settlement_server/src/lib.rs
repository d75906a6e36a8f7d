//! # Marketplace settlement server
//! This crate hosts the HTTP surface of the marketplace settlement engine. It is responsible for:
//! Accepting checkouts and opening hosted payment sessions with the gateway.
//! Receiving payment verifications and signed gateway webhooks, and handing them to the payment flow.
//! Letting sellers inspect and fulfil their orders, check their earnings and retry failed payouts.
//! Paying sellers once an order is confirmed, and periodically sweeping stale pending orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/...`: Checkout, verification and the gateway webhook.
//! * `/orders`, `/earnings`, `/transfers/...`: Seller routes. These require a bearer token carrying a `seller_id`
//!   claim.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod reconciliation_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
