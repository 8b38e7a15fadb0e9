//! XMenu - Multi-tenant storefront backend with PIX checkout
//!
//! This library provides the core functionality for the XMenu platform:
//! payment creation and reconciliation against the PIX gateway, order and
//! stock management, plan subscriptions, and WhatsApp notifications.

pub mod checkout;
pub mod config;
pub mod cpf;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod idempotency;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod poller;
pub mod reconcile;
pub mod util;
