//! AWS-oriented adapters and handlers for the orders API.
//!
//! This crate owns runtime integration details (the Lambda entry point, the
//! DynamoDB storage adapter, configuration and logging) on top of the domain
//! contracts in `orders_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
