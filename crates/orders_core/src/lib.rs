//! Shared order domain primitives.
//!
//! This crate owns the order entity, its validation rules, the request/response
//! contracts and the route table. It intentionally excludes AWS SDK and Lambda
//! runtime concerns, which live in `orders_lambda`.

pub mod contract;
pub mod order;
pub mod request;
pub mod routing;
pub mod timestamp;

pub use contract::ValidationError;
pub use order::{Order, OrderItem, OrderPatch, OrderStatus};
