use orders_core::contract::ListQuery;
use orders_core::{Order, OrderPatch};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed order does not exist.
    #[error("order not found: {0}")]
    NotFound(String),
    /// The backend could not be reached or rejected the call.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored record could not be read back as an order.
    #[error("corrupt order record: {0}")]
    Corrupt(String),
}

/// Single-item persistence for orders keyed by `order_id`, with a secondary
/// lookup by `customer_id`.
pub trait OrderStore {
    /// Plain put: a second create with the same id overwrites the first.
    fn create(&self, order: &Order) -> Result<Order, StoreError>;

    fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    /// With a customer filter, that customer's orders most-recent-first.
    /// Without one, an unordered bounded scan. Both are capped at `query.limit`.
    fn list(&self, query: &ListQuery) -> Result<Vec<Order>, StoreError>;

    /// Applies the supplied fields and the patch's `updated_at`, returning the
    /// merged record. Fails with [`StoreError::NotFound`] instead of creating.
    fn update(&self, order_id: &str, patch: &OrderPatch) -> Result<Order, StoreError>;

    /// Idempotent; deleting a missing order succeeds.
    fn delete(&self, order_id: &str) -> Result<(), StoreError>;
}
