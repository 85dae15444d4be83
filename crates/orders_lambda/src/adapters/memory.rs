use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use orders_core::contract::ListQuery;
use orders_core::{Order, OrderPatch};

use super::order_store::{OrderStore, StoreError};

/// Process-local [`OrderStore`] with the same contract as the DynamoDB table.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<BTreeMap<String, Order>>,
    writes: AtomicUsize,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.orders.lock() {
            for order in orders {
                guard.insert(order.order_id().to_string(), order);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.lock().map(|orders| orders.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of create/update/delete calls that reached the map.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Order>>, StoreError> {
        self.orders
            .lock()
            .map_err(|_| StoreError::Backend("in-memory order store lock poisoned".to_string()))
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create(&self, order: &Order) -> Result<Order, StoreError> {
        let mut orders = self.lock()?;
        orders.insert(order.order_id().to_string(), order.clone());
        self.record_write();
        Ok(order.clone())
    }

    fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.lock()?.get(order_id).cloned())
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Order>, StoreError> {
        let orders = self.lock()?;
        let listed = match query.customer_id.as_deref() {
            Some(customer_id) => {
                let mut matching: Vec<Order> = orders
                    .values()
                    .filter(|order| order.customer_id() == customer_id)
                    .cloned()
                    .collect();
                matching.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
                matching.truncate(query.limit);
                matching
            }
            None => orders.values().take(query.limit).cloned().collect(),
        };
        Ok(listed)
    }

    fn update(&self, order_id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
        let mut orders = self.lock()?;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        order.apply(patch);
        self.record_write();
        Ok(order.clone())
    }

    fn delete(&self, order_id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(order_id);
        self.record_write();
        Ok(())
    }
}
