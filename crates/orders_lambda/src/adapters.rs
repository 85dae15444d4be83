pub mod dynamodb;
#[cfg(feature = "test-helpers")]
pub mod memory;
pub mod order_store;
