use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::order::{Order, OrderItem, OrderPatch, OrderStatus};

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Body of `POST /v1/orders`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
}

impl CreateOrderRequest {
    /// The authenticated subject wins over a body-supplied customer id.
    pub fn resolve_customer_id(&self, identity: Option<&str>) -> Option<String> {
        identity
            .or(self.customer_id.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Body of `PUT /v1/orders/{id}`. Only the mutable fields are read; anything
/// else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
}

impl UpdateOrderRequest {
    pub fn into_patch(self, updated_at: chrono::DateTime<chrono::Utc>) -> OrderPatch {
        OrderPatch {
            status: self.status,
            total_amount: self.total_amount,
            items: self.items,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub customer_id: Option<String>,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            customer_id: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListQuery {
    /// Reads `customer_id` and `limit`. A limit that is not a positive integer
    /// falls back to the default; larger limits are capped.
    pub fn from_query_parameters(parameters: &BTreeMap<String, String>) -> Self {
        let customer_id = parameters
            .get("customer_id")
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let limit = parameters
            .get("limit")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .map(|value| value.min(MAX_LIST_LIMIT))
            .unwrap_or(DEFAULT_LIST_LIMIT);

        Self { customer_id, limit }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub count: usize,
}

impl From<Vec<Order>> for OrderList {
    fn from(orders: Vec<Order>) -> Self {
        let count = orders.len();
        Self { orders, count }
    }
}

/// Parses a request body. A missing or blank body reads as `{}`.
pub fn parse_json_body<T: DeserializeOwned>(body: Option<&str>) -> Result<T, ValidationError> {
    let text = match body {
        Some(value) if !value.trim().is_empty() => value,
        _ => "{}",
    };

    serde_json::from_str(text).map_err(|error| match error.classify() {
        Category::Data => ValidationError::new(format!("Invalid input: {error}")),
        Category::Syntax | Category::Eof | Category::Io => {
            ValidationError::new(format!("Malformed JSON body: {error}"))
        }
    })
}
