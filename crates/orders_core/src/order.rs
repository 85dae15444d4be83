use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contract::ValidationError;
use crate::timestamp::{next_after, parse_timestamp, serialize_timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored or submitted status. The retired `COMPLETED` value is
    /// read as `DELIVERED` and is never written back.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .or_else(|| (value == "COMPLETED").then_some(Self::Delivered))
            .ok_or_else(|| ValidationError::new(format!("'{value}' is not a valid OrderStatus")))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price,
        }
    }

    fn validate_into(&self, index: usize, errors: &mut Vec<String>) {
        if self.product_id.trim().is_empty() {
            errors.push(format!("items[{index}].product_id is required"));
        }
        if self.quantity == 0 {
            errors.push(format!("items[{index}].quantity must be greater than 0"));
        }
        if self.price < Decimal::ZERO {
            errors.push(format!("items[{index}].price must be non-negative"));
        }
    }
}

/// Partial update of the mutable order fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub total_amount: Option<Decimal>,
    pub items: Option<Vec<OrderItem>>,
    pub updated_at: DateTime<Utc>,
}

impl OrderPatch {
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            total_amount: None,
            items: None,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    order_id: String,
    customer_id: String,
    status: OrderStatus,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    total_amount: Decimal,
    #[serde(serialize_with = "serialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    updated_at: DateTime<Utc>,
    items: Vec<OrderItem>,
}

impl Order {
    /// Builds an order whose `updated_at` equals `created_at`.
    ///
    /// Only structural checks run here; a zero amount is accepted and left for
    /// [`Order::validate`] to reject before persistence.
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        status: OrderStatus,
        total_amount: Decimal,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let order_id = order_id.into();
        let customer_id = customer_id.into();

        if order_id.trim().is_empty() {
            return Err(ValidationError::new("order_id is required"));
        }
        if customer_id.trim().is_empty() {
            return Err(ValidationError::new("customer_id is required"));
        }
        if total_amount < Decimal::ZERO {
            return Err(ValidationError::new("total_amount must be non-negative"));
        }

        Ok(Self {
            order_id,
            customer_id,
            status,
            total_amount,
            created_at,
            updated_at: created_at,
            items,
        })
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        if updated_at < self.created_at {
            return Err(ValidationError::new("updated_at must not precede created_at"));
        }
        self.updated_at = updated_at;
        Ok(self)
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Pre-persistence checks. Returns every problem found, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.order_id.trim().is_empty() {
            errors.push("order_id is required".to_string());
        }
        if self.customer_id.trim().is_empty() {
            errors.push("customer_id is required".to_string());
        }
        if self.total_amount <= Decimal::ZERO {
            errors.push("total_amount must be greater than 0".to_string());
        }
        for (index, item) in self.items.iter().enumerate() {
            item.validate_into(index, &mut errors);
        }

        errors
    }

    /// Timestamp to stamp on the next mutation, strictly after the current one.
    pub fn next_update_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_after(&self.updated_at, now)
    }

    /// Applies the supplied fields. `updated_at` never moves backwards.
    pub fn apply(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(total_amount) = patch.total_amount {
            self.total_amount = total_amount;
        }
        if let Some(items) = &patch.items {
            self.items = items.clone();
        }
        self.updated_at = self.updated_at.max(patch.updated_at);
    }
}

#[derive(Debug, Deserialize)]
struct OrderRecord {
    order_id: String,
    customer_id: String,
    status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    total_amount: Decimal,
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    items: Option<Vec<OrderItem>>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = ValidationError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&record.created_at)?;
        let order = Order::new(
            record.order_id,
            record.customer_id,
            record.status,
            record.total_amount,
            record.items.unwrap_or_default(),
            created_at,
        )?;

        match record.updated_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => order.with_updated_at(parse_timestamp(raw)?),
            _ => Ok(order),
        }
    }
}
