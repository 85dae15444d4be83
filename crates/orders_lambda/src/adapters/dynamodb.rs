use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use orders_core::contract::ListQuery;
use orders_core::timestamp::{format_timestamp, parse_timestamp};
use orders_core::{Order, OrderItem, OrderPatch, OrderStatus};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::order_store::{OrderStore, StoreError};

pub const CUSTOMER_INDEX_NAME: &str = "CustomerIndex";

const ORDER_ID: &str = "order_id";
const CUSTOMER_ID: &str = "customer_id";
const STATUS: &str = "status";
const TOTAL_AMOUNT: &str = "total_amount";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";
const ITEMS: &str = "items";
const PRODUCT_ID: &str = "product_id";
const QUANTITY: &str = "quantity";
const PRICE: &str = "price";

pub type Item = HashMap<String, AttributeValue>;

/// [`OrderStore`] backed by a DynamoDB table keyed by `order_id` with a
/// `CustomerIndex` global secondary index on `customer_id`.
#[derive(Debug, Clone)]
pub struct DynamoOrderStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoOrderStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        info!(table = %table_name, "initialized dynamodb order store");
        Self { client, table_name }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}

impl OrderStore for DynamoOrderStore {
    fn create(&self, order: &Order) -> Result<Order, StoreError> {
        let request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(order_to_item(order)));

        self.block_on(request.send())
            .map_err(|error| backend_error("put_item", error))?;
        info!(order_id = order.order_id(), "created order");
        Ok(order.clone())
    }

    fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        let request = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ORDER_ID, AttributeValue::S(order_id.to_string()));

        let output = self
            .block_on(request.send())
            .map_err(|error| backend_error("get_item", error))?;

        match output.item() {
            Some(item) => {
                debug!(order_id, "retrieved order");
                item_to_order(item).map(Some)
            }
            None => {
                warn!(order_id, "order not found");
                Ok(None)
            }
        }
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Order>, StoreError> {
        let limit = i32::try_from(query.limit).unwrap_or(i32::MAX);

        let items = match query.customer_id.as_deref() {
            Some(customer_id) => {
                let request = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(CUSTOMER_INDEX_NAME)
                    .key_condition_expression("#customer_id = :customer_id")
                    .expression_attribute_names("#customer_id", CUSTOMER_ID)
                    .expression_attribute_values(
                        ":customer_id",
                        AttributeValue::S(customer_id.to_string()),
                    )
                    .scan_index_forward(false)
                    .limit(limit);
                self.block_on(request.send())
                    .map_err(|error| backend_error("query", error))?
                    .items()
                    .to_vec()
            }
            None => {
                let request = self
                    .client
                    .scan()
                    .table_name(&self.table_name)
                    .limit(limit);
                self.block_on(request.send())
                    .map_err(|error| backend_error("scan", error))?
                    .items()
                    .to_vec()
            }
        };

        let orders = items
            .iter()
            .map(item_to_order)
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            count = orders.len(),
            customer_id = query.customer_id.as_deref(),
            "listed orders"
        );
        Ok(orders)
    }

    fn update(&self, order_id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
        let expression = UpdateExpression::from_patch(patch);
        let request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(ORDER_ID, AttributeValue::S(order_id.to_string()))
            .update_expression(expression.text)
            .condition_expression("attribute_exists(#order_id)")
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .return_values(ReturnValue::AllNew);

        let output = self.block_on(request.send()).map_err(|error| {
            let missing = error
                .as_service_error()
                .is_some_and(|service| service.is_conditional_check_failed_exception());
            if missing {
                StoreError::NotFound(order_id.to_string())
            } else {
                backend_error("update_item", error)
            }
        })?;

        let attributes = output.attributes().ok_or_else(|| {
            StoreError::Corrupt(format!("update_item returned no attributes for {order_id}"))
        })?;
        let order = item_to_order(attributes)?;
        info!(order_id, "updated order");
        Ok(order)
    }

    fn delete(&self, order_id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(ORDER_ID, AttributeValue::S(order_id.to_string()));

        self.block_on(request.send())
            .map_err(|error| backend_error("delete_item", error))?;
        info!(order_id, "deleted order");
        Ok(())
    }
}

fn backend_error(operation: &str, error: impl std::error::Error) -> StoreError {
    let detail = format!("{operation} failed: {}", error_chain(&error));
    warn!(error = %detail, "dynamodb call failed");
    StoreError::Backend(detail)
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// `SET` expression for a partial update; `updated_at` is always included.
#[derive(Debug, Clone, PartialEq)]
struct UpdateExpression {
    text: String,
    names: HashMap<String, String>,
    values: Item,
}

impl UpdateExpression {
    fn from_patch(patch: &OrderPatch) -> Self {
        let mut assignments = Vec::new();
        let mut names = HashMap::from([(format!("#{ORDER_ID}"), ORDER_ID.to_string())]);
        let mut values = Item::new();

        let mut set = |attribute: &str, value: AttributeValue| {
            assignments.push(format!("#{attribute} = :{attribute}"));
            names.insert(format!("#{attribute}"), attribute.to_string());
            values.insert(format!(":{attribute}"), value);
        };

        if let Some(status) = patch.status {
            set(STATUS, AttributeValue::S(status.as_str().to_string()));
        }
        if let Some(total_amount) = patch.total_amount {
            set(TOTAL_AMOUNT, decimal_value(total_amount));
        }
        if let Some(items) = &patch.items {
            set(ITEMS, items_value(items));
        }
        set(UPDATED_AT, AttributeValue::S(format_timestamp(&patch.updated_at)));

        Self {
            text: format!("SET {}", assignments.join(", ")),
            names,
            values,
        }
    }
}

pub fn order_to_item(order: &Order) -> Item {
    HashMap::from([
        (ORDER_ID.to_string(), AttributeValue::S(order.order_id().to_string())),
        (
            CUSTOMER_ID.to_string(),
            AttributeValue::S(order.customer_id().to_string()),
        ),
        (
            STATUS.to_string(),
            AttributeValue::S(order.status().as_str().to_string()),
        ),
        (TOTAL_AMOUNT.to_string(), decimal_value(order.total_amount())),
        (
            CREATED_AT.to_string(),
            AttributeValue::S(format_timestamp(&order.created_at())),
        ),
        (
            UPDATED_AT.to_string(),
            AttributeValue::S(format_timestamp(&order.updated_at())),
        ),
        (ITEMS.to_string(), items_value(order.items())),
    ])
}

pub fn item_to_order(item: &Item) -> Result<Order, StoreError> {
    let order_id = string_attribute(item, ORDER_ID)?;
    let corrupt = |message: String| StoreError::Corrupt(format!("{order_id}: {message}"));

    let status = OrderStatus::parse(string_attribute(item, STATUS)?)
        .map_err(|error| corrupt(error.to_string()))?;
    let total_amount = decimal_attribute(item, TOTAL_AMOUNT)?;
    let created_at = parse_timestamp(string_attribute(item, CREATED_AT)?)
        .map_err(|error| corrupt(error.to_string()))?;
    let items = match item.get(ITEMS) {
        None | Some(AttributeValue::Null(_)) => Vec::new(),
        Some(AttributeValue::L(entries)) => entries
            .iter()
            .map(order_item_from_value)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(corrupt(format!("{ITEMS} must be a list"))),
    };

    let order = Order::new(
        order_id,
        string_attribute(item, CUSTOMER_ID)?,
        status,
        total_amount,
        items,
        created_at,
    )
    .map_err(|error| corrupt(error.to_string()))?;

    match item.get(UPDATED_AT) {
        Some(AttributeValue::S(raw)) if !raw.trim().is_empty() => parse_timestamp(raw)
            .and_then(|updated_at| order.with_updated_at(updated_at))
            .map_err(|error| corrupt(error.to_string())),
        _ => Ok(order),
    }
}

fn order_item_from_value(value: &AttributeValue) -> Result<OrderItem, StoreError> {
    let AttributeValue::M(map) = value else {
        return Err(StoreError::Corrupt(format!(
            "{ITEMS} entries must be maps"
        )));
    };

    let quantity_text = number_attribute(map, QUANTITY)?;
    let quantity = quantity_text.parse::<u32>().map_err(|_| {
        StoreError::Corrupt(format!("{QUANTITY} '{quantity_text}' is not a positive integer"))
    })?;

    Ok(OrderItem::new(
        string_attribute(map, PRODUCT_ID)?,
        quantity,
        decimal_attribute(map, PRICE)?,
    ))
}

fn items_value(items: &[OrderItem]) -> AttributeValue {
    AttributeValue::L(
        items
            .iter()
            .map(|item| {
                AttributeValue::M(HashMap::from([
                    (
                        PRODUCT_ID.to_string(),
                        AttributeValue::S(item.product_id.clone()),
                    ),
                    (
                        QUANTITY.to_string(),
                        AttributeValue::N(item.quantity.to_string()),
                    ),
                    (PRICE.to_string(), decimal_value(item.price)),
                ]))
            })
            .collect(),
    )
}

fn decimal_value(value: Decimal) -> AttributeValue {
    AttributeValue::N(value.normalize().to_string())
}

fn string_attribute<'a>(item: &'a Item, name: &str) -> Result<&'a str, StoreError> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value),
        Some(_) => Err(StoreError::Corrupt(format!("{name} must be a string"))),
        None => Err(StoreError::Corrupt(format!("missing attribute {name}"))),
    }
}

fn number_attribute<'a>(item: &'a Item, name: &str) -> Result<&'a str, StoreError> {
    match item.get(name) {
        Some(AttributeValue::N(value)) => Ok(value),
        Some(_) => Err(StoreError::Corrupt(format!("{name} must be a number"))),
        None => Err(StoreError::Corrupt(format!("missing attribute {name}"))),
    }
}

fn decimal_attribute(item: &Item, name: &str) -> Result<Decimal, StoreError> {
    let text = number_attribute(item, name)?;
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| StoreError::Corrupt(format!("{name} '{text}' is not a decimal")))
}

#[cfg(test)]
mod tests {
    use orders_core::timestamp::parse_timestamp;

    use super::*;

    fn sample_order() -> Order {
        Order::new(
            "order-123",
            "customer-456",
            OrderStatus::Confirmed,
            Decimal::new(5998, 2),
            vec![OrderItem::new("prod-1", 2, Decimal::new(2999, 2))],
            parse_timestamp("2026-03-01T10:00:00Z").expect("timestamp"),
        )
        .expect("valid order")
    }

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: &str) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    #[test]
    fn order_item_mapping_round_trips() {
        let order = sample_order();
        let item = order_to_item(&order);

        assert_eq!(item.get(TOTAL_AMOUNT), Some(&n("59.98")));
        assert_eq!(item.get(STATUS), Some(&s("CONFIRMED")));
        assert_eq!(
            item.get(CREATED_AT),
            Some(&s("2026-03-01T10:00:00.000000+00:00"))
        );
        assert_eq!(item_to_order(&item), Ok(order));
    }

    #[test]
    fn reads_legacy_records() {
        let item = Item::from([
            (ORDER_ID.to_string(), s("o-1")),
            (CUSTOMER_ID.to_string(), s("c-1")),
            (STATUS.to_string(), s("COMPLETED")),
            (TOTAL_AMOUNT.to_string(), n("12.5")),
            (CREATED_AT.to_string(), s("2025-11-02T08:30:00.123456")),
        ]);

        let order = item_to_order(&item).expect("legacy record");
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.total_amount(), Decimal::new(125, 1));
        assert!(order.items().is_empty());
        assert_eq!(order.updated_at(), order.created_at());
    }

    #[test]
    fn rejects_malformed_records() {
        let mut item = order_to_item(&sample_order());
        item.insert(TOTAL_AMOUNT.to_string(), s("59.98"));
        assert_eq!(
            item_to_order(&item),
            Err(StoreError::Corrupt("total_amount must be a number".to_string()))
        );

        item.remove(ORDER_ID);
        assert_eq!(
            item_to_order(&item),
            Err(StoreError::Corrupt("missing attribute order_id".to_string()))
        );
    }

    #[test]
    fn update_expression_sets_only_supplied_fields() {
        let updated_at = parse_timestamp("2026-03-01T12:00:00Z").expect("timestamp");
        let patch = OrderPatch {
            status: Some(OrderStatus::Shipped),
            ..OrderPatch::touch(updated_at)
        };

        let expression = UpdateExpression::from_patch(&patch);
        assert_eq!(
            expression.text,
            "SET #status = :status, #updated_at = :updated_at"
        );
        assert_eq!(expression.values.get(":status"), Some(&s("SHIPPED")));
        assert_eq!(
            expression.values.get(":updated_at"),
            Some(&s("2026-03-01T12:00:00.000000+00:00"))
        );
        assert_eq!(
            expression.names.get("#order_id").map(String::as_str),
            Some("order_id")
        );
        assert!(!expression.values.contains_key(":total_amount"));
    }

    #[test]
    fn update_expression_encodes_items_as_list_of_maps() {
        let updated_at = parse_timestamp("2026-03-01T12:00:00Z").expect("timestamp");
        let patch = OrderPatch {
            items: Some(vec![OrderItem::new("p-9", 3, Decimal::new(100, 2))]),
            total_amount: Some(Decimal::new(300, 2)),
            ..OrderPatch::touch(updated_at)
        };

        let expression = UpdateExpression::from_patch(&patch);
        assert_eq!(
            expression.text,
            "SET #total_amount = :total_amount, #items = :items, #updated_at = :updated_at"
        );
        assert_eq!(expression.values.get(":total_amount"), Some(&n("3")));
        let Some(AttributeValue::L(entries)) = expression.values.get(":items") else {
            panic!("items should be a list");
        };
        let Some(AttributeValue::M(first)) = entries.first() else {
            panic!("entries should be maps");
        };
        assert_eq!(first.get(QUANTITY), Some(&n("3")));
        assert_eq!(first.get(PRICE), Some(&n("1")));
    }
}
