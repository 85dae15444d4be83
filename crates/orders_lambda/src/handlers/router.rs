use std::panic::{self, AssertUnwindSafe};

use orders_core::contract::{
    parse_json_body, CreateOrderRequest, ListQuery, OrderList, UpdateOrderRequest,
};
use orders_core::request::ApiRequest;
use orders_core::routing::{resolve_route, Route};
use orders_core::timestamp::now;
use orders_core::Order;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::order_store::{OrderStore, StoreError};
use crate::handlers::response::{
    error_response, internal_error_response, no_content_response, not_found_response,
    success_response, validation_error_response, ApiGatewayResponse,
};

type HandlerResult = Result<ApiGatewayResponse, StoreError>;

/// Entry point for one API Gateway proxy event.
///
/// Always yields a well-formed envelope: unexpected storage failures and panics
/// inside the handler become a generic 500.
pub fn handle_api_event(event: Value, store: &dyn OrderStore) -> ApiGatewayResponse {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        match ApiRequest::from_apigw_event(event) {
            Ok(request) => handle_request(&request, store),
            Err(invalid) => validation_error_response(invalid.message()),
        }
    }));

    outcome.unwrap_or_else(|_| {
        error!("order handler panicked");
        internal_error_response()
    })
}

pub fn handle_request(request: &ApiRequest, store: &dyn OrderStore) -> ApiGatewayResponse {
    info!(method = %request.method, path = %request.path, "received request");

    let route = match resolve_route(&request.method, &request.path, request.path_order_id()) {
        Ok(route) => route,
        Err(route_error) => {
            warn!(
                method = %request.method,
                path = %request.path,
                error = %route_error,
                "request did not match a route"
            );
            return error_response(route_error.status_code(), route_error.to_string());
        }
    };

    let operation = route.name();
    let result = match &route {
        Route::CreateOrder => create_order(request, store),
        Route::ListOrders => list_orders(request, store),
        Route::GetOrder(order_id) => get_order(order_id, store),
        Route::UpdateOrder(order_id) => update_order(order_id, request, store),
        Route::DeleteOrder(order_id) => delete_order(order_id, store),
    };

    result.unwrap_or_else(|store_error| {
        error!(operation, error = %store_error, "order operation failed");
        error_response(500, failure_message(&route))
    })
}

fn failure_message(route: &Route) -> &'static str {
    match route {
        Route::CreateOrder => "Failed to create order",
        Route::ListOrders => "Failed to list orders",
        Route::GetOrder(_) => "Failed to get order",
        Route::UpdateOrder(_) => "Failed to update order",
        Route::DeleteOrder(_) => "Failed to delete order",
    }
}

fn create_order(request: &ApiRequest, store: &dyn OrderStore) -> HandlerResult {
    let body: CreateOrderRequest = match parse_json_body(request.body.as_deref()) {
        Ok(value) => value,
        Err(invalid) => return Ok(validation_error_response(invalid.message())),
    };

    let Some(total_amount) = body.total_amount else {
        return Ok(validation_error_response(
            "Missing required field: total_amount",
        ));
    };

    let Some(customer_id) = body.resolve_customer_id(request.identity.as_deref()) else {
        return Ok(validation_error_response("customer_id is required"));
    };

    let order = match Order::new(
        Uuid::new_v4().to_string(),
        customer_id,
        body.status.unwrap_or_default(),
        total_amount,
        body.items.unwrap_or_default(),
        now(),
    ) {
        Ok(value) => value,
        Err(invalid) => {
            return Ok(validation_error_response(format!(
                "Validation errors: {}",
                invalid.message()
            )))
        }
    };

    if let Some(response) = reject_invalid(&order) {
        return Ok(response);
    }

    let created = store.create(&order)?;
    info!(
        order_id = created.order_id(),
        customer_id = created.customer_id(),
        "order created"
    );
    Ok(success_response(201, &created))
}

fn get_order(order_id: &str, store: &dyn OrderStore) -> HandlerResult {
    match store.get(order_id)? {
        Some(order) => Ok(success_response(200, &order)),
        None => Ok(not_found_response()),
    }
}

fn list_orders(request: &ApiRequest, store: &dyn OrderStore) -> HandlerResult {
    let query = ListQuery::from_query_parameters(&request.query_parameters);
    let orders = store.list(&query)?;
    info!(
        count = orders.len(),
        limit = query.limit,
        customer_id = query.customer_id.as_deref(),
        "orders listed"
    );
    Ok(success_response(200, &OrderList::from(orders)))
}

fn update_order(order_id: &str, request: &ApiRequest, store: &dyn OrderStore) -> HandlerResult {
    let body: UpdateOrderRequest = match parse_json_body(request.body.as_deref()) {
        Ok(value) => value,
        Err(invalid) => return Ok(validation_error_response(invalid.message())),
    };

    let Some(existing) = store.get(order_id)? else {
        return Ok(not_found_response());
    };

    let patch = body.into_patch(existing.next_update_timestamp(now()));
    let mut merged = existing;
    merged.apply(&patch);
    if let Some(response) = reject_invalid(&merged) {
        return Ok(response);
    }

    match store.update(order_id, &patch) {
        Ok(updated) => {
            info!(order_id, status = %updated.status(), "order updated");
            Ok(success_response(200, &updated))
        }
        // Deleted between the existence check and the write.
        Err(StoreError::NotFound(_)) => Ok(not_found_response()),
        Err(store_error) => Err(store_error),
    }
}

fn delete_order(order_id: &str, store: &dyn OrderStore) -> HandlerResult {
    // Storage deletes are idempotent; a repeated delete must still report 404.
    if store.get(order_id)?.is_none() {
        return Ok(not_found_response());
    }

    store.delete(order_id)?;
    info!(order_id, "order deleted");
    Ok(no_content_response())
}

fn reject_invalid(order: &Order) -> Option<ApiGatewayResponse> {
    let errors = order.validate();
    if errors.is_empty() {
        return None;
    }
    Some(validation_error_response(format!(
        "Validation errors: {}",
        errors.join(", ")
    )))
}
