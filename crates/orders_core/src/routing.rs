use thiserror::Error;

pub const ORDERS_COLLECTION_PATH: &str = "/v1/orders";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CreateOrder,
    ListOrders,
    GetOrder(String),
    UpdateOrder(String),
    DeleteOrder(String),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateOrder => "create_order",
            Self::ListOrders => "list_orders",
            Self::GetOrder(_) => "get_order",
            Self::UpdateOrder(_) => "update_order",
            Self::DeleteOrder(_) => "delete_order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Endpoint not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Order ID is required")]
    MissingOrderId,
}

impl RouteError {
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::MissingOrderId => 400,
        }
    }
}

/// Maps a method and path onto a route.
///
/// `path_order_id` is the gateway-extracted `{id}` parameter; when it is absent
/// the id is taken from the path itself.
pub fn resolve_route(
    method: &str,
    path: &str,
    path_order_id: Option<&str>,
) -> Result<Route, RouteError> {
    let method = method.trim().to_ascii_uppercase();

    if path == ORDERS_COLLECTION_PATH {
        return match method.as_str() {
            "POST" => Ok(Route::CreateOrder),
            "GET" => Ok(Route::ListOrders),
            _ => Err(RouteError::MethodNotAllowed),
        };
    }

    let Some(rest) = path
        .strip_prefix(ORDERS_COLLECTION_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Err(RouteError::NotFound);
    };

    let segment = rest.strip_suffix('/').unwrap_or(rest);
    if segment.contains('/') {
        return Err(RouteError::NotFound);
    }

    let order_id = path_order_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(segment.trim());
    if order_id.is_empty() {
        return Err(RouteError::MissingOrderId);
    }
    let order_id = order_id.to_string();

    match method.as_str() {
        "GET" => Ok(Route::GetOrder(order_id)),
        "PUT" => Ok(Route::UpdateOrder(order_id)),
        "DELETE" => Ok(Route::DeleteOrder(order_id)),
        _ => Err(RouteError::MethodNotAllowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_routes() {
        assert_eq!(resolve_route("POST", "/v1/orders", None), Ok(Route::CreateOrder));
        assert_eq!(resolve_route("GET", "/v1/orders", None), Ok(Route::ListOrders));
        assert_eq!(
            resolve_route("DELETE", "/v1/orders", None),
            Err(RouteError::MethodNotAllowed)
        );
    }

    #[test]
    fn item_routes_take_id_from_path_parameters_first() {
        assert_eq!(
            resolve_route("GET", "/v1/orders/abc", Some("abc")),
            Ok(Route::GetOrder("abc".to_string()))
        );
        assert_eq!(
            resolve_route("PUT", "/v1/orders/from-path", None),
            Ok(Route::UpdateOrder("from-path".to_string()))
        );
        assert_eq!(
            resolve_route("delete", "/v1/orders/abc/", None),
            Ok(Route::DeleteOrder("abc".to_string()))
        );
        assert_eq!(
            resolve_route("POST", "/v1/orders/abc", None),
            Err(RouteError::MethodNotAllowed)
        );
    }

    #[test]
    fn empty_item_id_is_a_client_error() {
        let error = resolve_route("GET", "/v1/orders/", None).expect_err("no id");
        assert_eq!(error, RouteError::MissingOrderId);
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.to_string(), "Order ID is required");
    }

    #[test]
    fn unmatched_paths_are_not_found() {
        for path in ["/", "/v1/ordersx", "/v2/orders", "/v1/orders/a/b", "/v1/customers"] {
            assert_eq!(
                resolve_route("GET", path, None),
                Err(RouteError::NotFound),
                "path {path}"
            );
        }
    }
}
