use orders_core::timestamp::{format_timestamp, now};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

const ALLOWED_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    /// Parsed JSON body, `None` for an empty body.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub timestamp: String,
}

pub fn success_response(status_code: u16, payload: &impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: cors_headers(),
            body,
        },
        Err(serialize_error) => {
            error!(error = %serialize_error, "failed to serialize response payload");
            internal_error_response()
        }
    }
}

pub fn no_content_response() -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code: 204,
        headers: cors_headers(),
        body: String::new(),
    }
}

pub fn error_response(status_code: u16, message: impl Into<String>) -> ApiGatewayResponse {
    let payload = ErrorBody {
        error: message.into(),
        timestamp: format_timestamp(&now()),
    };
    ApiGatewayResponse {
        status_code,
        headers: cors_headers(),
        body: json!(payload).to_string(),
    }
}

pub fn validation_error_response(message: impl Into<String>) -> ApiGatewayResponse {
    error_response(400, message)
}

pub fn not_found_response() -> ApiGatewayResponse {
    error_response(404, "Order not found")
}

pub fn internal_error_response() -> ApiGatewayResponse {
    error_response(500, INTERNAL_ERROR_MESSAGE)
}

fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Headers": ALLOWED_HEADERS,
        "Access-Control-Allow-Methods": ALLOWED_METHODS,
    })
}

#[cfg(test)]
mod tests {
    use orders_core::timestamp::parse_timestamp;

    use super::*;

    #[test]
    fn every_response_carries_cors_headers() {
        for response in [
            success_response(200, &json!({"ok": true})),
            no_content_response(),
            error_response(418, "teapot"),
        ] {
            assert_eq!(response.headers["Content-Type"], "application/json");
            assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
            assert_eq!(response.headers["Access-Control-Allow-Methods"], ALLOWED_METHODS);
        }
    }

    #[test]
    fn error_body_has_message_and_timestamp() {
        let response = error_response(404, "Order not found");
        let body: ErrorBody = serde_json::from_str(&response.body).expect("error body");

        assert_eq!(response.status_code, 404);
        assert_eq!(body.error, "Order not found");
        assert!(parse_timestamp(&body.timestamp).is_ok());
    }

    #[test]
    fn no_content_has_empty_body() {
        let response = no_content_response();
        assert_eq!(response.status_code, 204);
        assert!(response.body.is_empty());
        assert_eq!(response.json_body(), None);
    }

    #[test]
    fn serializes_with_gateway_field_names() {
        let value = serde_json::to_value(no_content_response()).expect("serialize");
        assert_eq!(value["statusCode"], 204);
        assert_eq!(value["body"], "");
    }
}
