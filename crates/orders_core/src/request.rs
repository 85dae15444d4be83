use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::contract::ValidationError;

/// Transport-neutral view of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub path_parameters: BTreeMap<String, String>,
    pub query_parameters: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Pre-verified subject supplied by the authorizer, if any.
    pub identity: Option<String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_identity(mut self, subject: impl Into<String>) -> Self {
        self.identity = Some(subject.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    pub fn path_order_id(&self) -> Option<&str> {
        self.path_parameters.get("id").map(String::as_str)
    }

    /// Normalizes an API Gateway REST proxy event.
    pub fn from_apigw_event(event: Value) -> Result<Self, ValidationError> {
        if !event.is_object() {
            return Err(ValidationError::new("Request payload must be a JSON object"));
        }

        let proxy: ProxyEvent = serde_json::from_value(event)
            .map_err(|error| ValidationError::new(format!("Malformed request event: {error}")))?;

        let identity = proxy
            .request_context
            .and_then(|context| context.authorizer)
            .and_then(|authorizer| authorizer.claims)
            .and_then(|mut claims| claims.remove("sub"))
            .and_then(|sub| match sub {
                Value::String(text) => Some(text),
                _ => None,
            })
            .filter(|sub| !sub.trim().is_empty());

        Ok(Self {
            method: proxy.http_method,
            path: proxy.path,
            path_parameters: proxy.path_parameters.unwrap_or_default(),
            query_parameters: proxy.query_string_parameters.unwrap_or_default(),
            body: proxy.body,
            identity,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyEvent {
    http_method: String,
    path: String,
    #[serde(default)]
    path_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    request_context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    #[serde(default)]
    authorizer: Option<Authorizer>,
}

#[derive(Debug, Deserialize)]
struct Authorizer {
    #[serde(default)]
    claims: Option<BTreeMap<String, Value>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_full_proxy_event() {
        let request = ApiRequest::from_apigw_event(json!({
            "httpMethod": "PUT",
            "path": "/v1/orders/o-1",
            "pathParameters": {"id": "o-1"},
            "queryStringParameters": {"limit": "5"},
            "body": "{\"status\":\"CONFIRMED\"}",
            "requestContext": {"authorizer": {"claims": {"sub": "user-123"}}}
        }))
        .expect("valid event");

        assert_eq!(request.method, "PUT");
        assert_eq!(request.path_order_id(), Some("o-1"));
        assert_eq!(request.query_parameters.get("limit").map(String::as_str), Some("5"));
        assert_eq!(request.body.as_deref(), Some("{\"status\":\"CONFIRMED\"}"));
        assert_eq!(request.identity.as_deref(), Some("user-123"));
    }

    #[test]
    fn null_maps_and_missing_context_default_to_empty() {
        let request = ApiRequest::from_apigw_event(json!({
            "httpMethod": "GET",
            "path": "/v1/orders",
            "pathParameters": null,
            "queryStringParameters": null,
            "body": null,
            "requestContext": {}
        }))
        .expect("valid event");

        assert_eq!(request, ApiRequest::new("GET", "/v1/orders"));
    }

    #[test]
    fn rejects_events_without_method_or_path() {
        let error = ApiRequest::from_apigw_event(json!({"path": "/v1/orders"}))
            .expect_err("missing method");
        assert!(error.message().starts_with("Malformed request event"));

        let error = ApiRequest::from_apigw_event(json!([1, 2])).expect_err("not an object");
        assert_eq!(error.message(), "Request payload must be a JSON object");
    }

    #[test]
    fn ignores_non_string_subject_claims() {
        let request = ApiRequest::from_apigw_event(json!({
            "httpMethod": "POST",
            "path": "/v1/orders",
            "requestContext": {"authorizer": {"claims": {"sub": 42}}}
        }))
        .expect("valid event");
        assert_eq!(request.identity, None);
    }
}
