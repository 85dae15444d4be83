use lambda_runtime::{service_fn, Error, LambdaEvent};
use orders_lambda::adapters::dynamodb::DynamoOrderStore;
use orders_lambda::config::OrdersConfig;
use orders_lambda::handlers::response::ApiGatewayResponse;
use orders_lambda::handlers::router::handle_api_event;
use orders_lambda::logging::init_logging;
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    store: &DynamoOrderStore,
) -> Result<ApiGatewayResponse, Error> {
    tracing::debug!(request_id = %event.context.request_id, "invocation started");
    Ok(handle_api_event(event.payload, store))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = OrdersConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_logging(&config.log_level);

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoOrderStore::new(aws_sdk_dynamodb::Client::new(&aws_config), config.table_name);
    let store = &store;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, store).await
    }))
    .await
}
