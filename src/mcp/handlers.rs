use crate::error::Result;
use crate::mcp::tools::{tool_definitions, ToolExecutor};
use crate::mcp::types::{
    JsonRpcRequest, JsonRpcResponse, RpcMethod, ToolCallParams, INTERNAL_ERROR, METHOD_NOT_FOUND,
};
use axum::http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, warn};

pub const PROTOCOL_VERSION: &str = "0.1.0";
pub const SERVER_NAME: &str = "polymarket-mcp";

/// Handle one `/messages` body. Envelope failures map to HTTP 500 with -32603;
/// everything else is HTTP 200 carrying either a result or an RPC error.
pub async fn handle_message(executor: &ToolExecutor, body: &[u8]) -> (StatusCode, JsonRpcResponse) {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => return internal_error(Value::Null, e),
    };

    let id = payload.get("id").cloned().unwrap_or(Value::Null);

    let request: JsonRpcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => return internal_error(id, e),
    };

    match dispatch(executor, request).await {
        Ok(response) => (StatusCode::OK, response),
        Err(e) => internal_error(id, e),
    }
}

/// A body that could not be read at all, e.g. one over the size limit.
pub fn unreadable_body(cause: impl std::fmt::Display) -> (StatusCode, JsonRpcResponse) {
    internal_error(Value::Null, cause)
}

pub async fn dispatch(executor: &ToolExecutor, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
    let id = request.id.unwrap_or(Value::Null);

    let response = match RpcMethod::from(request.method.as_str()) {
        RpcMethod::Initialize => JsonRpcResponse::ok(id, initialize_result()),
        RpcMethod::ToolsList => JsonRpcResponse::ok(id, tools_list_result()),
        RpcMethod::ToolsCall => {
            let params: ToolCallParams =
                serde_json::from_value(request.params.unwrap_or_else(|| json!({})))?;
            let arguments = params.arguments.unwrap_or_else(|| json!({}));
            let text = executor.execute(&params.name, &arguments).await;
            JsonRpcResponse::ok(id, tool_text_result(text))
        }
        RpcMethod::PromptsList => JsonRpcResponse::ok(id, json!({ "prompts": [] })),
        RpcMethod::Unknown(method) => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method), None)
        }
    };

    Ok(response)
}

fn internal_error(id: Value, cause: impl std::fmt::Display) -> (StatusCode, JsonRpcResponse) {
    let detail = cause.to_string();
    error!("Failed to handle message: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error", Some(Value::String(detail))),
    )
}

fn tool_text_result(text: String) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    })
}

fn tools_list_result() -> Value {
    json!({ "tools": tool_definitions() })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MarketSource;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EmptySource;

    #[async_trait]
    impl MarketSource for EmptySource {
        async fn fetch(&self, _path: &str, _query: &[(&str, String)]) -> Result<Value> {
            Ok(json!([]))
        }
    }

    fn executor() -> ToolExecutor {
        ToolExecutor::new(Arc::new(EmptySource))
    }

    #[test]
    fn initialize_advertises_both_versions() {
        let result = initialize_result();
        assert_eq!(result["protocolVersion"], "0.1.0");
        assert_eq!(result["serverInfo"]["version"], "1.0.0");
        assert_eq!(result["capabilities"], json!({"tools": {}, "prompts": {}}));
    }

    #[tokio::test]
    async fn tools_call_wraps_text_block() {
        let (status, response) = handle_message(
            &executor(),
            br#"{"jsonrpc":"2.0","id":"call-1","method":"tools/call","params":{"name":"list-markets"}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.id, json!("call-1"));
        assert_eq!(
            response.result.unwrap(),
            json!({"content": [{"type": "text", "text": "No markets found with the specified criteria."}]})
        );
    }

    #[tokio::test]
    async fn unknown_method_names_the_method() {
        let (status, response) = handle_message(
            &executor(),
            br#"{"jsonrpc":"2.0","id":3,"method":"foo/bar"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: foo/bar");
        assert!(error.data.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_internal_error() {
        let (status, response) = handle_message(&executor(), b"{not json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.id, Value::Null);
        let error = response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert_eq!(error.message, "Internal error");
        assert!(error.data.unwrap().is_string());
    }

    #[tokio::test]
    async fn envelope_without_method_keeps_id() {
        let (status, response) = handle_message(&executor(), br#"{"id":9}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.id, json!(9));
    }

    #[tokio::test]
    async fn prompts_list_is_empty() {
        let request = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(4)),
            method: "prompts/list".to_string(),
            params: None,
        };
        let response = dispatch(&executor(), request).await.unwrap();
        assert_eq!(response.result.unwrap(), json!({"prompts": []}));
    }
}
