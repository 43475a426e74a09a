#[allow(unused)]
mod common;

use common::{init_resource_server, init_tool_server_simple};
use quay::{serve, transport::SplitTransport, MCPService, ServiceExt};

// Compares parsed values, so key order on the wire doesn't matter.
macro_rules! assert_json_eq {
    ($actual:expr, $expected:expr) => {
        let actual = serde_json::from_str::<serde_json::Value>($actual)
            .unwrap_or_else(|e| panic!("Response is not JSON ({}): {:?}", e, $actual));
        let expected = serde_json::from_str::<serde_json::Value>($expected)
            .unwrap_or_else(|e| panic!("Expected value is not JSON ({}): {:?}", e, $expected));
        assert_eq!(actual, expected);
    };
}

#[tokio::test]
async fn test_key_order_is_ignored() {
    let response = request(r#"{"jsonrpc": "2.0", "method": "ping", "id": 1}"#).await;
    assert!(response.find("\"id\"") < response.find("\"result\""));
    assert_json_eq!(&response, r#"{"result": {}, "id": 1, "jsonrpc": "2.0"}"#);
}

#[tokio::test]
async fn test_invalid_json() {
    let response = request(r#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32700, "message": "JSON parsing error when deserialising the message"}, "id": null}"#
    );
}

#[tokio::test]
async fn test_invalid_request() {
    let response = request(r#"{}"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null}"#
    );

    let response = request(r#"{"jsonrpc": "2.0", "method": 1, "params": "bar"}"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc":"2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null}"#
    );

    // The id is echoed when it can be recovered
    let response = request(r#"{"jsonrpc": "2.0", "method": "ping", "params": 3, "id": "a"}"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc":"2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": "a"}"#
    );
}

#[tokio::test]
async fn test_method_not_found() {
    let response =
        request(r#"{"jsonrpc": "2.0", "method": "non_existent_method", "params": {}, "id": 1}"#)
            .await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found: non_existent_method"}, "id": 1}"#
    );
}

#[tokio::test]
async fn test_tool_failure_is_not_a_protocol_error() {
    let response = request(
        r#"{"jsonrpc": "2.0", "method": "tools/call", "params": {"name": "calculator", "arguments": {"x": 1, "y": 2, "operation": "invalid_operation"}}, "id": 1}"#,
    ).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "result": {"content": [{"type": "text", "text": "Invalid arguments: Unknown operation: invalid_operation"}], "isError": true}, "id": 1}"#
    );
}

#[tokio::test]
async fn test_incorrect_jsonrpc_version() {
    // JSON-RPC v1.0
    let response =
        request(r#"{"jsonrpc": "1.0", "method": "initialize", "params": {}, "id": 1}"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": 1}"#
    );

    // missing JSON-RPC version
    let response = request(r#"{"method": "initialize", "params": {}, "id": 1}"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": 1}"#
    );
}

#[tokio::test]
async fn test_batch_no_valid_messages() {
    // Empty array
    let response = request(r#"[]"#).await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request: batch is empty"}, "id": null}"#
    );

    // Non-empty batch (one message), but no valid message
    let response = request(r#"[1]"#).await;
    assert_json_eq!(
        &response,
        r#"[{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null}]"#
    );

    // Non-empty batch (multiple messages), but no valid message
    let response = request(r#"[1,2]"#).await;
    assert_json_eq!(
        &response,
        r#"[{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null},{"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null}]"#
    );
}

#[tokio::test]
async fn test_batch_invalid_json() {
    let response = request(
        r#"[{"jsonrpc": "2.0", "method": "sum", "params": [1,2,4], "id": "1"},{"jsonrpc": "2.0", "method"]"#,
    )
    .await;
    assert_json_eq!(
        &response,
        r#"{"jsonrpc": "2.0", "error": {"code": -32700, "message": "JSON parsing error when deserialising the message"}, "id": null}"#
    );
}

#[tokio::test]
async fn test_mixed_batch() {
    // Notifications are dropped from the answer; everything else keeps its position
    let response = request(
        r#"[
            {"jsonrpc": "2.0", "method": "tools/call", "params": {"name": "add", "arguments": {"a": 1, "b": 2}}, "id": 1},
            {"jsonrpc": "2.0", "method": "notifications/initialized"},
            {"jsonrpc": "2.0", "method": "foo/bar", "id": "two"},
            {"foo": "boo"},
            {"jsonrpc": "2.0", "method": "ping", "id": 3}
        ]"#
        .replace('\n', " ")
        .as_str(),
    )
    .await;
    assert_json_eq!(
        &response,
        r#"[
            {"jsonrpc": "2.0", "result": {"content": [{"type": "text", "text": "3"}]}, "id": 1},
            {"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found: foo/bar"}, "id": "two"},
            {"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid request"}, "id": null},
            {"jsonrpc": "2.0", "result": {}, "id": 3}
        ]"#
    );
}

#[tokio::test]
async fn test_notifications_produce_no_output() {
    let response = request(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#).await;
    assert_eq!(response, "");

    let response = request(
        r#"[{"jsonrpc": "2.0", "method": "notifications/initialized"}, {"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {"requestId": 1}}]"#,
    )
    .await;
    assert_eq!(response, "");
}

#[tokio::test]
async fn test_one_response_per_line() {
    let input = concat!(
        r#"{"jsonrpc": "2.0", "method": "ping", "id": 1}"#,
        "\n\n",
        r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc": "2.0", "method": "resources/read", "params": {"uri": "unknown://thing"}, "id": 2}"#,
        "\n",
        "not json\n",
    );
    let output = run(init_resource_server(), input).await;
    let lines: Vec<_> = output.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_json_eq!(lines[0], r#"{"jsonrpc": "2.0", "result": {}, "id": 1}"#);
    assert_json_eq!(
        lines[1],
        r#"{"jsonrpc": "2.0", "error": {"code": -32602, "message": "Resource not found: unknown://thing"}, "id": 2}"#
    );
    assert_json_eq!(
        lines[2],
        r#"{"jsonrpc": "2.0", "error": {"code": -32700, "message": "JSON parsing error when deserialising the message"}, "id": null}"#
    );
}

/// Feed `input` to a server over an in-memory transport and collect everything it wrote.
async fn run(service: MCPService, input: &str) -> String {
    let mut transport = SplitTransport::new(input.as_bytes(), Vec::new());
    serve(service.into_request_service(), &mut transport)
        .await
        .unwrap();
    let (_, written) = transport.into_inner();
    String::from_utf8(written).unwrap()
}

async fn request(input: &str) -> String {
    let mut line = input.to_string();
    line.push('\n');
    run(init_tool_server_simple(), &line).await.trim().to_string()
}
