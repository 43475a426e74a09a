#[allow(unused)]
mod common;

use common::*;
use quay::{
    errors::RegistryError,
    handler::{list_fn, template_fn},
    MCPServiceBuilder, RegisteredTemplate, ResourceError,
};
use quay_mcp_protocol::{
    jsonrpc::ErrorCode,
    resource::{Resource, ResourceContents, ResourceTemplate},
};
use serde_json::json;

// Listing resources
// Spec: https://spec.modelcontextprotocol.io/specification/2024-11-05/server/resources/#listing-resources
#[tokio::test]
async fn test_list_resources() {
    let mut server = init_resource_server();

    let result = expect_success(call_server(&mut server, "resources/list", json!({})).await);
    assert_eq!(
        result,
        json!({
            "resources": [
                {"uri": "config://app", "name": "App config", "mimeType": "application/json"},
                {"uri": "broken://resource", "name": "Broken"},
                // Template metadata overrides what the list handler returned
                {
                    "uri": "users://1/profile",
                    "name": "Alice",
                    "mimeType": "text/plain",
                    "description": "A user's profile"
                },
                {
                    "uri": "users://2/profile",
                    "name": "Bob",
                    "description": "A user's profile",
                    "mimeType": "text/plain"
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_list_resources_handler_failure() {
    let template = RegisteredTemplate::new(
        ResourceTemplate::new("record", "db://{table}/{id}"),
        template_fn(|uri, _vars, _ctx| async move { Ok(ResourceContents::text(uri, "")) }),
    )
    .unwrap()
    .with_list_handler(list_fn(|_ctx| async {
        Err::<Vec<Resource>, _>(ResourceError::Execution("db down".into()))
    }));
    let mut server = MCPServiceBuilder::new("Records", "")
        .with_resource_template(template)
        .unwrap()
        .build();

    let error = expect_error(call_server(&mut server, "resources/list", json!({})).await);
    assert_eq!(error.code, ErrorCode::InternalError);
    assert_eq!(error.message, "db down");
}

#[tokio::test]
async fn test_list_resource_templates() {
    let mut server = init_resource_server();

    let result = expect_success(
        call_server(&mut server, "resources/templates/list", json!({})).await,
    );
    assert_eq!(
        result,
        json!({
            "resourceTemplates": [
                {
                    "uriTemplate": "users://{userId}/profile",
                    "name": "user_profile",
                    "description": "A user's profile",
                    "mimeType": "text/plain"
                },
                {"uriTemplate": "users://{userId}/{section}", "name": "user_section"},
                {"uriTemplate": "files://{name}", "name": "file"}
            ]
        })
    );
}

// Reading resources
// Spec: https://spec.modelcontextprotocol.io/specification/2024-11-05/server/resources/#reading-resources
#[tokio::test]
async fn test_read_fixed_resource() {
    let mut server = init_resource_server();

    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "config://app"})).await,
    );
    assert_eq!(
        result,
        json!({
            "contents": [{
                "uri": "config://app",
                "mimeType": "application/json",
                "text": "{\"theme\":\"dark\"}"
            }]
        })
    );
}

#[tokio::test]
async fn test_read_templated_resource() {
    let mut server = init_resource_server();

    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "users://42/profile"})).await,
    );
    assert_eq!(
        result,
        json!({"contents": [{"uri": "users://42/profile", "text": "Profile of user 42"}]})
    );

    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "files://logo.png"})).await,
    );
    assert_eq!(
        result,
        json!({
            "contents": [{
                "uri": "files://logo.png",
                "mimeType": "application/octet-stream",
                "blob": "AAEC"
            }]
        })
    );
}

#[tokio::test]
async fn test_first_matching_template_wins() {
    let mut server = init_resource_server();

    // Both templates match; the one registered first is used
    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "users://7/profile"})).await,
    );
    assert_eq!(result["contents"][0]["text"], "Profile of user 7");

    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "users://7/settings"})).await,
    );
    assert_eq!(result["contents"][0]["text"], "Section settings");
}

#[tokio::test]
async fn test_templates_match_uris_that_are_not_urls() {
    let template = RegisteredTemplate::new(
        ResourceTemplate::new("note", "notes/{id}"),
        template_fn(|uri, vars, _ctx| async move {
            let id = vars.get("id").cloned().unwrap_or_default();
            Ok(ResourceContents::text(uri, format!("Note {}", id)))
        }),
    )
    .unwrap();
    let mut server = MCPServiceBuilder::new("Notes", "")
        .with_resource_template(template)
        .unwrap()
        .build();

    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "notes/1"})).await,
    );
    assert_eq!(result["contents"][0]["text"], "Note 1");

    // No template match and not a URL either
    let error = expect_error(
        call_server(&mut server, "resources/read", json!({"uri": "notes/1/2"})).await,
    );
    assert_eq!(error.message, "Invalid URI: notes/1/2");

    // Segments that wouldn't survive URL parsing still reach the template
    let mut server = init_resource_server();
    let result = expect_success(
        call_server(&mut server, "resources/read", json!({"uri": "users://a b/profile"})).await,
    );
    assert_eq!(result["contents"][0]["text"], "Profile of user a b");
}

#[tokio::test]
async fn test_read_unknown_resource() {
    let mut server = init_resource_server();

    let error = expect_error(
        call_server(&mut server, "resources/read", json!({"uri": "unknown://thing"})).await,
    );
    assert_eq!(error.code, ErrorCode::InvalidParams);
    assert_eq!(error.message, "Resource not found: unknown://thing");

    // Placeholders never span a path separator
    let error = expect_error(
        call_server(
            &mut server,
            "resources/read",
            json!({"uri": "users://7/profile/extra"}),
        )
        .await,
    );
    assert_eq!(error.message, "Resource not found: users://7/profile/extra");
}

#[tokio::test]
async fn test_read_invalid_uri() {
    let mut server = init_resource_server();

    let error = expect_error(
        call_server(&mut server, "resources/read", json!({"uri": "not a uri"})).await,
    );
    assert_eq!(error.code, ErrorCode::InvalidParams);
    assert_eq!(error.message, "Invalid URI: not a uri");

    let error = expect_error(call_server(&mut server, "resources/read", json!({})).await);
    assert_eq!(error.code, ErrorCode::InvalidParams);
    assert_eq!(error.message, "Missing required parameter: uri");
}

#[tokio::test]
async fn test_read_resource_handler_errors() {
    let mut server = init_resource_server();

    // Not found is the client's problem
    let error = expect_error(
        call_server(&mut server, "resources/read", json!({"uri": "users://404/profile"})).await,
    );
    assert_eq!(error.code, ErrorCode::InvalidParams);
    assert_eq!(error.code.code(), -32602);

    // Anything else is the server's
    let error = expect_error(
        call_server(&mut server, "resources/read", json!({"uri": "broken://resource"})).await,
    );
    assert_eq!(error.code, ErrorCode::InternalError);
    assert_eq!(error.message, "disk unavailable");
}

// Completion
// Spec: https://spec.modelcontextprotocol.io/specification/2024-11-05/server/utilities/completion/
#[tokio::test]
async fn test_complete_template_variable() {
    let mut server = init_resource_server();

    let result = expect_success(
        call_server(
            &mut server,
            "completion/complete",
            json!({
                "ref": {"type": "ref/resource", "uri": "users://{userId}/profile"},
                "argument": {"name": "userId", "value": "1"}
            }),
        )
        .await,
    );
    assert_eq!(
        result,
        json!({"completion": {"values": ["1", "10"], "total": 2, "hasMore": false}})
    );

    // Template without a completion handler
    let result = expect_success(
        call_server(
            &mut server,
            "completion/complete",
            json!({
                "ref": {"type": "ref/resource", "uri": "files://{name}"},
                "argument": {"name": "name", "value": "lo"}
            }),
        )
        .await,
    );
    assert_eq!(result["completion"]["values"], json!([]));
}

#[tokio::test]
async fn test_complete_errors() {
    let mut server = init_resource_server();

    let error = expect_error(
        call_server(
            &mut server,
            "completion/complete",
            json!({
                "ref": {"type": "ref/resource", "uri": "users://{id}"},
                "argument": {"name": "id", "value": ""}
            }),
        )
        .await,
    );
    assert_eq!(error.code, ErrorCode::InvalidParams);
    assert_eq!(error.message, "Resource template users://{id} not found");

    let error = expect_error(
        call_server(
            &mut server,
            "completion/complete",
            json!({"argument": {"name": "userId", "value": ""}}),
        )
        .await,
    );
    assert_eq!(error.message, "Missing required parameter: ref");

    let error = expect_error(
        call_server(
            &mut server,
            "completion/complete",
            json!({"ref": {"type": "ref/resource", "uri": "users://{userId}/profile"}}),
        )
        .await,
    );
    assert_eq!(error.message, "Missing required parameter: argument");
}

#[test]
fn test_invalid_template_rejected() {
    let result = RegisteredTemplate::new(
        ResourceTemplate::new("broken", "files://{name"),
        template_fn(|uri, _vars, _ctx| async move { Ok(ResourceContents::text(uri, "")) }),
    );
    assert!(matches!(result, Err(RegistryError::InvalidTemplate { .. })));
}
