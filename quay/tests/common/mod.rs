use quay::{
    context::CallContext,
    generate_tool_schema,
    handler::{
        completion_fn, list_fn, prompt_fn, resource_fn, template_fn, tool_fn, typed_tool_fn,
    },
    MCPService, MCPServiceBuilder, PromptError, RegisteredPrompt, RegisteredTemplate,
    ResourceError, ToolError,
};
use quay_mcp_protocol::{
    content::Role,
    jsonrpc::{ErrorData, MethodCall, Params, RequestId, ResponseItem, SendableMessage},
    prompt::{Prompt, PromptArgument, PromptMessage},
    resource::{Resource, ResourceContents, ResourceTemplate},
    tool::Tool,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tower::Service;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness. Set `RUST_LOG` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn call_server(
    server: &mut MCPService,
    method: &str,
    params: serde_json::Value,
) -> Option<ResponseItem> {
    let params = match params {
        serde_json::Value::Object(map) => Some(Params::Map(map)),
        serde_json::Value::Array(array) => Some(Params::Array(array)),
        _ => None,
    };

    let request = MethodCall::new(RequestId::Num(1), method, params);
    server.call(SendableMessage::from(request)).await.unwrap()
}

/// The `result` of a success response, after checking the id was echoed.
pub fn expect_success(response: Option<ResponseItem>) -> Value {
    match response {
        Some(ResponseItem::Success { id, result, .. }) => {
            assert_eq!(id, RequestId::Num(1));
            result
        }
        other => panic!("Expected success response, got {:?}", other),
    }
}

pub fn expect_error(response: Option<ResponseItem>) -> ErrorData {
    match response {
        Some(ResponseItem::Error { id, error, .. }) => {
            assert_eq!(id, RequestId::Num(1));
            error
        }
        other => panic!("Expected error response, got {:?}", other),
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct CalculatorParameters {
    /// First number in the calculation
    pub x: i32,
    /// Second number in the calculation
    pub y: i32,
    /// The operation to perform (add, subtract, multiply, divide)
    pub operation: String,
}

async fn calculator(params: CalculatorParameters) -> Result<i32, ToolError> {
    match params.operation.as_str() {
        "add" => Ok(params.x + params.y),
        "subtract" => Ok(params.x - params.y),
        "multiply" => Ok(params.x * params.y),
        "divide" if params.y == 0 => Err(ToolError::execution("Division by zero")),
        "divide" => Ok(params.x / params.y),
        op => Err(ToolError::InvalidArguments(format!(
            "Unknown operation: {}",
            op
        ))),
    }
}

#[derive(Deserialize)]
pub struct AddParameters {
    pub a: i64,
    pub b: i64,
}

/// Identifies the caller; attached to the call context by the test, read back by `whoami`.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

fn explode() -> String {
    panic!("tool exploded")
}

pub fn init_tool_server_simple() -> MCPService {
    init_tracing();

    MCPServiceBuilder::new("Calculator", "Basic arithmetic")
        .with_tool(
            Tool::new("calculator")
                .with_description("Perform basic arithmetic operations")
                .with_input_schema(generate_tool_schema::<CalculatorParameters>().unwrap()),
            typed_tool_fn(|params: CalculatorParameters, _ctx| calculator(params)),
        )
        .unwrap()
        .with_tool(
            Tool::new("add").with_description("Add two integers"),
            typed_tool_fn(|AddParameters { a, b }, _ctx| async move { a + b }),
        )
        .unwrap()
        .with_tool(
            Tool::new("fail"),
            tool_fn(|_args, _ctx| async {
                Err::<String, _>(ToolError::execution("Something went wrong"))
            }),
        )
        .unwrap()
        .with_tool(Tool::new("explode"), tool_fn(|_args, _ctx| async { explode() }))
        .unwrap()
        .with_tool(
            Tool::new("whoami"),
            tool_fn(|_args, ctx: CallContext| async move {
                ctx.get::<Caller>()
                    .map(|caller| caller.0.clone())
                    .unwrap_or_else(|| "anonymous".to_string())
            }),
        )
        .unwrap()
        .build()
}

pub fn init_prompt_server() -> MCPService {
    init_tracing();

    let summarise = RegisteredPrompt::new(
        Prompt::new("summarise_text")
            .with_description("Generates a prompt for summarising text")
            .with_argument(PromptArgument::required("text", "The text to summarise"))
            .with_argument(PromptArgument::optional(
                "format",
                "Optional format for the summary (e.g., 'bullet points', 'paragraph')",
            )),
        prompt_fn(|args, _ctx| async move {
            let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
            let format = args
                .get("format")
                .and_then(Value::as_str)
                .unwrap_or("paragraph");
            Ok(vec![
                PromptMessage::new_text(Role::User, format!("Summarise as {}:", format)),
                PromptMessage::new_text(Role::User, text),
            ])
        }),
    )
    .with_completion(
        "format",
        completion_fn(|value, _ctx| async move {
            Ok(["bullet points", "paragraph"]
                .iter()
                .filter(|format| format.starts_with(value.as_str()))
                .map(|format| format.to_string())
                .collect::<Vec<_>>())
        }),
    );

    MCPServiceBuilder::new("Prompts", "")
        .with_prompt(
            Prompt::new("review_code")
                .with_description("Generates a code review prompt for the provided code")
                .with_argument(PromptArgument::required("code", "The code to review")),
            prompt_fn(|args, _ctx| async move {
                let code = args.get("code").and_then(Value::as_str).unwrap_or_default();
                Ok(format!("Please review the following code:\n\n{}", code))
            }),
        )
        .unwrap()
        .with_registered_prompt(summarise)
        .unwrap()
        .with_prompt(
            Prompt::new("broken"),
            prompt_fn(|_args, _ctx| async {
                Err::<String, _>(PromptError::Internal("template missing".into()))
            }),
        )
        .unwrap()
        .build()
}

pub fn init_resource_server() -> MCPService {
    init_tracing();

    let profiles = RegisteredTemplate::new(
        ResourceTemplate::new("user_profile", "users://{userId}/profile")
            .with_description("A user's profile")
            .with_mime_type("text/plain"),
        template_fn(|uri, vars, _ctx| async move {
            let id = vars.get("userId").cloned().unwrap_or_default();
            if id == "404" {
                return Err(ResourceError::NotFound(uri));
            }
            Ok(ResourceContents::text(uri, format!("Profile of user {}", id)))
        }),
    )
    .unwrap()
    .with_list_handler(list_fn(|_ctx| async {
        Ok(vec![
            Resource::new("users://1/profile", "Alice").with_mime_type("text/html"),
            Resource::new("users://2/profile", "Bob"),
        ])
    }))
    .with_completion(
        "userId",
        completion_fn(|value, _ctx| async move {
            Ok(["1", "2", "10", "20"]
                .iter()
                .filter(|id| id.starts_with(value.as_str()))
                .map(|id| id.to_string())
                .collect::<Vec<_>>())
        }),
    );

    let sections = RegisteredTemplate::new(
        ResourceTemplate::new("user_section", "users://{userId}/{section}"),
        template_fn(|uri, vars, _ctx| async move {
            let section = vars.get("section").cloned().unwrap_or_default();
            Ok(ResourceContents::text(uri, format!("Section {}", section)))
        }),
    )
    .unwrap();

    let files = RegisteredTemplate::new(
        ResourceTemplate::new("file", "files://{name}"),
        template_fn(|uri, _vars, _ctx| async move {
            Ok(ResourceContents::blob(
                uri,
                "application/octet-stream",
                &[0, 1, 2],
            ))
        }),
    )
    .unwrap();

    MCPServiceBuilder::new("Profiles", "Look up user profiles")
        .with_resource(
            Resource::new("config://app", "App config").with_mime_type("application/json"),
            resource_fn(|uri, _ctx| async move {
                Ok(ResourceContents::text(uri, r#"{"theme":"dark"}"#)
                    .with_mime_type("application/json"))
            }),
        )
        .unwrap()
        .with_resource(
            Resource::new("broken://resource", "Broken"),
            resource_fn(|_uri, _ctx| async {
                Err::<ResourceContents, _>(ResourceError::Execution("disk unavailable".into()))
            }),
        )
        .unwrap()
        .with_resource_template(profiles)
        .unwrap()
        .with_resource_template(sections)
        .unwrap()
        .with_resource_template(files)
        .unwrap()
        .build()
}
