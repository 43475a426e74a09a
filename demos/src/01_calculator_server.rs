use anyhow::Result;
use quay::{
    generate_tool_schema,
    handler::{tool_fn, typed_tool_fn},
    middleware::tracing::TracingLayer,
    serve, transport, MCPServiceBuilder, ServiceExt, ToolError,
};
use quay_mcp_protocol::tool::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use tower::Layer;
use tracing_subscriber::{self, EnvFilter};

#[derive(Deserialize, JsonSchema)]
struct CalculatorParameters {
    /// First number in the calculation
    x: i32,
    /// Second number in the calculation
    y: i32,
    /// The operation to perform (add, subtract, multiply, divide)
    operation: String,
}

async fn calculator(params: CalculatorParameters) -> Result<i32, ToolError> {
    let CalculatorParameters { x, y, operation } = params;
    match operation.as_str() {
        "add" => Ok(x + y),
        "subtract" => Ok(x - y),
        "multiply" => Ok(x * y),
        "divide" => {
            if y == 0 {
                Err(ToolError::execution("Division by zero"))
            } else {
                Ok(x / y)
            }
        }
        _ => Err(ToolError::InvalidArguments(format!(
            "Unknown operation: {}",
            operation
        ))),
    }
}

#[derive(Deserialize, JsonSchema)]
struct AddParameters {
    /// First addend
    a: i64,
    /// Second addend
    b: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging. stdout carries the protocol, so logs go to a file.
    let log_dir = tempfile::tempdir()?;
    let file_appender = tracing_appender::rolling::daily(log_dir.path(), "server.log");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(file_appender)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Shared by the counter tools
    let counter = Arc::new(AtomicI64::new(0));
    let incremented = counter.clone();

    let service = MCPServiceBuilder::new(
        "Calculator",
        "This server provides a `calculator` tool that can perform basic arithmetic operations, \
         and a counter that persists between calls.",
    )
    .with_tool(
        Tool::new("calculator")
            .with_description("Perform basic arithmetic operations")
            .with_input_schema(generate_tool_schema::<CalculatorParameters>()?),
        typed_tool_fn(|params: CalculatorParameters, _ctx| calculator(params)),
    )?
    .with_tool(
        Tool::new("add")
            .with_description("Add two integers")
            .with_input_schema(generate_tool_schema::<AddParameters>()?),
        typed_tool_fn(|AddParameters { a, b }, _ctx| async move { a + b }),
    )?
    .with_tool(
        Tool::new("increment").with_description("Increment the counter and return its new value"),
        tool_fn(move |_args, _ctx| {
            let counter = incremented.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 }
        }),
    )?
    .with_tool(
        Tool::new("get_value").with_description("Current value of the counter"),
        tool_fn(move |_args, _ctx| {
            let counter = counter.clone();
            async move { counter.load(Ordering::SeqCst) }
        }),
    )?
    .build();

    tracing::info!(
        "Starting server over stdin. Logging to {}",
        log_dir.path().display()
    );

    let service = TracingLayer::new().layer(service);
    serve(service.into_request_service(), transport::stdio()).await?;

    Ok(())
}
