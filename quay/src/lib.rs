//! quay is the server core for the [Model Context Protocol][mcp-spec] (MCP): ordered capability
//! registries, URI template resolution, protocol negotiation, and a JSON-RPC dispatcher.
//!
//! # Example
//!
//! ```rust,no_run
//! use quay::{handler::tool_fn, serve, transport, MCPServiceBuilder, ServiceExt};
//! use quay_mcp_protocol::tool::Tool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MCPServiceBuilder::new("Hello World", "A server with a 'hello world' tool")
//!         .with_tool(
//!             Tool::new("hello_world").with_description("Say hello"),
//!             tool_fn(|_args, _ctx| async { "Hello World" }),
//!         )?
//!         .build();
//!
//!     serve(service.into_request_service(), transport::stdio()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Capabilities
//!
//! Four kinds of capability can be registered on an [`MCPServiceBuilder`]:
//!
//! * **resources**, read-only data at a fixed URI;
//! * **resource templates**, families of resources described by a URI template such as
//!   `users://{userId}/profile`. A template can also enumerate concrete resources for
//!   `resources/list` and offer completions for its variables;
//! * **tools**, functions the client can call;
//! * **prompts**, parametrised message templates.
//!
//! Each registry is keyed (resources by URI, everything else by name) and keeps registration
//! order. Registering a key twice is a [`RegistryError`](errors::RegistryError) at startup.
//! Once [`build`](MCPServiceBuilder::build) is called the registries are frozen.
//!
//! Handlers implement one trait per category (see [`handler`]). The `*_fn` adapters turn async
//! closures into handlers.
//!
//! # Error handling
//!
//! MCP distinguishes protocol errors from tool failures. A request that can't be serviced
//! (unknown method, missing parameter, unknown tool) is answered with a JSON-RPC error; see
//! [`RequestError`](errors::RequestError). A tool that runs and fails, returning `Err` or even
//! panicking, is answered with a successful result flagged with `isError`, so the model can see
//! what went wrong. Prompt and resource handler failures are JSON-RPC errors.
//!
//! # Per-call context
//!
//! Transports can attach data such as the authenticated caller to a
//! [`CallContext`](context::CallContext) and bind it with [`MCPService::with_call_context`].
//! Every handler receives it.
//!
//! # Middleware and layers
//!
//! [`MCPService`] is a [`tower::Service`], so anything from the [`tower`] ecosystem can wrap it.
//! [`middleware::tracing::TracingLayer`] puts each message in a tracing span.
//!
//! # Logging
//!
//! quay uses `tracing` throughout. When serving over stdio, stdout carries the protocol, so
//! send logs elsewhere, e.g. to a file with `tracing-appender`.
//!
//! [mcp-spec]: https://spec.modelcontextprotocol.io/specification/2024-11-05/
//! [tower]: https://github.com/tokio-rs/tower

pub mod config;
pub mod context;
pub mod errors;
pub mod handler;
pub mod middleware;
pub mod negotiate;
pub mod registry;
mod request_service;
pub mod response;
mod serve;
mod service;
mod service_ext;
pub mod transport;
pub mod uri_template;

pub use config::ServerConfig;
pub use handler::{PromptHandler, ResourceHandler, ResourceTemplateHandler, ToolHandler};
pub use registry::{RegisteredPrompt, RegisteredTemplate};
pub use request_service::MCPRequestService;
pub use serve::{serve, MAX_LINE_LENGTH};
pub use service::{MCPService, MCPServiceBuilder, MAX_COMPLETION_VALUES};
pub use service_ext::ServiceExt;

// re-export certain MCP protocol types
pub use quay_mcp_protocol::{
    messages::CallToolResult, prompt::PromptArgument, prompt::PromptError, resource::ResourceError,
    tool::generate_tool_schema, tool::ToolError,
};
