//! Wire types for the [Model Context Protocol][mcp-spec]: JSON-RPC envelopes, capability
//! descriptors, request parameters and results.
//!
//! [mcp-spec]: https://spec.modelcontextprotocol.io/specification/2024-11-05/

pub mod content;
pub use content::{Annotations, Content, Role, TextContent};
pub mod jsonrpc;
pub mod messages;
pub mod prompt;
pub mod resource;
pub mod tool;
