use quay_mcp_protocol::{
    jsonrpc::{ErrorCode, ErrorData},
    resource::ResourceError,
};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The closed set of protocol-level failures. Each kind has a fixed JSON-RPC code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed JSON. Only the transport raises this.
    ParseError,
    /// Not a valid JSON-RPC 2.0 envelope.
    InvalidRequest,
    MethodNotFound,
    /// Missing parameter, unknown resource/tool/prompt, unparseable URI.
    InvalidParams,
    /// Anything else that went wrong while servicing a request.
    InternalError,
}

impl ErrorKind {
    pub const fn code(self) -> ErrorCode {
        match self {
            ErrorKind::ParseError => ErrorCode::ParseError,
            ErrorKind::InvalidRequest => ErrorCode::InvalidRequest,
            ErrorKind::MethodNotFound => ErrorCode::MethodNotFound,
            ErrorKind::InvalidParams => ErrorCode::InvalidParams,
            ErrorKind::InternalError => ErrorCode::InternalError,
        }
    }
}

/// An error raised while *processing* a request, to be returned as a JSON-RPC error object.
///
/// Tool handler failures are deliberately not represented here: they are reported inside a
/// successful `CallToolResult` with `isError` set.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    pub fn missing_param(name: &str) -> Self {
        Self::invalid_params(format!("Missing required parameter: {}", name))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }
}

impl From<RequestError> for ErrorData {
    fn from(err: RequestError) -> Self {
        ErrorData {
            code: err.kind.code(),
            message: err.message,
            data: err.data,
        }
    }
}

/// Resource handlers can signal "not found" themselves; that stays a parameter error. Any other
/// failure is internal.
impl From<ResourceError> for RequestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound(_) | ResourceError::InvalidUri(_) => {
                RequestError::invalid_params(err.to_string())
            }
            ResourceError::Execution(_) => RequestError::internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::internal(format!("JSON serialization error: {}", err))
    }
}

/// Which registry a registration went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Resource,
    ResourceTemplate,
    Tool,
    Prompt,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapabilityKind::Resource => "Resource",
            CapabilityKind::ResourceTemplate => "Resource template",
            CapabilityKind::Tool => "Tool",
            CapabilityKind::Prompt => "Prompt",
        })
    }
}

/// Programming errors made while building a service. These are raised at startup and never
/// travel over the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} {key} is already registered")]
    Duplicate { kind: CapabilityKind, key: String },

    #[error("Invalid URI template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },
}
