// JSON-RPC 2.0 envelopes as used by MCP.
//
// Messages are assumed to flow client -> server. The server never originates requests, so there
// is no response *parsing* beyond what tests need.
use serde::{de, Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single inbound JSON-RPC message, classified at ingress.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SendableMessage {
    /// Carries a non-null `id` and expects exactly one response.
    Request(MethodCall),
    /// Has no `id` (or a null one). Never answered.
    Notification(Notification),
    /// Structurally not a JSON-RPC 2.0 message. The id is kept when it could be recovered, so the
    /// error response can be correlated by the client.
    Invalid { id: RequestId },
}

impl SendableMessage {
    /// Method name, if the message had a valid one.
    pub fn method(&self) -> Option<&str> {
        match self {
            SendableMessage::Request(call) => Some(&call.method),
            SendableMessage::Notification(notification) => Some(&notification.method),
            SendableMessage::Invalid { .. } => None,
        }
    }

    /// Parameters, if any were sent.
    pub fn params(&self) -> Option<&Params> {
        match self {
            SendableMessage::Request(call) => call.params.as_ref(),
            SendableMessage::Notification(notification) => notification.params.as_ref(),
            SendableMessage::Invalid { .. } => None,
        }
    }
}

impl From<MethodCall> for SendableMessage {
    fn from(request: MethodCall) -> Self {
        SendableMessage::Request(request)
    }
}

impl From<Notification> for SendableMessage {
    fn from(notification: Notification) -> Self {
        SendableMessage::Notification(notification)
    }
}

/// Classify a decoded JSON value. Never fails: anything that isn't a well-formed request or
/// notification becomes `Invalid`.
fn classify(value: Value) -> SendableMessage {
    let Value::Object(mut obj) = value else {
        return SendableMessage::Invalid { id: RequestId::Null };
    };

    // A present-but-null id is indistinguishable from an absent one for our purposes.
    let id = match obj.remove("id") {
        None | Some(Value::Null) => None,
        Some(raw) => match RequestId::deserialize(&raw) {
            Ok(id) => Some(id),
            Err(_) => return SendableMessage::Invalid { id: RequestId::Null },
        },
    };
    let invalid = || SendableMessage::Invalid {
        id: id.clone().unwrap_or(RequestId::Null),
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return invalid();
    }
    let method = match obj.remove("method") {
        Some(Value::String(method)) => method,
        _ => return invalid(),
    };
    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(raw) => match Params::try_from(raw) {
            Ok(params) => Some(params),
            Err(_) => return invalid(),
        },
    };

    match id {
        Some(id) => SendableMessage::Request(MethodCall::new(id, method, params)),
        None => SendableMessage::Notification(Notification::new(method, params)),
    }
}

impl<'de> Deserialize<'de> for SendableMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(classify(value))
    }
}

/// What arrives over the transport: one message, or a JSON-RPC batch.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Request {
    Single(SendableMessage),
    Batch(Vec<SendableMessage>),
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Request::Batch(items.into_iter().map(classify).collect())),
            other => Ok(Request::Single(classify(other))),
        }
    }
}

/// What goes back over the transport.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Response {
    /// `None` for notifications: nothing is written.
    Single(Option<ResponseItem>),
    Batch(Vec<ResponseItem>),
}

impl Response {
    pub fn is_empty(&self) -> bool {
        match self {
            Response::Single(item) => item.is_none(),
            Response::Batch(items) => items.is_empty(),
        }
    }
}

/// Request id. MCP restricts ids to strings and integers; `Null` only appears in error
/// responses to messages whose id could not be determined.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Num(i64),
    Str(String),
    Null,
}

impl RequestId {
    #[inline]
    pub const fn null() -> Self {
        RequestId::Null
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, RequestId::Null)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Num(n) => write!(f, "{}", n),
            RequestId::Str(s) => write!(f, "{}", s),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// The `jsonrpc` member. Only "2.0" is accepted.
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JsonRpcVersion {
    V2,
}

impl TryFrom<String> for JsonRpcVersion {
    type Error = de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "2.0" {
            Ok(JsonRpcVersion::V2)
        } else {
            Err(de::Error::custom("not a valid JSON-RPC 2.0 message"))
        }
    }
}

impl From<JsonRpcVersion> for String {
    fn from(_: JsonRpcVersion) -> Self {
        "2.0".to_string()
    }
}

/// Structured parameters. MCP only ever uses the by-name form, but by-position is legal
/// JSON-RPC and has to be representable so it can be rejected with a proper error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Params {
    Array(Vec<Value>),
    Map(Map<String, Value>),
}

impl TryFrom<Value> for Params {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(Params::Array(items)),
            Value::Object(map) => Ok(Params::Map(map)),
            other => Err(de::Error::custom(format!(
                "JSON-RPC params must be either an array or object, got {}",
                other
            ))),
        }
    }
}

/// A JSON-RPC request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MethodCall {
    jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl MethodCall {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2,
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2,
            method: method.into(),
            params,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ResponseItem {
    Success {
        jsonrpc: JsonRpcVersion,
        id: RequestId,
        result: Value,
    },
    Error {
        jsonrpc: JsonRpcVersion,
        id: RequestId,
        error: ErrorData,
    },
}

impl ResponseItem {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success {
            jsonrpc: JsonRpcVersion::V2,
            id,
            result,
        }
    }

    pub fn error(id: RequestId, error: ErrorData) -> Self {
        Self::Error {
            jsonrpc: JsonRpcVersion::V2,
            id,
            error,
        }
    }

    pub fn id(&self) -> &RequestId {
        match self {
            Self::Success { id, .. } | Self::Error { id, .. } => id,
        }
    }
}

/// Standard JSON-RPC error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist / is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// Anything else. Never produced by this crate, only accepted when decoding.
    Custom(i32),
}

impl ErrorCode {
    pub const fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::Custom(code) => *code,
        }
    }

    pub const fn from_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            other => Self::Custom(other),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i32::deserialize(deserializer).map(Self::from_code)
    }
}

/// The `error` member of a JSON-RPC error response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorData {
    pub code: ErrorCode,

    /// Should be limited to a concise single sentence.
    pub message: String,

    /// Structured detail, defined by the sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
