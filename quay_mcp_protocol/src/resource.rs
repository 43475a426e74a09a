use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Open-ended descriptor fields: `description`, `mimeType`, and any extension a server wants to
/// advertise. Key order is preserved on the wire.
pub type Metadata = Map<String, Value>;

/// Copy `extra` into `target`, overriding existing keys, but never touching the `reserved` keys
/// which are typed fields on the descriptor itself.
fn merge_into(target: &mut Metadata, extra: &Metadata, reserved: &[&str]) {
    for (key, value) in extra {
        if !reserved.contains(&key.as_str()) {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// A concrete resource the server can read, as shown in `resources/list`.
///
/// Metadata is flattened into the descriptor, so `{"uri", "name", "description", ...}` is what
/// the client sees.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl Resource {
    const RESERVED: &'static [&'static str] = &["uri", "name"];

    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_meta("description", Value::String(description.into()))
    }

    pub fn with_mime_type(self, mime_type: impl Into<String>) -> Self {
        self.with_meta("mimeType", Value::String(mime_type.into()))
    }

    /// Attach an arbitrary metadata field. `uri` and `name` are ignored here; use the typed
    /// fields instead.
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !Self::RESERVED.contains(&key.as_str()) {
            self.metadata.insert(key, value);
        }
        self
    }

    /// Merge `extra` over this resource's metadata. Later keys win.
    pub fn merge_metadata(&mut self, extra: &Metadata) {
        merge_into(&mut self.metadata, extra, Self::RESERVED);
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.metadata.get("mimeType").and_then(Value::as_str)
    }
}

/// A parametrised family of resources, as shown in `resources/templates/list`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: String,
    pub name: String,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl ResourceTemplate {
    const RESERVED: &'static [&'static str] = &["uriTemplate", "name"];

    pub fn new(name: impl Into<String>, uri_template: impl Into<String>) -> Self {
        Self {
            uri_template: uri_template.into(),
            name: name.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_meta("description", Value::String(description.into()))
    }

    pub fn with_mime_type(self, mime_type: impl Into<String>) -> Self {
        self.with_meta("mimeType", Value::String(mime_type.into()))
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !Self::RESERVED.contains(&key.as_str()) {
            self.metadata.insert(key, value);
        }
        self
    }
}

/// The contents of a resource, as returned by `resources/read`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ResourceContents {
    /// UTF-8 text: source code, config, JSON, plain text.
    #[serde(rename_all = "camelCase")]
    Text {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        text: String,
    },
    /// Binary data, base64 encoded.
    #[serde(rename_all = "camelCase")]
    Blob {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        blob: String,
    },
}

impl ResourceContents {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        ResourceContents::Text {
            uri: uri.into(),
            mime_type: None,
            text: text.into(),
        }
    }

    /// Binary contents. `bytes` are base64 encoded here, handlers pass raw data.
    pub fn blob(uri: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        ResourceContents::Blob {
            uri: uri.into(),
            mime_type: Some(mime_type.into()),
            blob: STANDARD.encode(bytes),
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        match &mut self {
            ResourceContents::Text { mime_type, .. } | ResourceContents::Blob { mime_type, .. } => {
                *mime_type = Some(mime.into())
            }
        }
        self
    }

    pub fn uri(&self) -> &str {
        match self {
            ResourceContents::Text { uri, .. } | ResourceContents::Blob { uri, .. } => uri,
        }
    }
}

/// Errors raised by resource read and list handlers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    #[error("{0}")]
    Execution(String),
}
