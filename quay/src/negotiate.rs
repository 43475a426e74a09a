use quay_mcp_protocol::messages::{
    Capabilities, Implementation, InitializeParams, InitializeResult,
};
use serde_json::json;

pub const LATEST_PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol versions this server can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[LATEST_PROTOCOL_VERSION, "2024-10-07"];

/// Pick the protocol version to answer with. Unknown or missing versions are not an error: the
/// server answers with the latest version and leaves it to the client to disconnect.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|requested| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .find(|&&supported| supported == requested)
                .copied()
        })
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Builds the capability declarations advertised at initialization.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    capabilities: Capabilities,
}

impl CapabilitiesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, subscribe: bool, list_changed: bool) -> Self {
        self.capabilities.insert(
            "resources".into(),
            json!({ "subscribe": subscribe, "listChanged": list_changed }),
        );
        self
    }

    pub fn with_tools(mut self, list_changed: bool) -> Self {
        self.capabilities
            .insert("tools".into(), json!({ "listChanged": list_changed }));
        self
    }

    pub fn with_prompts(mut self, list_changed: bool) -> Self {
        self.capabilities
            .insert("prompts".into(), json!({ "listChanged": list_changed }));
        self
    }

    pub fn build(self) -> Capabilities {
        self.capabilities
    }
}

/// Answers `initialize`. Holds the server's identity and the capabilities it advertises.
#[derive(Debug, Clone)]
pub struct Negotiator {
    server_info: Implementation,
    instructions: Option<String>,
    capabilities: Capabilities,
}

impl Negotiator {
    /// Empty instructions are treated as none.
    pub fn new(
        server_info: Implementation,
        instructions: Option<String>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            server_info,
            instructions: instructions.filter(|s| !s.is_empty()),
            capabilities,
        }
    }

    /// Client info and capabilities are accepted but not validated or retained.
    pub fn initialize(&self, params: &InitializeParams) -> InitializeResult {
        InitializeResult {
            protocol_version: negotiate_version(params.protocol_version.as_deref()).to_string(),
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        }
    }

    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}
