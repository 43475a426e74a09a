use quay_mcp_protocol::messages::{Capabilities, Implementation};
use thiserror::Error;

pub const DEFAULT_SERVER_NAME: &str = "Quay MCP Server";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },
}

/// Static configuration of an MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Identity reported in the `initialize` result.
    pub server_info: Implementation,
    pub instructions: Option<String>,
    /// Advertised as-is when set. When `None`, capabilities are derived from what was
    /// registered.
    pub capabilities: Option<Capabilities>,
    /// Whether handler failures and internal errors are logged at `error` level. Off by default.
    pub log_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_info: Implementation::new(DEFAULT_SERVER_NAME, DEFAULT_SERVER_VERSION),
            instructions: None,
            capabilities: None,
            log_errors: false,
        }
    }
}

impl ServerConfig {
    /// Read configuration from `MCP_SERVER_NAME`, `MCP_SERVER_VERSION`, `MCP_INSTRUCTIONS` and
    /// `MCP_LOG_ERRORS`. Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let mut config = Self::default();

        if let Some(name) = get("MCP_SERVER_NAME") {
            config.server_info.name = name;
        }
        if let Some(version) = get("MCP_SERVER_VERSION") {
            config.server_info.version = version;
        }
        config.instructions = get("MCP_INSTRUCTIONS");
        if let Some(value) = get("MCP_LOG_ERRORS") {
            config.log_errors = parse_bool("MCP_LOG_ERRORS", value)?;
        }

        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.server_info.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.server_info.version = version.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { name, value }),
    }
}
