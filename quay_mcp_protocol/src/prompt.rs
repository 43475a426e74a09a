use crate::content::{Content, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A prompt template the server offers, as shown in `prompts/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Omitted entirely when the prompt takes no arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

impl Prompt {
    pub fn new(name: impl Into<String>) -> Self {
        Prompt {
            name: name.into(),
            description: None,
            arguments: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare an argument. Declaration order is the order clients see; redeclaring a name
    /// replaces the earlier declaration in place.
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        let arguments = self.arguments.get_or_insert_with(Vec::new);
        match arguments.iter_mut().find(|a| a.name == argument.name) {
            Some(existing) => *existing = argument,
            None => arguments.push(argument),
        }
        self
    }

    /// Declared arguments, in declaration order.
    pub fn arguments(&self) -> &[PromptArgument] {
        self.arguments.as_deref().unwrap_or_default()
    }
}

/// An argument a prompt accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only ever serialised as `true`; optional arguments leave the field out.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl PromptArgument {
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        PromptArgument {
            name: name.into(),
            description: Some(description.into()),
            required: false,
        }
    }

    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        PromptArgument {
            required: true,
            ..Self::optional(name, description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: Content,
}

impl PromptMessage {
    pub fn new_text(role: Role, text: impl Into<String>) -> Self {
        PromptMessage {
            role,
            content: Content::text(text),
        }
    }
}

/// Errors raised by a prompt handler. Unlike tool errors these always surface as a JSON-RPC
/// internal error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromptError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Internal(String),
}
