//! Ordered, uniquely keyed capability stores.
//!
//! Registries are append-only: entries are added while a service is being built and never
//! updated or removed afterwards. Iteration follows registration order, which is the order every
//! listing uses and the precedence order for URI template matching.

use crate::{
    errors::{CapabilityKind, RegistryError},
    handler::{
        CompletionHandler, PromptHandler, ResourceHandler, ResourceListHandler,
        ResourceTemplateHandler, ToolHandler,
    },
    uri_template::UriTemplate,
};
use quay_mcp_protocol::{
    prompt::Prompt,
    resource::{Resource, ResourceTemplate},
    tool::Tool,
};
use std::collections::HashMap;

/// Something that can be stored in a [`Registry`].
pub trait Registrable {
    const KIND: CapabilityKind;

    /// The unique key: the URI for resources, the name for everything else.
    fn key(&self) -> &str;
}

#[derive(Debug)]
pub struct Registry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Registrable> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Fails if its key is already taken; the registry is unchanged in that case.
    pub fn register(&mut self, entry: T) -> Result<(), RegistryError> {
        let key = entry.key().to_string();
        if self.index.contains_key(&key) {
            return Err(RegistryError::Duplicate { kind: T::KIND, key });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Entries in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, T: Registrable> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A fixed resource and its read handler.
pub struct RegisteredResource {
    pub descriptor: Resource,
    pub(crate) handler: Box<dyn ResourceHandler>,
}

impl RegisteredResource {
    pub fn new(descriptor: Resource, handler: impl ResourceHandler) -> Self {
        Self {
            descriptor,
            handler: Box::new(handler),
        }
    }
}

impl Registrable for RegisteredResource {
    const KIND: CapabilityKind = CapabilityKind::Resource;

    fn key(&self) -> &str {
        &self.descriptor.uri
    }
}

/// A resource template with its compiled matcher, read handler, and the optional list and
/// completion handlers.
pub struct RegisteredTemplate {
    pub descriptor: ResourceTemplate,
    pub(crate) matcher: UriTemplate,
    pub(crate) handler: Box<dyn ResourceTemplateHandler>,
    pub(crate) list_handler: Option<Box<dyn ResourceListHandler>>,
    pub(crate) completions: HashMap<String, Box<dyn CompletionHandler>>,
}

impl RegisteredTemplate {
    /// Compile the descriptor's URI template. Fails only if the template can't be turned into a
    /// matcher at all.
    pub fn new(
        descriptor: ResourceTemplate,
        handler: impl ResourceTemplateHandler,
    ) -> Result<Self, RegistryError> {
        let matcher = UriTemplate::parse(&descriptor.uri_template).map_err(|e| {
            RegistryError::InvalidTemplate {
                template: descriptor.uri_template.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            descriptor,
            matcher,
            handler: Box::new(handler),
            list_handler: None,
            completions: HashMap::new(),
        })
    }

    /// Let `resources/list` enumerate concrete resources for this template.
    pub fn with_list_handler(mut self, handler: impl ResourceListHandler) -> Self {
        self.list_handler = Some(Box::new(handler));
        self
    }

    /// Offer completions for one template variable.
    pub fn with_completion(
        mut self,
        variable: impl Into<String>,
        handler: impl CompletionHandler,
    ) -> Self {
        self.completions.insert(variable.into(), Box::new(handler));
        self
    }

    pub fn uri_template(&self) -> &UriTemplate {
        &self.matcher
    }
}

impl Registrable for RegisteredTemplate {
    const KIND: CapabilityKind = CapabilityKind::ResourceTemplate;

    fn key(&self) -> &str {
        &self.descriptor.name
    }
}

pub struct RegisteredTool {
    pub descriptor: Tool,
    pub(crate) handler: Box<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn new(descriptor: Tool, handler: impl ToolHandler) -> Self {
        Self {
            descriptor,
            handler: Box::new(handler),
        }
    }
}

impl Registrable for RegisteredTool {
    const KIND: CapabilityKind = CapabilityKind::Tool;

    fn key(&self) -> &str {
        &self.descriptor.name
    }
}

pub struct RegisteredPrompt {
    pub descriptor: Prompt,
    pub(crate) handler: Box<dyn PromptHandler>,
    pub(crate) completions: HashMap<String, Box<dyn CompletionHandler>>,
}

impl RegisteredPrompt {
    pub fn new(descriptor: Prompt, handler: impl PromptHandler) -> Self {
        Self {
            descriptor,
            handler: Box::new(handler),
            completions: HashMap::new(),
        }
    }

    /// Offer completions for one prompt argument.
    pub fn with_completion(
        mut self,
        argument: impl Into<String>,
        handler: impl CompletionHandler,
    ) -> Self {
        self.completions.insert(argument.into(), Box::new(handler));
        self
    }
}

impl Registrable for RegisteredPrompt {
    const KIND: CapabilityKind = CapabilityKind::Prompt;

    fn key(&self) -> &str {
        &self.descriptor.name
    }
}
