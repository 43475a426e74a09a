use crate::{
    config::ServerConfig,
    context::CallContext,
    errors::{ErrorKind, RegistryError, RequestError},
    handler::{PromptHandler, ResourceHandler, ToolHandler},
    negotiate::{CapabilitiesBuilder, Negotiator},
    registry::{
        RegisteredPrompt, RegisteredResource, RegisteredTemplate, RegisteredTool, Registry,
    },
};
use futures::{future::BoxFuture, FutureExt};
use quay_mcp_protocol::{
    jsonrpc::{MethodCall, Notification, Params, ResponseItem, SendableMessage},
    messages::{
        CallToolParams, CallToolResult, CancelledParams, CompleteParams, CompleteResult,
        Completion, CompletionReference, GetPromptParams, GetPromptResult, InitializeParams,
        InitializeResult, ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult,
        ListToolsResult, ReadResourceParams, ReadResourceResult,
    },
    prompt::Prompt,
    resource::{Resource, ResourceError},
    tool::Tool,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use std::{
    any::Any,
    convert::Infallible,
    future::Future,
    panic::AssertUnwindSafe,
    sync::Arc,
    task::{Context, Poll},
};
use tower::Service;
use tracing::Instrument;

/// Completion responses carry at most this many values.
pub const MAX_COMPLETION_VALUES: usize = 100;

/// A service that answers MCP messages.
///
/// The `MCPService` handles [`SendableMessage`]s, whatever their origin, and produces at most one
/// [`ResponseItem`] per message. Registries are frozen when the service is built, so the service
/// is cheap to clone and safe to share between tasks: every clone points at the same registries.
#[derive(Clone)]
pub struct MCPService {
    inner: Arc<Inner>,
    ctx: CallContext,
}

struct Inner {
    negotiator: Negotiator,
    log_errors: bool,
    resources: Registry<RegisteredResource>,
    templates: Registry<RegisteredTemplate>,
    tools: Registry<RegisteredTool>,
    prompts: Registry<RegisteredPrompt>,
}

/// Build an [`MCPService`]. Resources, templates, tools and prompts are registered on the
/// builder; they cannot be changed once the service is built.
pub struct MCPServiceBuilder {
    config: ServerConfig,
    resources: Registry<RegisteredResource>,
    templates: Registry<RegisteredTemplate>,
    tools: Registry<RegisteredTool>,
    prompts: Registry<RegisteredPrompt>,
}

impl MCPServiceBuilder {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::from_config(
            ServerConfig::default()
                .with_name(name)
                .with_instructions(instructions),
        )
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            config,
            resources: Registry::new(),
            templates: Registry::new(),
            tools: Registry::new(),
            prompts: Registry::new(),
        }
    }

    pub fn with_resource(
        mut self,
        resource: Resource,
        handler: impl ResourceHandler,
    ) -> Result<Self, RegistryError> {
        self.resources
            .register(RegisteredResource::new(resource, handler))?;
        Ok(self)
    }

    pub fn with_resource_template(
        mut self,
        template: RegisteredTemplate,
    ) -> Result<Self, RegistryError> {
        self.templates.register(template)?;
        Ok(self)
    }

    pub fn with_tool(mut self, tool: Tool, handler: impl ToolHandler) -> Result<Self, RegistryError> {
        self.tools.register(RegisteredTool::new(tool, handler))?;
        Ok(self)
    }

    pub fn with_prompt(
        self,
        prompt: Prompt,
        handler: impl PromptHandler,
    ) -> Result<Self, RegistryError> {
        self.with_registered_prompt(RegisteredPrompt::new(prompt, handler))
    }

    /// Register a prompt built separately, e.g. one carrying completion handlers.
    pub fn with_registered_prompt(
        mut self,
        prompt: RegisteredPrompt,
    ) -> Result<Self, RegistryError> {
        self.prompts.register(prompt)?;
        Ok(self)
    }

    pub fn build(self) -> MCPService {
        // Nothing can be registered after this point, so `listChanged` is always false.
        let capabilities = self.config.capabilities.unwrap_or_else(|| {
            let mut builder = CapabilitiesBuilder::new();
            if !self.resources.is_empty() || !self.templates.is_empty() {
                builder = builder.with_resources(false, false);
            }
            if !self.tools.is_empty() {
                builder = builder.with_tools(false);
            }
            if !self.prompts.is_empty() {
                builder = builder.with_prompts(false);
            }
            builder.build()
        });

        MCPService {
            inner: Arc::new(Inner {
                negotiator: Negotiator::new(
                    self.config.server_info,
                    self.config.instructions,
                    capabilities,
                ),
                log_errors: self.config.log_errors,
                resources: self.resources,
                templates: self.templates,
                tools: self.tools,
                prompts: self.prompts,
            }),
            ctx: CallContext::default(),
        }
    }
}

/// Decode request parameters into the method's parameter struct. Absent params decode as an
/// empty object.
fn parse_params<T: DeserializeOwned>(params: Option<Params>) -> Result<T, RequestError> {
    let map = params_map(params)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| RequestError::invalid_params(format!("Invalid params: {}", e)))
}

fn params_map(params: Option<Params>) -> Result<Map<String, Value>, RequestError> {
    match params {
        None => Ok(Map::new()),
        Some(Params::Map(map)) => Ok(map),
        Some(Params::Array(_)) => Err(RequestError::invalid_params(
            "Parameters must be a map-like object",
        )),
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, RequestError> {
    Ok(serde_json::to_value(value)?)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

/// Run a handler future to completion, turning a panic into an error message.
async fn contain<F, T, E>(future: F) -> Result<Result<T, E>, String>
where
    F: Future<Output = Result<T, E>>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()))
}

/// Run a resource, list or completion handler. Its errors and panics become request errors.
async fn contain_resource<F, T>(future: F) -> Result<T, RequestError>
where
    F: Future<Output = Result<T, ResourceError>>,
{
    contain(future)
        .await
        .map_err(RequestError::internal)?
        .map_err(RequestError::from)
}

fn completion(mut values: Vec<String>) -> Completion {
    let total = values.len();
    let has_more = total > MAX_COMPLETION_VALUES;
    values.truncate(MAX_COMPLETION_VALUES);
    Completion {
        values,
        total: Some(total),
        has_more: Some(has_more),
    }
}

impl MCPService {
    /// A clone of this service whose handlers receive `ctx` on every call. Transports use this to
    /// attach per-connection data such as the authenticated caller.
    pub fn with_call_context(&self, ctx: CallContext) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ctx,
        }
    }

    pub fn call_context(&self) -> &CallContext {
        &self.ctx
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.inner.negotiator
    }

    /// Handle one message. Requests and invalid messages always get a response; notifications
    /// never do.
    pub async fn handle(&self, message: SendableMessage, ctx: &CallContext) -> Option<ResponseItem> {
        match message {
            SendableMessage::Request(call) => Some(self.handle_request(call, ctx).await),
            SendableMessage::Notification(notification) => {
                self.handle_notification(notification);
                None
            }
            SendableMessage::Invalid { id } => {
                tracing::debug!(request_id = %id, "Invalid request");
                Some(ResponseItem::error(
                    id,
                    RequestError::invalid_request("Invalid request").into(),
                ))
            }
        }
    }

    async fn handle_request(&self, call: MethodCall, ctx: &CallContext) -> ResponseItem {
        let MethodCall {
            id, method, params, ..
        } = call;
        let span = tracing::debug_span!("request", request_id = %id, method = %method);

        let logged_params = self.inner.log_errors.then(|| params.clone());
        let result = contain(self.route(&method, params, ctx))
            .instrument(span.clone())
            .await
            .unwrap_or_else(|panic| Err(RequestError::internal(panic)));

        span.in_scope(|| match result {
            Ok(value) => {
                tracing::debug!("Request handled");
                ResponseItem::success(id, value)
            }
            Err(err) => {
                if err.kind == ErrorKind::InternalError {
                    if let Some(params) = logged_params {
                        tracing::error!(
                            params = ?params,
                            error = %err,
                            "Error processing message: {}",
                            err
                        );
                    }
                } else {
                    tracing::debug!(error = %err, code = %err.code(), "Request rejected");
                }
                ResponseItem::error(id, err.into())
            }
        })
    }

    fn handle_notification(&self, notification: Notification) {
        match notification.method.as_str() {
            "notifications/initialized" => tracing::debug!("Client initialized"),
            "notifications/cancelled" => {
                match parse_params::<CancelledParams>(notification.params) {
                    Ok(cancelled) => tracing::debug!(
                        request_id = %cancelled.request_id,
                        reason = cancelled.reason.as_deref().unwrap_or_default(),
                        "Request cancelled by client"
                    ),
                    Err(err) => tracing::debug!(error = %err, "Malformed cancellation"),
                }
            }
            method => tracing::warn!(method, "Received unknown notification: {}", method),
        }
    }

    async fn route(
        &self,
        method: &str,
        params: Option<Params>,
        ctx: &CallContext,
    ) -> Result<Value, RequestError> {
        match method {
            "initialize" => to_result(self.initialize(params)?),
            "ping" => Ok(json!({})),
            "resources/list" => to_result(self.list_resources(ctx).await?),
            "resources/templates/list" => to_result(self.list_resource_templates()),
            "resources/read" => {
                let params: ReadResourceParams = parse_params(params)?;
                let uri = params.uri.ok_or_else(|| RequestError::missing_param("uri"))?;
                to_result(self.read_resource(&uri, ctx).await?)
            }
            "tools/list" => to_result(self.list_tools()),
            "tools/call" => to_result(self.call_tool(parse_params(params)?, ctx).await?),
            "prompts/list" => to_result(self.list_prompts()),
            "prompts/get" => to_result(self.get_prompt(parse_params(params)?, ctx).await?),
            "completion/complete" => to_result(self.complete(parse_params(params)?, ctx).await?),
            _ => Err(RequestError::method_not_found(method)),
        }
    }

    fn initialize(
        &self,
        params: Option<Params>,
    ) -> Result<InitializeResult, RequestError> {
        let map = params_map(params)?;
        // Client info and capabilities aren't validated; a malformed one must not break the
        // handshake.
        let params = serde_json::from_value::<InitializeParams>(Value::Object(map.clone()))
            .unwrap_or_else(|_| InitializeParams {
                protocol_version: map
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ..Default::default()
            });
        if let Some(client) = &params.client_info {
            tracing::info!(client = %client.name, version = %client.version, "Client connected");
        }
        Ok(self.inner.negotiator.initialize(&params))
    }

    /// Fixed resources first, then whatever each list-capable template enumerates, with the
    /// template's metadata merged into every entry.
    async fn list_resources(&self, ctx: &CallContext) -> Result<ListResourcesResult, RequestError> {
        let mut resources: Vec<Resource> = self
            .inner
            .resources
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect();

        for template in &self.inner.templates {
            let Some(list_handler) = &template.list_handler else {
                continue;
            };
            let listed = contain_resource(list_handler.list(ctx)).await?;
            resources.extend(listed.into_iter().map(|mut resource| {
                resource.merge_metadata(&template.descriptor.metadata);
                resource
            }));
        }

        Ok(ListResourcesResult { resources })
    }

    fn list_resource_templates(&self) -> ListResourceTemplatesResult {
        ListResourceTemplatesResult {
            resource_templates: self
                .inner
                .templates
                .iter()
                .map(|entry| entry.descriptor.clone())
                .collect(),
        }
    }

    /// Exact URI match first, then templates in registration order. The first template that
    /// matches wins, however specific the later ones are. A URI nothing matches is reported as
    /// invalid when it doesn't parse as a URL, and as not found otherwise.
    pub async fn read_resource(
        &self,
        uri: &str,
        ctx: &CallContext,
    ) -> Result<ReadResourceResult, RequestError> {
        if let Some(resource) = self.inner.resources.lookup(uri) {
            return contain_resource(resource.handler.read(uri, ctx)).await;
        }

        for template in &self.inner.templates {
            if let Some(variables) = template.matcher.matches(uri) {
                tracing::debug!(template = %template.descriptor.name, "Matched resource template");
                return contain_resource(template.handler.read(uri, &variables, ctx)).await;
            }
        }

        if url::Url::parse(uri).is_err() {
            return Err(RequestError::invalid_params(format!("Invalid URI: {}", uri)));
        }
        Err(RequestError::invalid_params(format!(
            "Resource not found: {}",
            uri
        )))
    }

    fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self
                .inner
                .tools
                .iter()
                .map(|entry| entry.descriptor.clone())
                .collect(),
        }
    }

    /// Call a tool. Whatever goes wrong inside the tool itself, including a panic, comes back as
    /// a successful result flagged with `isError`.
    pub async fn call_tool(
        &self,
        params: CallToolParams,
        ctx: &CallContext,
    ) -> Result<CallToolResult, RequestError> {
        let name = params
            .name
            .ok_or_else(|| RequestError::missing_param("name"))?;
        let tool = self
            .inner
            .tools
            .lookup(&name)
            .ok_or_else(|| RequestError::invalid_params(format!("Tool {} not found", name)))?;
        let arguments = params.arguments.unwrap_or_default();
        let logged_arguments = self.inner.log_errors.then(|| arguments.clone());

        let message = match contain(tool.handler.call(arguments, ctx)).await {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic,
        };

        if let Some(arguments) = logged_arguments {
            let arguments = Value::Object(arguments);
            tracing::error!(
                tool = %name,
                arguments = %arguments,
                "Error calling tool {}: {}",
                name,
                message
            );
        }
        Ok(CallToolResult::error(message))
    }

    fn list_prompts(&self) -> ListPromptsResult {
        ListPromptsResult {
            prompts: self
                .inner
                .prompts
                .iter()
                .map(|entry| entry.descriptor.clone())
                .collect(),
        }
    }

    /// Render a prompt. Required arguments are checked before the handler runs; a handler
    /// failure is an internal error.
    pub async fn get_prompt(
        &self,
        params: GetPromptParams,
        ctx: &CallContext,
    ) -> Result<GetPromptResult, RequestError> {
        let name = params
            .name
            .ok_or_else(|| RequestError::missing_param("name"))?;
        let prompt = self
            .inner
            .prompts
            .lookup(&name)
            .ok_or_else(|| RequestError::invalid_params(format!("Prompt {} not found", name)))?;
        let arguments = params.arguments.unwrap_or_default();

        if let Some(missing) = prompt
            .descriptor
            .arguments()
            .iter()
            .find(|arg| arg.required && arguments.get(&arg.name).map_or(true, Value::is_null))
        {
            return Err(RequestError::invalid_params(format!(
                "Missing required argument: {}",
                missing.name
            )));
        }

        let message = match contain(prompt.handler.get(arguments, ctx)).await {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic,
        };
        Err(RequestError::internal(format!(
            "Error getting prompt: {}",
            message
        )))
    }

    /// Suggest values for a template variable or prompt argument. Capabilities without a
    /// completion handler for the argument get an empty completion.
    pub async fn complete(
        &self,
        params: CompleteParams,
        ctx: &CallContext,
    ) -> Result<CompleteResult, RequestError> {
        let reference = params
            .reference
            .ok_or_else(|| RequestError::missing_param("ref"))?;
        let argument = params
            .argument
            .ok_or_else(|| RequestError::missing_param("argument"))?;

        let handler = match &reference {
            CompletionReference::Resource { uri } => self
                .inner
                .templates
                .iter()
                .find(|template| template.descriptor.uri_template == *uri)
                .ok_or_else(|| {
                    RequestError::invalid_params(format!("Resource template {} not found", uri))
                })?
                .completions
                .get(&argument.name),
            CompletionReference::Prompt { name } => self
                .inner
                .prompts
                .lookup(name)
                .ok_or_else(|| RequestError::invalid_params(format!("Prompt {} not found", name)))?
                .completions
                .get(&argument.name),
        };

        let values = match handler {
            Some(handler) => contain_resource(handler.complete(&argument.value, ctx)).await?,
            None => Vec::new(),
        };
        Ok(CompleteResult {
            completion: completion(values),
        })
    }
}

impl Service<SendableMessage> for MCPService {
    type Response = Option<ResponseItem>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    /// Resolves to `None` for notifications, `Some` for everything else.
    fn call(&mut self, message: SendableMessage) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.handle(message, &this.ctx).await) })
    }
}
