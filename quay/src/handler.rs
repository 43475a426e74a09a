//! One handler trait per capability category, plus closure adapters.
//!
//! Handlers are called with owned arguments and a borrowed [`CallContext`]. Anything a handler
//! needs beyond that (database pools, clients, counters) should be captured by the handler
//! itself, e.g. moved into the closure passed to [`tool_fn`].

use crate::{context::CallContext, response::IntoCallToolResult, uri_template::UriVariables};
use async_trait::async_trait;
use quay_mcp_protocol::{
    messages::{CallToolResult, GetPromptResult, ReadResourceResult},
    prompt::PromptError,
    resource::{Resource, ResourceError},
    tool::ToolError,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{future::Future, marker::PhantomData};

/// Reads a fixed resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    async fn read(&self, uri: &str, ctx: &CallContext)
        -> Result<ReadResourceResult, ResourceError>;
}

/// Reads a resource addressed through a URI template. `variables` holds the placeholder
/// bindings extracted from `uri`.
#[async_trait]
pub trait ResourceTemplateHandler: Send + Sync + 'static {
    async fn read(
        &self,
        uri: &str,
        variables: &UriVariables,
        ctx: &CallContext,
    ) -> Result<ReadResourceResult, ResourceError>;
}

/// Enumerates the concrete resources a template currently stands for, for `resources/list`.
#[async_trait]
pub trait ResourceListHandler: Send + Sync + 'static {
    async fn list(&self, ctx: &CallContext) -> Result<Vec<Resource>, ResourceError>;
}

/// Suggests values for one template variable or prompt argument, given what the user has typed
/// so far.
#[async_trait]
pub trait CompletionHandler: Send + Sync + 'static {
    async fn complete(&self, value: &str, ctx: &CallContext) -> Result<Vec<String>, ResourceError>;
}

#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    /// Execute the tool. `arguments` is whatever the client sent, unvalidated.
    async fn call(
        &self,
        arguments: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<CallToolResult, ToolError>;
}

#[async_trait]
pub trait PromptHandler: Send + Sync + 'static {
    /// Render the prompt. Required arguments have already been checked for presence.
    async fn get(
        &self,
        arguments: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<GetPromptResult, PromptError>;
}

/// Adapts a closure to one of the handler traits. Build one with [`resource_fn`],
/// [`template_fn`], [`list_fn`], [`completion_fn`], [`tool_fn`] or [`prompt_fn`], which pin the
/// closure's argument types.
#[derive(Clone)]
pub struct FnHandler<F>(F);

pub fn resource_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(String, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ResourceError>> + Send + 'static,
    R: Into<ReadResourceResult>,
{
    FnHandler(f)
}

pub fn template_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(String, UriVariables, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ResourceError>> + Send + 'static,
    R: Into<ReadResourceResult>,
{
    FnHandler(f)
}

pub fn list_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Resource>, ResourceError>> + Send + 'static,
{
    FnHandler(f)
}

pub fn completion_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(String, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<String>, ResourceError>> + Send + 'static,
{
    FnHandler(f)
}

/// Wrap an async closure as a tool. The closure may return anything implementing
/// [`IntoCallToolResult`]: a `String`, a number, `Vec<Content>`, or a `Result` of those.
pub fn tool_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Map<String, Value>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoCallToolResult + Send + 'static,
{
    FnHandler(f)
}

pub fn prompt_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Map<String, Value>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, PromptError>> + Send + 'static,
    R: Into<GetPromptResult> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut, R> ResourceHandler for FnHandler<F>
where
    F: Fn(String, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ResourceError>> + Send + 'static,
    R: Into<ReadResourceResult>,
{
    async fn read(
        &self,
        uri: &str,
        ctx: &CallContext,
    ) -> Result<ReadResourceResult, ResourceError> {
        (self.0)(uri.to_string(), ctx.clone()).await.map(Into::into)
    }
}

#[async_trait]
impl<F, Fut, R> ResourceTemplateHandler for FnHandler<F>
where
    F: Fn(String, UriVariables, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ResourceError>> + Send + 'static,
    R: Into<ReadResourceResult>,
{
    async fn read(
        &self,
        uri: &str,
        variables: &UriVariables,
        ctx: &CallContext,
    ) -> Result<ReadResourceResult, ResourceError> {
        (self.0)(uri.to_string(), variables.clone(), ctx.clone())
            .await
            .map(Into::into)
    }
}

#[async_trait]
impl<F, Fut> ResourceListHandler for FnHandler<F>
where
    F: Fn(CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Resource>, ResourceError>> + Send + 'static,
{
    async fn list(&self, ctx: &CallContext) -> Result<Vec<Resource>, ResourceError> {
        (self.0)(ctx.clone()).await
    }
}

#[async_trait]
impl<F, Fut> CompletionHandler for FnHandler<F>
where
    F: Fn(String, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<String>, ResourceError>> + Send + 'static,
{
    async fn complete(&self, value: &str, ctx: &CallContext) -> Result<Vec<String>, ResourceError> {
        (self.0)(value.to_string(), ctx.clone()).await
    }
}

#[async_trait]
impl<F, Fut, R> ToolHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoCallToolResult + Send + 'static,
{
    async fn call(
        &self,
        arguments: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<CallToolResult, ToolError> {
        (self.0)(arguments, ctx.clone()).await.into_call_tool_result()
    }
}

#[async_trait]
impl<F, Fut, R> PromptHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, PromptError>> + Send + 'static,
    R: Into<GetPromptResult> + Send + 'static,
{
    async fn get(
        &self,
        arguments: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<GetPromptResult, PromptError> {
        (self.0)(arguments, ctx.clone()).await.map(Into::into)
    }
}

/// A tool whose arguments are deserialised into `T` before the closure runs. Arguments that
/// don't fit `T` are reported as [`ToolError::InvalidArguments`].
pub struct TypedToolFn<F, T> {
    f: F,
    _args: PhantomData<fn(T)>,
}

/// Wrap an async closure taking typed arguments as a tool. Pair it with
/// [`generate_tool_schema`](quay_mcp_protocol::tool::generate_tool_schema) so the advertised
/// schema matches `T`.
pub fn typed_tool_fn<T, F, Fut, R>(f: F) -> TypedToolFn<F, T>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoCallToolResult + Send + 'static,
{
    TypedToolFn {
        f,
        _args: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut, R> ToolHandler for TypedToolFn<F, T>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoCallToolResult + Send + 'static,
{
    async fn call(
        &self,
        arguments: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<CallToolResult, ToolError> {
        let args: T = serde_json::from_value(Value::Object(arguments))?;
        (self.f)(args, ctx.clone()).await.into_call_tool_result()
    }
}
