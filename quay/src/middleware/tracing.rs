use futures::future::BoxFuture;
use quay_mcp_protocol::jsonrpc::{ResponseItem, SendableMessage};
use std::{
    convert::Infallible,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{Instrument, Level};

const DEFAULT_TRACE_LEVEL: Level = Level::DEBUG;

/// A service that wraps each incoming MCP message in a span
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<SendableMessage> for TracingService<S>
where
    S: Service<SendableMessage, Response = Option<ResponseItem>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = Option<ResponseItem>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: SendableMessage) -> Self::Future {
        let span = match &req {
            SendableMessage::Request(call) => tracing::span!(
                DEFAULT_TRACE_LEVEL,
                "mcp_request",
                method = %call.method,
                request_id = %call.id,
                params = ?call.params
            ),
            SendableMessage::Notification(notification) => tracing::span!(
                DEFAULT_TRACE_LEVEL,
                "mcp_notification",
                method = %notification.method,
                params = ?notification.params
            ),
            SendableMessage::Invalid { id } => {
                tracing::span!(DEFAULT_TRACE_LEVEL, "mcp_invalid", request_id = %id)
            }
        };

        let future = self.inner.call(req);
        Box::pin(
            async move {
                let started = Instant::now();
                let response = future.await;
                let failed = matches!(response, Ok(Some(ResponseItem::Error { .. })));
                tracing::event!(
                    DEFAULT_TRACE_LEVEL,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    failed,
                    "Message processed"
                );
                response
            }
            .instrument(span),
        )
    }
}

/// A layer that wraps services with tracing functionality
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer
where
    S: Service<SendableMessage, Response = Option<ResponseItem>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}
