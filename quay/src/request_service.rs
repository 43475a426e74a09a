use crate::errors::RequestError;
use futures::future::{join_all, poll_fn, BoxFuture};
use quay_mcp_protocol::jsonrpc::{Request, RequestId, Response, ResponseItem, SendableMessage};
use std::{
    convert::Infallible,
    task::{Context, Poll},
};
use tower::Service;

/// Adapts a service handling single [`SendableMessage`]s into one handling whatever arrives on
/// the wire: a single message or a JSON-RPC batch.
///
/// Batch members are handled concurrently and answered in order. Notifications in a batch
/// produce no entry, so a batch made only of notifications produces no output at all.
#[derive(Clone, Debug)]
pub struct MCPRequestService<S> {
    inner: S,
}

impl<S> MCPRequestService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

async fn call_one<S>(mut service: S, message: SendableMessage) -> Option<ResponseItem>
where
    S: Service<SendableMessage, Response = Option<ResponseItem>, Error = Infallible>,
{
    let ready = poll_fn(|cx| service.poll_ready(cx)).await;
    let result = match ready {
        Ok(()) => service.call(message).await,
        Err(never) => match never {},
    };
    result.unwrap_or_else(|never| match never {})
}

impl<S> Service<Request> for MCPRequestService<S>
where
    S: Service<SendableMessage, Response = Option<ResponseItem>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness is checked per message, on the clone that handles it.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let service = self.inner.clone();
        Box::pin(async move {
            let response = match request {
                Request::Single(message) => Response::Single(call_one(service, message).await),
                Request::Batch(messages) if messages.is_empty() => {
                    Response::Single(Some(ResponseItem::error(
                        RequestId::Null,
                        RequestError::invalid_request("Invalid request: batch is empty").into(),
                    )))
                }
                Request::Batch(messages) => {
                    tracing::debug!(size = messages.len(), "Handling batch");
                    let responses = join_all(
                        messages
                            .into_iter()
                            .map(|message| call_one(service.clone(), message)),
                    )
                    .await;
                    Response::Batch(responses.into_iter().flatten().collect())
                }
            };
            Ok(response)
        })
    }
}
