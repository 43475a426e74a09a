use crate::MCPRequestService;
use quay_mcp_protocol::jsonrpc::{ResponseItem, SendableMessage};
use std::convert::Infallible;
use tower::Service;

/// Extension trait that adds additional methods to any [`Service`] that processes MCP messages.
pub trait ServiceExt<R>: Service<R> + Sized {
    /// Wrap this service so it accepts batches as well as single messages, as [`serve`]
    /// requires.
    ///
    /// [`serve`]: crate::serve
    fn into_request_service(self) -> MCPRequestService<Self>;
}

impl<S> ServiceExt<SendableMessage> for S
where
    S: Service<SendableMessage, Response = Option<ResponseItem>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    fn into_request_service(self) -> MCPRequestService<Self> {
        MCPRequestService::new(self)
    }
}
