use crate::{
    errors::RequestError,
    transport::{MessageParseError, TransportError},
};
use futures::{future::poll_fn, SinkExt, StreamExt};
use quay_mcp_protocol::jsonrpc::{Request, RequestId, Response, ResponseItem};
use std::convert::Infallible;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tower::Service;

/// Longest line accepted from a client, in bytes. Longer lines are discarded.
pub const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

#[inline]
fn parse_message(line: Result<String, LinesCodecError>) -> Result<Request, MessageParseError> {
    let line = line?;
    serde_json::from_str::<Request>(&line).map_err(MessageParseError::Deserialisation)
}

/// Write a JSON-RPC response on the transport.
#[inline]
async fn write_message<T>(
    frame: &mut Framed<T, LinesCodec>,
    msg: Response,
) -> Result<(), TransportError>
where
    T: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(&msg)?;
    tracing::trace!(json = %json, "Sending response");
    frame.send(json).await?;
    Ok(())
}

async fn handle_connection<S, T>(mut service: S, transport: T) -> Result<(), TransportError>
where
    S: Service<Request, Response = Response, Error = Infallible>,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut frame = Framed::new(transport, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    // Process the stream in lines until the client closes the connection
    while let Some(line) = frame.next().await {
        if matches!(&line, Ok(l) if l.trim().is_empty()) {
            continue;
        }
        match parse_message(line) {
            Ok(message) => {
                poll_fn(|cx| service.poll_ready(cx))
                    .await
                    .unwrap_or_else(|never| match never {});
                let response = service
                    .call(message)
                    .await
                    .unwrap_or_else(|never| match never {});
                if !response.is_empty() {
                    if let Err(e) = write_message(&mut frame, response).await {
                        tracing::error!(error = %e, "Error writing response over transport");
                    }
                }
            }
            Err(MessageParseError::Deserialisation(e)) => {
                // https://www.jsonrpc.org/specification#examples
                tracing::debug!(error = %e, "Could not parse message");
                let error = RequestError::parse_error(
                    "JSON parsing error when deserialising the message",
                );
                let msg = ResponseItem::error(RequestId::Null, error.into());
                write_message(&mut frame, Response::Single(Some(msg))).await?;
            }
            Err(MessageParseError::LinesCodecError(LinesCodecError::Io(e))) => {
                return Err(TransportError::Io(e));
            }
            Err(MessageParseError::LinesCodecError(e)) => {
                // The oversized line is skipped; the connection stays usable.
                tracing::error!(error = %e, "Transport error");
            }
        }
    }

    tracing::info!("Client disconnected");
    Ok(())
}

/// Serve an MCP service over a transport, one JSON-RPC message (or batch) per line.
///
/// Returns when the client closes its end of the transport, or on an I/O error.
pub async fn serve<S, T>(service: S, transport: T) -> Result<(), TransportError>
where
    S: Service<Request, Response = Response, Error = Infallible>,
    T: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!("Server started");
    handle_connection(service, transport).await
}
