use thiserror::Error;
use tokio_util::codec::LinesCodecError;

mod stdio;
pub use stdio::{stdio, SplitTransport, StdioTransport};

/// Errors that end a connection.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("LinesCodecError error: {0}")]
    LinesCodecError(#[from] LinesCodecError),
}

/// Why an incoming line couldn't be turned into a request. These are answered or logged, and
/// the connection carries on.
#[derive(Error, Debug)]
pub enum MessageParseError {
    #[error("JSON parsing error: {0}")]
    Deserialisation(#[from] serde_json::Error),

    #[error("Could not read line: {0}")]
    LinesCodecError(#[from] LinesCodecError),
}
