//! Serial adapter error types.

use feedbridge_domain::error::FeedBridgeError;

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The port could not be opened or configured.
    #[error("failed to open serial port {port}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// The port driver reported an error.
    #[error("serial port error")]
    Port(#[from] serialport::Error),

    /// Reading or writing bytes failed.
    #[error("serial I/O error")]
    Io(#[from] std::io::Error),

    /// The link was closed or lost by a failed blocking task.
    #[error("serial link closed")]
    Closed,

    /// A blocking serial task panicked or was cancelled.
    #[error("serial task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl From<SerialError> for FeedBridgeError {
    fn from(err: SerialError) -> Self {
        FeedBridgeError::device(err)
    }
}
