// MIT License - Copyright (c) 2026 Peter Wright

/// All errors that can occur in the envisalink-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum EnvisalinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Not connected to panel")]
    Disconnected,

    #[error("Panel rejected login password")]
    AuthenticationRejected,

    #[error("Unknown response code: {code}")]
    UnknownCode { code: u16 },

    #[error("Malformed line: {details}")]
    MalformedLine { details: String },

    #[error("Channel closed")]
    ChannelClosed,
}

impl EnvisalinkError {
    /// Whether this error is transient and the connection should be retried.
    ///
    /// Transport-level failures recover through the reconnect loop; a
    /// rejected password never does (retrying with the same password
    /// cannot succeed), and per-line parse errors are handled in place.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EnvisalinkError::Io(_)
                | EnvisalinkError::ConnectionClosed
                | EnvisalinkError::Disconnected
                | EnvisalinkError::ChannelClosed
        )
    }

    /// Whether this error must terminate the session rather than reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EnvisalinkError::AuthenticationRejected)
    }
}

pub type Result<T> = std::result::Result<T, EnvisalinkError>;
