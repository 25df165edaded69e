use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("could not resolve simulator address {address}")]
    Resolve { address: String },
    #[error("failed to connect to simulator at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("simulator did not answer `{method}` within the timeout")]
    Timeout { method: String },
    #[error("I/O error talking to simulator: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed simulator message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("simulator rejected `{method}`: {message}")]
    Server { method: String, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("simulator closed the connection")]
    Closed,
    #[error("connection lock poisoned")]
    Poisoned,
}

impl SimError {
    /// Maps an I/O error raised while waiting on `method` into the
    /// timeout variant when the socket deadline expired.
    pub(crate) fn from_io(method: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => SimError::Timeout {
                method: method.to_string(),
            },
            _ => SimError::Io(err),
        }
    }
}
