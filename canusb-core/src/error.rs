use thiserror::Error;

/// Main error type for USB-CAN adapter operations
#[derive(Error, Debug)]
pub enum CanUsbError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Sink error: {0}")]
    Sink(String),
}

impl CanUsbError {
    /// Connection error for an operation that needs an open port
    pub fn not_connected(what: &str) -> Self {
        CanUsbError::Connection(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            format!("{} not connected", what),
        ))
    }
}

/// Result type alias for USB-CAN adapter operations
pub type CanUsbResult<T> = Result<T, CanUsbError>;
