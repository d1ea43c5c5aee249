use thiserror::Error;

/// Transport-layer failure of a device exchange.
///
/// One variant per way the host side of an exchange can fail. These are
/// surfaced as-is by the core (no retry, no partial recovery) and only turned
/// into caller-facing text by [`Reply::from_transport`](crate::reply::Reply::from_transport).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportError {
    #[error("port could not be opened")]
    PortOpenFailed,
    #[error("read from port failed")]
    PortReadFailed,
    /// Also reported when the driver rejects the line configuration.
    #[error("write to port failed")]
    PortWriteFailed,
    /// Any failure of the by-name lookup, not only true absence.
    #[error("port not found")]
    PortNotFound,
    #[error("port does not match the device identity")]
    PortInvalid,
    #[error("unknown transport failure")]
    Unknown,
}

/// A specialized `Result` for core transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_lowercase_log_text() {
        assert_eq!(TransportError::PortNotFound.to_string(), "port not found");
        assert_eq!(
            TransportError::PortWriteFailed.to_string(),
            "write to port failed"
        );
    }
}
