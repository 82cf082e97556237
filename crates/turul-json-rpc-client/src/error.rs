//! Error types for JSON-RPC client operations

use thiserror::Error;
use turul_json_rpc_server::JsonRpcErrorObject;

/// Result type for JSON-RPC client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error returned to callers of the client.
///
/// `Rpc` is the only protocol-level variant: it carries the error object of
/// a response, whether the remote handler produced it or the transport
/// synthesized it. The other variants are local faults.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The response carried an error object
    #[error(transparent)]
    Rpc(#[from] JsonRpcErrorObject),

    /// Params could not be encoded
    #[error("Failed to encode params: {0}")]
    Encode(#[source] serde_json::Error),

    /// A successful result could not be decoded into the requested type
    #[error("Failed to decode result: {0}")]
    Decode(#[source] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the error code if this is a protocol error
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Rpc(error) => Some(error.code),
            _ => None,
        }
    }

    /// Check if the error came back through a response
    pub fn is_rpc(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }

    /// Borrow the error object of a protocol error
    pub fn as_rpc(&self) -> Option<&JsonRpcErrorObject> {
        match self {
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turul_json_rpc_server::error_codes;

    #[test]
    fn test_rpc_error_keeps_code() {
        let error: ClientError = JsonRpcErrorObject::server_error(None).into();
        assert!(error.is_rpc());
        assert_eq!(error.code(), Some(error_codes::SERVER_ERROR));
        assert_eq!(error.to_string(), "JSON-RPC error -32000: Server error");
    }

    #[test]
    fn test_decode_error_is_local() {
        let source = serde_json::from_str::<i64>("\"x\"").unwrap_err();
        let error = ClientError::Decode(source);
        assert!(!error.is_rpc());
        assert_eq!(error.code(), None);
        assert!(error.to_string().starts_with("Failed to decode result"));
    }
}
