//! Configuration types for the JSON-RPC client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Timeout configurations
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Request batching
    #[serde(default)]
    pub batch: BatchConfig,

    /// Connection configurations
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Timeout configuration for the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout
    #[serde(with = "duration_serde")]
    pub connect: Duration,

    /// Timeout for one HTTP exchange
    #[serde(with = "duration_serde")]
    pub request: Duration,
}

/// Batching configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    /// Coalescing window used by `call` and `notify`.
    /// Zero sends every request on its own.
    #[serde(with = "duration_serde")]
    pub window: Duration,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// User agent string
    pub user_agent: Option<String>,

    /// Custom headers to include in requests
    pub headers: Option<HashMap<String, String>>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("turul-json-rpc-client/{}", env!("CARGO_PKG_VERSION"))),
            headers: None,
        }
    }
}

impl ClientConfig {
    /// Configuration that coalesces `call`/`notify` within `window`
    pub fn batched(window: Duration) -> Self {
        Self {
            batch: BatchConfig { window },
            ..Self::default()
        }
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbatched() {
        let config = ClientConfig::default();
        assert!(config.batch.window.is_zero());
        assert_eq!(config.timeouts.request, Duration::from_secs(30));
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig::batched(Duration::from_millis(50));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["batch"]["window"], 50);

        let parsed: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.batch.window, Duration::from_millis(50));
    }

    #[test]
    fn test_partial_config() {
        let parsed: ClientConfig = serde_json::from_str(r#"{"batch": {"window": 25}}"#).unwrap();
        assert_eq!(parsed.batch.window, Duration::from_millis(25));
        assert_eq!(parsed.timeouts.connect, Duration::from_secs(10));
    }
}
