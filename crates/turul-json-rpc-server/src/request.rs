use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request.
///
/// A request without an `id` is a notification. `params` stays in its
/// encoded form until a handler's parameter type is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc", default = "JsonRpcVersion::missing")]
    pub version: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Create a new notification (no id, never answered)
    pub fn notification(method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: RequestId, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Create a request whose params are encoded from `params`.
    /// A value that encodes to `null` is left off the wire.
    pub fn with_params<P>(
        id: Option<RequestId>,
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error>
    where
        P: Serialize + ?Sized,
    {
        let raw = serde_json::value::to_raw_value(params)?;
        let params = if raw.get() == "null" { None } else { Some(raw) };
        Ok(Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Decode the params into `T`. Absent params decode as JSON `null`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let encoded = self.params.as_deref().map(RawValue::get).unwrap_or("null");
        serde_json::from_str(encoded)
    }
}
