use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::JsonRpcErrorObject;
use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC response.
///
/// Exactly one of `result` / `error` is emitted on the wire. `id` is
/// serialized as `null` when the originating request could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc", default = "JsonRpcVersion::missing")]
    pub version: JsonRpcVersion,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Box<RawValue>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Encode `value` as the result of a successful response
    pub fn from_result<T>(id: Option<RequestId>, value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::success(id, serde_json::value::to_raw_value(value)?))
    }

    pub fn error(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Decode the result into `T`. A `null` or absent result decodes as
    /// JSON `null`, so `()` and `Option<_>` targets accept it.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let encoded = self.result.as_deref().map(RawValue::get).unwrap_or("null");
        serde_json::from_str(encoded)
    }

    /// Split into the encoded result or the error object
    pub fn into_result(self) -> Result<Option<Box<RawValue>>, JsonRpcErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }

    /// Numeric id, the only id shape the batching client correlates on
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(RequestId::as_i64)
    }
}
