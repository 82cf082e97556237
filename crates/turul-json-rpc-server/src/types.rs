use serde::de::value::MapAccessDeserializer;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A uniquely identifying ID for a JSON-RPC request.
/// Can be a string or a number. A `null` id is modelled as `Option::None`
/// on the envelope, never as a variant here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl RequestId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// JSON-RPC version carried in the `jsonrpc` member.
///
/// Decoding accepts any string so that a wrong version surfaces as a
/// per-request `Invalid Request` instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
    Unsupported(String),
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
            JsonRpcVersion::Unsupported(s) => s,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, JsonRpcVersion::V2_0)
    }

    /// Value used when the `jsonrpc` member is absent
    pub(crate) fn missing() -> Self {
        JsonRpcVersion::Unsupported(String::new())
    }
}

impl From<&str> for JsonRpcVersion {
    fn from(s: &str) -> Self {
        if s == crate::JSONRPC_VERSION {
            JsonRpcVersion::V2_0
        } else {
            JsonRpcVersion::Unsupported(s.to_string())
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(JsonRpcVersion::from(s.as_str()))
    }
}

/// Shape of a JSON-RPC payload: one envelope or a batch array of them.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cardinality<T> {
    Single(T),
    Batch(Vec<T>),
}

// `Box<RawValue>` fields must see the original deserializer, never a buffer
impl<'de, T> Deserialize<'de> for Cardinality<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CardinalityVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for CardinalityVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = Cardinality<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON-RPC object or an array of them")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Cardinality::Batch(items))
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                T::deserialize(MapAccessDeserializer::new(map)).map(Cardinality::Single)
            }
        }

        deserializer.deserialize_any(CardinalityVisitor(PhantomData))
    }
}

impl<T> Cardinality<T> {
    /// Cheap syntactic check: a payload whose first non-whitespace byte is
    /// `[` is a batch.
    pub fn is_batch_payload(payload: &[u8]) -> bool {
        payload
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'[')
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Cardinality::Batch(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Cardinality::Single(item) => vec![item],
            Cardinality::Batch(items) => items,
        }
    }

    pub fn single(self) -> Option<T> {
        match self {
            Cardinality::Single(item) => Some(item),
            Cardinality::Batch(_) => None,
        }
    }

    pub fn batch(self) -> Option<Vec<T>> {
        match self {
            Cardinality::Single(_) => None,
            Cardinality::Batch(items) => Some(items),
        }
    }
}
