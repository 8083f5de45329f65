//! Request body for POST/PUT operations.

use crate::base::neterror::NetError;
use bytes::Bytes;
use serde::Serialize;

/// Request body as supplied by the caller.
///
/// Raw bytes go out unmodified; structured payloads are JSON-encoded when the
/// request is prepared.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Pre-serialized payload, e.g. BCS-encoded transactions.
    Bytes(Bytes),
    /// Structured payload, encoded as JSON.
    Json(serde_json::Value),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(v: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(v: serde_json::Value) -> Self {
        RequestBody::Json(v)
    }
}

impl RequestBody {
    /// Capture any serializable value as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, NetError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| NetError::RequestBodyEncoding {
                reason: e.to_string(),
            })
    }

    /// A JSON `null` counts as no body.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
            RequestBody::Json(v) => v.is_null(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, RequestBody::Json(v) if !v.is_null())
    }

    /// Wire bytes for this body.
    pub fn encode(&self) -> Result<Bytes, NetError> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Bytes(b) => Ok(b.clone()),
            RequestBody::Json(v) if v.is_null() => Ok(Bytes::new()),
            RequestBody::Json(v) => serde_json::to_vec(v).map(Bytes::from).map_err(|e| {
                NetError::RequestBodyEncoding {
                    reason: e.to_string(),
                }
            }),
        }
    }
}
