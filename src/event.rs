//! Transport-level event envelope.
//!
//! An [`Event`] wraps a serialized payload together with a mimetype tag and a
//! creation timestamp. Payloads are opaque to the bus; the typed
//! `encode`/`decode` helpers own the serialization contract and validate it
//! on the way back out.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CodecError;

/// Unique identifier for an event.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new random event id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content type of an event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mimetype {
    /// UTF-8 JSON.
    ApplicationJson,
    /// Uninterpreted bytes.
    ApplicationOctetStream,
}

impl Mimetype {
    /// The canonical MIME string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationJson => "application/json",
            Self::ApplicationOctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for Mimetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport envelope: payload bytes, mimetype, id, and creation time.
///
/// Events are created by the sending component, owned by the bus during
/// transit, and discarded after the receiver processes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, assigned at creation.
    pub event_id: EventId,

    /// Content type of `data`.
    pub mimetype: Mimetype,

    /// Serialized payload.
    pub data: Vec<u8>,

    /// When the sending component created this event.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates an event from raw bytes.
    #[must_use]
    pub fn new(data: Vec<u8>, mimetype: Mimetype) -> Self {
        Self {
            event_id: EventId::new(),
            mimetype,
            data,
            created_at: Utc::now(),
        }
    }

    /// Encodes a payload as a JSON event.
    pub fn encode_json<T: Serialize>(payload: &T) -> Result<Self, CodecError> {
        let data = serde_json::to_vec(payload).map_err(|e| CodecError::SerializationFailed {
            message: e.to_string(),
        })?;
        Ok(Self::new(data, Mimetype::ApplicationJson))
    }

    /// Decodes a JSON payload, validating the mimetype first.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        if self.mimetype != Mimetype::ApplicationJson {
            return Err(CodecError::UnexpectedMimetype {
                expected: Mimetype::ApplicationJson.as_str().to_string(),
                actual: self.mimetype.as_str().to_string(),
            });
        }

        serde_json::from_slice(&self.data).map_err(|e| CodecError::DeserializationFailed {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, Sentiment};

    #[test]
    fn encode_then_decode_preserves_record() {
        let record = Record::new("the pasta was cold", Sentiment::Negative);
        let event = Event::encode_json(&record).unwrap();
        assert_eq!(event.mimetype, Mimetype::ApplicationJson);

        let decoded: Record = event.decode_json().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_rejects_wrong_mimetype() {
        let event = Event::new(b"{}".to_vec(), Mimetype::ApplicationOctetStream);
        let err = event.decode_json::<Record>().unwrap_err();
        let CodecError::UnexpectedMimetype { expected, actual } = err else {
            panic!("expected UnexpectedMimetype, got {err:?}");
        };
        assert_eq!(expected, "application/json");
        assert_eq!(actual, "application/octet-stream");
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let event = Event::new(b"{not json".to_vec(), Mimetype::ApplicationJson);
        let err = event.decode_json::<Record>().unwrap_err();
        assert!(matches!(err, CodecError::DeserializationFailed { .. }));
    }

    #[test]
    fn decode_rejects_schema_mismatch() {
        // Valid JSON, wrong shape for a Record.
        let event = Event::new(b"{\"precision\": 0.5}".to_vec(), Mimetype::ApplicationJson);
        assert!(event.decode_json::<Record>().is_err());
    }

    #[test]
    fn events_get_distinct_ids() {
        let a = Event::new(Vec::new(), Mimetype::ApplicationJson);
        let b = Event::new(Vec::new(), Mimetype::ApplicationJson);
        assert_ne!(a.event_id, b.event_id);
    }
}
