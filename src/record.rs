//! Labeled training records.
//!
//! A [`Record`] is the immutable unit of training data flowing through the
//! input topic: a piece of text plus a binary sentiment label. Fields beyond
//! the two the learner needs are carried through untouched so upstream
//! sources can attach arbitrary metadata.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Binary sentiment label.
///
/// The wire format is the integer `0` (negative) or `1` (positive); any
/// other value fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    /// Both labels, in wire order.
    pub const ALL: [Self; 2] = [Self::Negative, Self::Positive];

    /// The label's wire encoding.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    /// The other label.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Positive => Self::Negative,
        }
    }
}

impl From<Sentiment> for u8 {
    fn from(label: Sentiment) -> Self {
        label.as_u8()
    }
}

impl TryFrom<u8> for Sentiment {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Negative),
            1 => Ok(Self::Positive),
            other => Err(CodecError::LabelOutOfRange { value: other }),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// An immutable labeled text record.
///
/// Produced once by the publisher, consumed once per delivery by the learner.
/// Unknown payload fields are preserved in `extra` and re-emitted verbatim on
/// serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The raw document text.
    pub text: String,

    /// The true label for this document.
    pub sentiment: Sentiment,

    /// Passthrough fields from the source dataset.
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Creates a record with no passthrough fields.
    #[must_use]
    pub fn new(text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            text: text.into(),
            sentiment,
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_round_trips_through_wire_encoding() {
        for label in Sentiment::ALL {
            let wire = u8::from(label);
            assert_eq!(Sentiment::try_from(wire).unwrap(), label);
        }
    }

    #[test]
    fn sentiment_rejects_out_of_range_values() {
        let err = Sentiment::try_from(2).unwrap_err();
        let CodecError::LabelOutOfRange { value } = err else {
            panic!("expected LabelOutOfRange, got {err:?}");
        };
        assert_eq!(value, 2);
    }

    #[test]
    fn record_serializes_sentiment_as_integer() {
        let record = Record::new("great food", Sentiment::Positive);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sentiment"], serde_json::json!(1));
        assert_eq!(json["text"], serde_json::json!("great food"));
    }

    #[test]
    fn record_preserves_passthrough_fields() {
        let json = r#"{"text": "meh", "sentiment": 0, "stars": 2, "source": "yelp"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.extra["stars"], serde_json::json!(2));

        let round_tripped = serde_json::to_value(&record).unwrap();
        assert_eq!(round_tripped["source"], serde_json::json!("yelp"));
    }

    #[test]
    fn record_with_bad_label_fails_to_decode() {
        let json = r#"{"text": "x", "sentiment": 3}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }
}
