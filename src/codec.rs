//! Serialization of key/value assertions for cross-process persistence.
//!
//! Each [`AssertionKind`] has its own pair of JSON field names so the two
//! subtypes stay textually distinguishable in storage. The encoding is a
//! two-field JSON object and must round-trip bit-exactly:
//! `{"shibHeaderKey":"k","shibHeaderValue":"v"}` for header-kind,
//! `{"shibAttrKey":"k","shibAttrValue":"v"}` for attribute-kind.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::errors::{BridgeError, Result};
use crate::principal::{AssertionKind, KeyValueAssertion};

/// Codec for one assertion kind.
pub struct KeyValueCodec {
    kind: AssertionKind,
    key_field: &'static str,
    value_field: &'static str,
    pattern: Regex,
}

impl KeyValueCodec {
    /// Codec for header-kind assertions.
    pub fn header() -> Self {
        Self::for_fields(AssertionKind::Header, "shibHeaderKey", "shibHeaderValue")
    }

    /// Codec for attribute-kind assertions.
    pub fn attribute() -> Self {
        Self::for_fields(AssertionKind::Attribute, "shibAttrKey", "shibAttrValue")
    }

    fn for_fields(kind: AssertionKind, key_field: &'static str, value_field: &'static str) -> Self {
        let pattern = format!("^\\{{\"{key_field}\":.*,\"{value_field}\":.*\\}}$");
        Self {
            kind,
            key_field,
            value_field,
            // The pattern is assembled from fixed field names.
            pattern: Regex::new(&pattern).expect("invalid codec pattern"),
        }
    }

    /// The assertion kind this codec handles.
    pub fn kind(&self) -> AssertionKind {
        self.kind
    }

    /// Fast pre-check: does the serialized text have this codec's shape?
    pub fn supports(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Serialize an assertion into its two-field JSON object.
    ///
    /// The assertion's kind must match this codec's kind.
    pub fn serialize(&self, assertion: &KeyValueAssertion) -> Result<String> {
        if assertion.kind() != self.kind {
            return Err(BridgeError::invalid_assertion(format!(
                "Codec for {:?} cannot serialize a {:?} assertion",
                self.kind,
                assertion.kind()
            )));
        }
        trace!(name = %assertion.name(), "Attempting to serialize assertion");
        let mut object = Map::new();
        object.insert(
            self.key_field.to_string(),
            Value::String(assertion.key().to_string()),
        );
        object.insert(
            self.value_field.to_string(),
            Value::String(assertion.value().to_string()),
        );
        let serialized = serde_json::to_string(&Value::Object(object))?;
        trace!(%serialized, "Successfully built serialized assertion");
        Ok(serialized)
    }

    /// Deserialize an assertion from its JSON object form.
    ///
    /// Returns `Ok(None)` when the object parses but either named field is
    /// missing, not a string or empty, so a caller can try the next codec.
    /// Unparseable or non-object input is a hard [`BridgeError::Decode`].
    pub fn deserialize(&self, text: &str) -> Result<Option<KeyValueAssertion>> {
        trace!(%text, "Attempting to deserialize assertion");
        let parsed: Value = serde_json::from_str(text).map_err(|e| {
            warn!("Could not parse a JSON structure from serialized value");
            BridgeError::decode(format!("Invalid serialized assertion: {e}"))
        })?;
        let Value::Object(object) = parsed else {
            warn!("Could not parse a JSON object from serialized value");
            return Err(BridgeError::decode(
                "Found invalid data structure while parsing an assertion",
            ));
        };
        let key = object.get(self.key_field).and_then(Value::as_str);
        let value = object.get(self.value_field).and_then(Value::as_str);
        match (key, value) {
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                Ok(Some(KeyValueAssertion::new(self.kind, key, value)?))
            }
            _ => Ok(None),
        }
    }
}

/// Ordered list of codecs covering the union of assertion kinds.
///
/// Decoding tries each codec's [`KeyValueCodec::supports`] pre-check in
/// registration order and deserializes with the first match.
pub struct CodecRegistry {
    codecs: Vec<KeyValueCodec>,
}

impl CodecRegistry {
    /// Registry with the header and attribute codecs registered.
    pub fn new() -> Self {
        Self {
            codecs: vec![KeyValueCodec::header(), KeyValueCodec::attribute()],
        }
    }

    /// Serialize an assertion with the codec matching its kind.
    pub fn encode(&self, assertion: &KeyValueAssertion) -> Result<String> {
        let codec = self
            .codecs
            .iter()
            .find(|c| c.kind() == assertion.kind())
            .ok_or_else(|| {
                BridgeError::invalid_assertion(format!(
                    "No codec registered for kind {:?}",
                    assertion.kind()
                ))
            })?;
        codec.serialize(assertion)
    }

    /// Decode serialized text with the first codec whose shape matches.
    ///
    /// Returns `Ok(None)` when no registered codec recognizes the shape, or
    /// when the matching codec finds the named fields unusable.
    pub fn decode(&self, text: &str) -> Result<Option<KeyValueAssertion>> {
        for codec in &self.codecs {
            if codec.supports(text) {
                return codec.deserialize(text);
            }
        }
        trace!(%text, "No registered codec supports the serialized value");
        Ok(None)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
