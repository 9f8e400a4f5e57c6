//! Principal types carried by an authentication result.
//!
//! A [`KeyValueAssertion`] is one externally supplied identity fact (an HTTP
//! header or a request attribute) expressed as a typed key/value pair. The
//! original upstream layer delivers these out-of-band; the bridge only
//! normalizes and carries them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{BridgeError, Result};

/// The string separating key and value in an assertion's combined name.
pub const SEPARATOR: &str = "<=>";

/// Discriminates where a key/value assertion was observed.
///
/// Kind participates in equality: a header-kind and an attribute-kind
/// assertion built from the same key/value are never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// Sourced from an HTTP header.
    Header,
    /// Sourced from a request-scoped attribute.
    Attribute,
}

/// An immutable key/value identity fact.
///
/// Both parts are trimmed on construction and are never empty afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValueAssertion {
    key: String,
    value: String,
    kind: AssertionKind,
}

impl KeyValueAssertion {
    /// Build an assertion from separate key and value parts.
    ///
    /// Fails if either part trims to empty.
    pub fn new(
        kind: AssertionKind,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into().trim().to_string();
        let value = value.into().trim().to_string();
        if key.is_empty() {
            return Err(BridgeError::invalid_assertion("Key cannot be null or empty"));
        }
        if value.is_empty() {
            return Err(BridgeError::invalid_assertion(
                "Value cannot be null or empty",
            ));
        }
        Ok(Self { key, value, kind })
    }

    /// Build an assertion from a combined `key<=>value` name.
    ///
    /// The separator must occur exactly once and both sides must trim to
    /// non-empty strings.
    pub fn from_name(kind: AssertionKind, name: &str) -> Result<Self> {
        let mut parts = name.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => Self::new(kind, key, value),
            _ => Err(BridgeError::invalid_assertion(format!(
                "Incompatible name given, cannot be divided by {SEPARATOR}"
            ))),
        }
    }

    /// The combined `key<=>value` name.
    pub fn name(&self) -> String {
        format!("{}{}{}", self.key, SEPARATOR, self.value)
    }

    /// The key part of the pair.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value part of the pair.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Where this assertion was observed.
    pub fn kind(&self) -> AssertionKind {
        self.kind
    }
}

/// A typed fact about the authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Principal {
    /// The resolved username of the subject.
    Username(String),
    /// A header- or attribute-derived identity fact.
    KeyValue(KeyValueAssertion),
}

/// The set of principals assembled for one authenticated subject.
///
/// Set semantics: duplicate facts collapse, with [`AssertionKind`]
/// discriminating between header- and attribute-derived duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    principals: HashSet<Principal>,
}

impl Subject {
    /// Create an empty subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a principal to the set.
    pub fn add(&mut self, principal: Principal) {
        self.principals.insert(principal);
    }

    /// The first username principal, if any.
    pub fn username(&self) -> Option<&str> {
        self.principals.iter().find_map(|p| match p {
            Principal::Username(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Iterate over the key/value assertions of the given kind.
    pub fn assertions(&self, kind: AssertionKind) -> impl Iterator<Item = &KeyValueAssertion> {
        self.principals.iter().filter_map(move |p| match p {
            Principal::KeyValue(kv) if kv.kind() == kind => Some(kv),
            _ => None,
        })
    }

    /// All principals in the set.
    pub fn principals(&self) -> &HashSet<Principal> {
        &self.principals
    }

    /// Number of principals in the set.
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}
