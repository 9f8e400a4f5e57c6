//! Per-attempt authentication context store.
//!
//! One [`AuthenticationContextStore`] is created at the start of an
//! authentication attempt and threaded explicitly through the negotiation,
//! extraction and validation stages. The stages never call each other; this
//! store is their only shared state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session index attribute name delivered by the upstream SP layer.
pub const SHIB_SP_SESSION_INDEX: &str = "Shib-Session-Index";

/// Application id attribute name delivered by the upstream SP layer.
pub const SHIB_SP_APPLICATION_ID: &str = "Shib-Application-ID";

/// Session id attribute name delivered by the upstream SP layer.
pub const SHIB_SP_SESSION_ID: &str = "Shib-Session-ID";

/// Authentication instant attribute name.
pub const SHIB_SP_AUTHENTICATION_INSTANT: &str = "Shib-Authentication-Instant";

/// Authentication method attribute name.
pub const SHIB_SP_AUTHENTICATION_METHOD: &str = "Shib-Authentication-Method";

/// Identity provider attribute name.
pub const SHIB_SP_IDENTITY_PROVIDER: &str = "Shib-Identity-Provider";

/// Authentication context class attribute name.
pub const SHIB_SP_AUTHN_CONTEXT_CLASS: &str = "Shib-AuthnContext-Class";

/// Authentication context declaration attribute name.
pub const SHIB_SP_AUTHN_CONTEXT_DECL: &str = "Shib-AuthnContext-Decl";

/// Distinguishes the two flavors of authentication context references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextRefKind {
    /// An authentication context class reference.
    Class,
    /// An authentication context declaration reference.
    Decl,
}

/// An opaque authentication context reference, normalized to a
/// `(kind, value)` pair so mapping lookups use structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextRef {
    /// Which reference flavor this is.
    pub kind: ContextRefKind,
    /// The opaque reference token.
    pub value: String,
}

impl ContextRef {
    /// A class reference.
    pub fn class(value: impl Into<String>) -> Self {
        Self {
            kind: ContextRefKind::Class,
            value: value.into(),
        }
    }

    /// A declaration reference.
    pub fn decl(value: impl Into<String>) -> Self {
        Self {
            kind: ContextRefKind::Decl,
            value: value.into(),
        }
    }
}

/// In-memory state for one authentication attempt.
///
/// The maps start empty and the scalar fields stay unset until extraction
/// observes the corresponding well-known key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticationContextStore {
    /// Extracted HTTP header values, keyed by prefix-stripped name.
    pub headers: HashMap<String, String>,

    /// Extracted request attribute values, keyed by prefix-stripped name.
    pub attributes: HashMap<String, String>,

    /// The identity provider that authenticated the user.
    pub issuer: Option<String>,

    /// The instant the user was authenticated, as delivered (opaque).
    pub instant: Option<String>,

    /// The method the user was authenticated with.
    pub method: Option<String>,

    /// The authentication context class the user was authenticated under.
    pub context_class: Option<String>,

    /// The authentication context declaration, if delivered.
    pub context_decl: Option<String>,

    /// The context references requested in the original inbound request,
    /// class references first, each group in source order.
    pub initial_requested_context: Vec<ContextRef>,

    /// The context references to actually request from the upstream layer,
    /// after relying-party mapping.
    pub mapped_authn_context: Vec<ContextRef>,
}

impl AuthenticationContextStore {
    /// Create an empty store for a new authentication attempt.
    pub fn new() -> Self {
        Self::default()
    }
}
