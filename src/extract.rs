//! Attribute and header extraction into the context store.
//!
//! Reads observed header/attribute pairs from the inbound request (or from
//! a previously assembled identity record in delegated mode), applies the
//! configured prefix stripping and character-encoding transform, and
//! populates the shared [`AuthenticationContextStore`] in place.

use tracing::{debug, error, trace, warn};

use crate::context::{
    AuthenticationContextStore, SHIB_SP_AUTHENTICATION_INSTANT, SHIB_SP_AUTHENTICATION_METHOD,
    SHIB_SP_AUTHN_CONTEXT_CLASS, SHIB_SP_AUTHN_CONTEXT_DECL, SHIB_SP_IDENTITY_PROVIDER,
};
use crate::errors::AuthnEvent;
use crate::principal::AssertionKind;
use crate::request::{AttributeValue, IdentityRecord, InboundRequest};

/// Extraction configuration for one deployment.
#[derive(Debug, Clone, Default)]
pub struct ExtractionPolicy {
    /// Prefix stripped from the front of each observed key before
    /// interpretation (e.g. `AJP_` for AJP-proxied deployments).
    pub prefix: String,

    /// Optional character encoding name. When set, each observed value is
    /// re-encoded through this charset and read back as UTF-8 before use.
    pub encoding: Option<String>,

    /// Explicit allow-list of request attribute names to fetch. When unset
    /// no attributes are fetched at all.
    pub attribute_names: Option<Vec<String>>,

    /// When true, source data comes from a previously assembled identity
    /// record instead of live request headers.
    pub delegated_mode: bool,
}

impl ExtractionPolicy {
    /// Policy with no prefix, no transform, no attribute allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix to strip.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the value encoding transform.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the attribute-name allow-list.
    pub fn with_attribute_names(mut self, names: Vec<String>) -> Self {
        self.attribute_names = Some(names);
        self
    }

    /// Enable delegated-mode extraction.
    pub fn with_delegated_mode(mut self, delegated: bool) -> Self {
        self.delegated_mode = delegated;
        self
    }
}

/// Extract headers and attributes into the context store.
///
/// Mutates `store` in place and never replaces it. Returns `Ok(())` when a
/// usable source was processed; [`AuthnEvent::NoCredentials`] when the
/// request is missing, or in delegated mode when the identity record is
/// missing or carries no subject.
pub fn extract(
    request: Option<&InboundRequest>,
    record: Option<&IdentityRecord>,
    policy: &ExtractionPolicy,
    store: &mut AuthenticationContextStore,
) -> Result<(), AuthnEvent> {
    let Some(request) = request else {
        debug!("No inbound request available for extraction");
        return Err(AuthnEvent::NoCredentials);
    };

    if policy.delegated_mode {
        debug!("Extracting from the delegated identity record");
        let Some(record) = record else {
            error!("Delegated identity record not found");
            return Err(AuthnEvent::NoCredentials);
        };
        let Some(subject) = record.subject() else {
            error!("No subject in the delegated identity record");
            return Err(AuthnEvent::NoCredentials);
        };
        for assertion in subject.assertions(AssertionKind::Header) {
            observe(store, policy, assertion.key(), assertion.value(), true);
        }
    } else {
        debug!("Checking headers and attributes, not delegated");
        for (name, value) in request.headers() {
            observe(store, policy, name, value, true);
        }
        match &policy.attribute_names {
            Some(names) => {
                for name in names {
                    match request.attribute(name) {
                        Some(AttributeValue::Text(value)) => {
                            observe(store, policy, name, value, false);
                        }
                        _ => {
                            debug!(attribute = %name, "Ignoring request attribute");
                        }
                    }
                }
            }
            None => {
                warn!("No attribute names configured: no attributes can be resolved");
            }
        }
    }
    Ok(())
}

/// Process one observed pair: trim, strip the prefix, apply the encoding
/// transform, then set any matching well-known scalar field and store the
/// pair in the headers or attributes map.
fn observe(
    store: &mut AuthenticationContextStore,
    policy: &ExtractionPolicy,
    name: &str,
    value: &str,
    is_header: bool,
) {
    let value = value.trim();
    if value.is_empty() {
        trace!(%name, "The value is empty and will be ignored");
        return;
    }
    let key = strip_prefix(&policy.prefix, name);
    let value = match &policy.encoding {
        Some(encoding) => match transform_value(value, encoding) {
            Ok(transformed) => transformed,
            Err(err) => {
                warn!(%name, %err, "Could not transform a value");
                return;
            }
        },
        None => value.to_string(),
    };
    if value.is_empty() {
        trace!(%name, "The transformed value is empty and will be ignored");
        return;
    }

    match key {
        SHIB_SP_IDENTITY_PROVIDER => {
            debug!("Added value for the identity provider");
            store.issuer = Some(value.clone());
        }
        SHIB_SP_AUTHENTICATION_INSTANT => {
            debug!("Added value for the authentication instant");
            store.instant = Some(value.clone());
        }
        SHIB_SP_AUTHENTICATION_METHOD => {
            debug!("Added value for the authentication method");
            store.method = Some(value.clone());
        }
        SHIB_SP_AUTHN_CONTEXT_CLASS => {
            debug!("Added value for the authentication context class");
            store.context_class = Some(value.clone());
        }
        SHIB_SP_AUTHN_CONTEXT_DECL => {
            debug!("Added value for the authentication context declaration");
            store.context_decl = Some(value.clone());
        }
        _ => {}
    }

    if is_header {
        debug!(header = %key, "Added value for header");
        store.headers.insert(key.to_string(), value);
    } else {
        debug!(attribute = %key, "Added value for attribute");
        store.attributes.insert(key.to_string(), value);
    }
}

/// Strip the configured prefix from a key if present.
fn strip_prefix<'a>(prefix: &str, name: &'a str) -> &'a str {
    if prefix.is_empty() {
        return name;
    }
    name.strip_prefix(prefix).unwrap_or(name)
}

/// Re-encode a value through the named charset and read it back as UTF-8.
///
/// This undoes the common servlet-container mistake of decoding UTF-8
/// header bytes as Latin-1. Invalid UTF-8 after re-encoding degrades to
/// replacement characters rather than failing; an unknown charset name is
/// the per-value failure the caller logs and drops.
fn transform_value(value: &str, encoding: &str) -> Result<String, UnsupportedEncoding> {
    let bytes = match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => value.as_bytes().to_vec(),
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => value
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
        _ => return Err(UnsupportedEncoding(encoding.to_string())),
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Raised when the configured encoding name is not a supported charset.
#[derive(Debug, thiserror::Error)]
#[error("Unsupported encoding '{0}'")]
struct UnsupportedEncoding(String);
