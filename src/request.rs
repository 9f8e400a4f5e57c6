//! Inbound request and delegated identity-record seam types.
//!
//! The host materializes these before invoking the pipeline; no I/O happens
//! inside the bridge. [`InboundRequest`] mirrors the servlet-style surface
//! of the upstream layer (ordered headers plus named request attributes).
//! [`IdentityRecord`] is the delegated-mode source: an assertion set built
//! earlier in the flow, typically by [`IdentityRecord::from_request`].

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::principal::{AssertionKind, KeyValueAssertion, Principal, Subject};

/// The header name carrying the web server's resolved remote user.
pub const HEADER_NAME_REMOTE_USER: &str = "REMOTE_USER";

/// A named request-scoped attribute value.
///
/// Only string-valued attributes are usable by extraction; opaque values
/// are carried so the seam can represent them but are always skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// A string attribute value.
    Text(String),
    /// A non-string attribute value, never extracted.
    Opaque,
}

/// A materialized inbound request: ordered headers, named attributes and
/// the transport-level remote user.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    headers: Vec<(String, String)>,
    attributes: HashMap<String, AttributeValue>,
    remote_user: Option<String>,
}

impl InboundRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, preserving insertion order.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a string-valued request attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), AttributeValue::Text(value.into()));
        self
    }

    /// Add a non-string request attribute.
    pub fn with_opaque_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), AttributeValue::Opaque);
        self
    }

    /// Set the transport-level remote user.
    pub fn with_remote_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = Some(user.into());
        self
    }

    /// The headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The first value of the named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The named request attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// The transport-level remote user, if any.
    pub fn remote_user(&self) -> Option<&str> {
        self.remote_user.as_deref()
    }
}

/// A previously assembled identity record, used as the extraction source in
/// delegated mode.
#[derive(Debug, Clone, Default)]
pub struct IdentityRecord {
    subject: Option<Subject>,
}

impl IdentityRecord {
    /// Wrap an already assembled subject.
    pub fn new(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
        }
    }

    /// A record carrying no subject. Extraction treats this as missing
    /// credentials.
    pub fn empty() -> Self {
        Self { subject: None }
    }

    /// The assertion-bearing subject, if one was assembled.
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// The resolved username fact, if one was added.
    pub fn username(&self) -> Option<&str> {
        self.subject.as_ref().and_then(|s| s.username())
    }

    /// Assemble a record from an inbound request.
    ///
    /// The username is taken from the `REMOTE_USER` header, falling back to
    /// the transport remote user; a blank username is simply omitted. Every
    /// header with a non-empty value becomes a header-kind assertion.
    pub fn from_request(request: &InboundRequest) -> Self {
        let mut subject = Subject::new();
        trace!(
            remote_user_header = ?request.header(HEADER_NAME_REMOTE_USER),
            "Assembling identity record from request"
        );
        let username = request
            .header(HEADER_NAME_REMOTE_USER)
            .or_else(|| request.remote_user())
            .map(str::trim)
            .filter(|u| !u.is_empty());
        if let Some(username) = username {
            subject.add(Principal::Username(username.to_string()));
            debug!(%username, "User identity extracted from REMOTE_USER");
        } else {
            debug!("No remote user provided");
        }

        for (name, value) in request.headers() {
            trace!(header = %name, %value, "Observed header");
            if let Ok(assertion) = KeyValueAssertion::new(AssertionKind::Header, name, value) {
                subject.add(Principal::KeyValue(assertion));
                debug!(header = %name, "Header added to the set of principals");
            }
        }
        Self::new(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_keeps_first_value() {
        let request = InboundRequest::new()
            .with_header("X-Test", "first")
            .with_header("X-Test", "second");
        assert_eq!(request.header("X-Test"), Some("first"));
        assert_eq!(request.headers().len(), 2);
    }

    #[test]
    fn test_record_from_request_with_remote_user_header() {
        let request = InboundRequest::new()
            .with_header(HEADER_NAME_REMOTE_USER, "mockUser")
            .with_header("X-Custom", "mockValue");
        let record = IdentityRecord::from_request(&request);
        assert_eq!(record.username(), Some("mockUser"));
        let subject = record.subject().unwrap();
        // the username and two header assertions
        assert_eq!(subject.len(), 3);
        assert_eq!(subject.assertions(AssertionKind::Header).count(), 2);
    }

    #[test]
    fn test_record_falls_back_to_transport_remote_user() {
        let request = InboundRequest::new()
            .with_remote_user("transportUser")
            .with_header("X-Custom", "mockValue");
        let record = IdentityRecord::from_request(&request);
        assert_eq!(record.username(), Some("transportUser"));
    }

    #[test]
    fn test_record_skips_blank_username_and_empty_headers() {
        let request = InboundRequest::new()
            .with_header(HEADER_NAME_REMOTE_USER, "  ")
            .with_header("X-Empty", "")
            .with_header("X-Custom", "mockValue");
        let record = IdentityRecord::from_request(&request);
        assert_eq!(record.username(), None);
        let subject = record.subject().unwrap();
        assert_eq!(subject.assertions(AssertionKind::Header).count(), 1);
    }

    #[test]
    fn test_empty_record_has_no_subject() {
        assert!(IdentityRecord::empty().subject().is_none());
    }
}
