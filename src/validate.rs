//! Validation of an extracted authentication attempt.
//!
//! Consumes the populated [`AuthenticationContextStore`], resolves the
//! subject's username from a configured candidate list and assembles the
//! principal set into an [`AuthenticationResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::context::AuthenticationContextStore;
use crate::errors::AuthnEvent;
use crate::principal::{AssertionKind, KeyValueAssertion, Principal, Subject};

/// The delimiter separating candidate names in `username_attributes`.
pub const USERNAME_DELIMITER: &str = ",";

/// Validation configuration for one deployment.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    /// The attribute name containing the user identifier, or a
    /// comma-delimited ordered list of candidate names.
    pub username_attributes: String,

    /// Populate the subject with one attribute-kind assertion per
    /// extracted attribute.
    pub populate_attributes: bool,

    /// Populate the subject with one header-kind assertion per extracted
    /// header.
    pub populate_headers: bool,
}

impl ValidationPolicy {
    /// Policy resolving the username from the given attribute name(s).
    pub fn new(username_attributes: impl Into<String>) -> Self {
        Self {
            username_attributes: username_attributes.into(),
            populate_attributes: false,
            populate_headers: false,
        }
    }

    /// Include all extracted attributes in the subject.
    pub fn with_populate_attributes(mut self, populate: bool) -> Self {
        self.populate_attributes = populate;
        self
    }

    /// Include all extracted headers in the subject.
    pub fn with_populate_headers(mut self, populate: bool) -> Self {
        self.populate_headers = populate;
        self
    }
}

/// A validated authentication result: the assembled subject and the moment
/// validation succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    /// The principal set of the authenticated subject.
    pub subject: Subject,

    /// When the result was produced.
    pub authenticated_at: DateTime<Utc>,
}

impl AuthenticationResult {
    /// Wrap a subject with the current timestamp.
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            authenticated_at: Utc::now(),
        }
    }
}

/// Validate the populated context store and assemble the principal set.
///
/// Fails with [`AuthnEvent::InvalidAuthnContext`] when no store is
/// attached to the attempt and [`AuthnEvent::NoCredentials`] when no
/// configured username candidate is present in either map. Every other
/// degenerate condition (empty maps, partial candidate misses) degrades to
/// `NoCredentials` rather than a distinct error.
pub fn validate(
    store: Option<&AuthenticationContextStore>,
    policy: &ValidationPolicy,
) -> Result<AuthenticationResult, AuthnEvent> {
    let Some(store) = store else {
        debug!("No authentication context store available for validation");
        return Err(AuthnEvent::InvalidAuthnContext);
    };

    let username = username_from_map(&store.attributes, &policy.username_attributes)
        .or_else(|| username_from_map(&store.headers, &policy.username_attributes));
    let Some(username) = username else {
        debug!("Username not found in attributes or headers");
        return Err(AuthnEvent::NoCredentials);
    };

    let mut subject = Subject::new();
    subject.add(Principal::Username(username.to_string()));
    if policy.populate_attributes {
        debug!("Populating the attribute principals into the subject");
        populate(&mut subject, &store.attributes, AssertionKind::Attribute);
    }
    if policy.populate_headers {
        debug!("Populating the header principals into the subject");
        populate(&mut subject, &store.headers, AssertionKind::Header);
    }
    Ok(AuthenticationResult::new(subject))
}

/// Resolve the username from one map using the configured candidate names.
///
/// A configuration containing the delimiter is scanned candidate by
/// candidate in order; one without it is a single direct lookup. The two
/// paths are mutually exclusive: a delimited configuration is never
/// retried as one literal name.
fn username_from_map<'a>(map: &'a HashMap<String, String>, configured: &str) -> Option<&'a str> {
    if configured.contains(USERNAME_DELIMITER) {
        trace!("Multiple username attributes configured, browsing through the set");
        for candidate in configured.split(USERNAME_DELIMITER) {
            if candidate.is_empty() {
                continue;
            }
            trace!(%candidate, "Checking whether the candidate exists in the map");
            if let Some(value) = map.get(candidate) {
                return Some(value);
            }
        }
        None
    } else {
        trace!("Single username attribute configured, returning its value from the map");
        map.get(configured).map(String::as_str)
    }
}

/// Add one assertion per map entry to the subject, as a set.
fn populate(subject: &mut Subject, map: &HashMap<String, String>, kind: AssertionKind) {
    for (key, value) in map {
        trace!(%key, "Adding principal to the set");
        if let Ok(assertion) = KeyValueAssertion::new(kind, key, value) {
            subject.add(Principal::KeyValue(assertion));
        }
    }
}
