//! Requested authentication-context negotiation.
//!
//! Runs during request preparation, before the upstream exchange: reads the
//! context references requested by the original authentication request,
//! consults the per-relying-party mapping table and writes both the initial
//! and the mapped reference lists into the context store.

use std::collections::HashMap;

use tracing::debug;

use crate::context::{AuthenticationContextStore, ContextRef};
use crate::errors::AuthnEvent;

/// The requested-authentication-context structure of an inbound request:
/// an ordered list of class references and an ordered list of declaration
/// references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedAuthnContext {
    class_refs: Vec<String>,
    decl_refs: Vec<String>,
}

impl RequestedAuthnContext {
    /// An empty requested-context structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class reference, preserving order.
    pub fn with_class_ref(mut self, value: impl Into<String>) -> Self {
        self.class_refs.push(value.into());
        self
    }

    /// Append a declaration reference, preserving order.
    pub fn with_decl_ref(mut self, value: impl Into<String>) -> Self {
        self.decl_refs.push(value.into());
        self
    }

    /// The class references in source order.
    pub fn class_refs(&self) -> &[String] {
        &self.class_refs
    }

    /// The declaration references in source order.
    pub fn decl_refs(&self) -> &[String] {
        &self.decl_refs
    }
}

/// The inbound authentication request as seen by the negotiator.
#[derive(Debug, Clone, Default)]
pub struct AuthnRequest {
    requested_context: Option<RequestedAuthnContext>,
}

impl AuthnRequest {
    /// A request carrying no requested-context structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a requested-context structure.
    pub fn with_requested_context(mut self, context: RequestedAuthnContext) -> Self {
        self.requested_context = Some(context);
        self
    }

    /// The requested-context structure, if the request carried one.
    pub fn requested_context(&self) -> Option<&RequestedAuthnContext> {
        self.requested_context.as_ref()
    }
}

/// Context-reference mappings for one relying party.
#[derive(Debug, Clone, Default)]
pub struct RpMappings {
    absent: Option<ContextRef>,
    by_ref: HashMap<ContextRef, ContextRef>,
}

impl RpMappings {
    /// Empty mapping set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the distinguished "absent" key: the reference to request when
    /// the inbound request carried no requested context at all.
    pub fn with_absent(mut self, mapped: ContextRef) -> Self {
        self.absent = Some(mapped);
        self
    }

    /// Map one exact reference to its replacement.
    pub fn with_mapping(mut self, from: ContextRef, to: ContextRef) -> Self {
        self.by_ref.insert(from, to);
        self
    }

    /// The absent-key mapping, if configured.
    pub fn absent(&self) -> Option<&ContextRef> {
        self.absent.as_ref()
    }

    /// Exact-match lookup on `(kind, value)` identity. No partial or
    /// prefix matching.
    pub fn lookup(&self, reference: &ContextRef) -> Option<&ContextRef> {
        self.by_ref.get(reference)
    }
}

/// Mapping from relying-party identifier to its context-reference
/// mappings. Loaded once at startup, read-only during request processing.
#[derive(Debug, Clone, Default)]
pub struct RelyingPartyMappingTable {
    by_rp: HashMap<String, RpMappings>,
}

impl RelyingPartyMappingTable {
    /// Empty table: no rewriting for any relying party.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mappings for one relying party.
    pub fn with_relying_party(mut self, rp_id: impl Into<String>, mappings: RpMappings) -> Self {
        self.by_rp.insert(rp_id.into(), mappings);
        self
    }

    /// The mappings for a relying party; absence means no rewriting.
    pub fn for_relying_party(&self, rp_id: &str) -> Option<&RpMappings> {
        self.by_rp.get(rp_id)
    }
}

/// Negotiate the authentication-context references to request upstream.
///
/// Writes `initial_requested_context` and `mapped_authn_context` into the
/// store. Fails with [`AuthnEvent::InvalidRelyingParty`] when the relying
/// party cannot be resolved to a non-empty identifier, and with
/// [`AuthnEvent::InvalidProfileContext`] when the inbound authentication
/// request object is missing.
pub fn negotiate(
    relying_party_id: Option<&str>,
    authn_request: Option<&AuthnRequest>,
    table: &RelyingPartyMappingTable,
    store: &mut AuthenticationContextStore,
) -> Result<(), AuthnEvent> {
    let rp_id = match relying_party_id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => {
            debug!("No relying party context or relying party entity id");
            return Err(AuthnEvent::InvalidRelyingParty);
        }
    };
    let Some(authn_request) = authn_request else {
        debug!("The inbound authentication request could not be resolved");
        return Err(AuthnEvent::InvalidProfileContext);
    };

    let rp_mappings = table.for_relying_party(rp_id);
    debug!(
        relying_party = %rp_id,
        has_mappings = rp_mappings.is_some(),
        "Resolved relying party specific mappings"
    );

    let mut initial = Vec::new();
    let mut mapped = Vec::new();

    match authn_request.requested_context() {
        None => {
            debug!("No requested authentication context in the request");
            if let Some(replacement) = rp_mappings.and_then(RpMappings::absent) {
                debug!(mapped = %replacement.value, "Empty requested context mapped");
                mapped.push(replacement.clone());
            }
        }
        Some(requested) => {
            for value in requested.class_refs() {
                map_reference(ContextRef::class(value), rp_mappings, &mut initial, &mut mapped);
            }
            for value in requested.decl_refs() {
                map_reference(ContextRef::decl(value), rp_mappings, &mut initial, &mut mapped);
            }
        }
    }

    store.initial_requested_context = initial;
    store.mapped_authn_context = mapped;
    Ok(())
}

/// Record one requested reference and its mapped counterpart.
fn map_reference(
    reference: ContextRef,
    rp_mappings: Option<&RpMappings>,
    initial: &mut Vec<ContextRef>,
    mapped: &mut Vec<ContextRef>,
) {
    debug!(reference = %reference.value, "Initial request contained a context reference");
    match rp_mappings.and_then(|m| m.lookup(&reference)) {
        Some(replacement) => {
            debug!(mapped = %replacement.value, "Initial requested context mapped");
            mapped.push(replacement.clone());
        }
        None => {
            debug!("Initial requested context preserved without mapping");
            mapped.push(reference.clone());
        }
    }
    initial.push(reference);
}
