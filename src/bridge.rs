//! The bridge facade: configured stages over a caller-owned store.
//!
//! The host drives the flow: [`FederationBridge::prepare`] before the
//! upstream exchange, [`FederationBridge::extract`] once the response
//! headers/attributes are materialized, [`FederationBridge::validate`] to
//! produce the result. All three communicate only through the
//! [`AuthenticationContextStore`] the host threads through them.

use crate::config::BridgeConfig;
use crate::context::AuthenticationContextStore;
use crate::errors::{AuthnEvent, Result};
use crate::extract::{self, ExtractionPolicy};
use crate::negotiate::{self, AuthnRequest, RelyingPartyMappingTable};
use crate::request::{IdentityRecord, InboundRequest};
use crate::validate::{self, AuthenticationResult, ValidationPolicy};

/// A configured federated-authentication bridge.
///
/// Holds only read-only configuration; one instance serves any number of
/// concurrent attempts, each with its own store.
pub struct FederationBridge {
    extraction: ExtractionPolicy,
    validation: ValidationPolicy,
    mappings: RelyingPartyMappingTable,
}

impl FederationBridge {
    /// Build a bridge from explicit stage configuration.
    pub fn new(
        extraction: ExtractionPolicy,
        validation: ValidationPolicy,
        mappings: RelyingPartyMappingTable,
    ) -> Self {
        Self {
            extraction,
            validation,
            mappings,
        }
    }

    /// Build a bridge from a loaded configuration.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.extraction_policy(),
            config.validation_policy(),
            config.mapping_table(),
        ))
    }

    /// Negotiate the context references to request upstream.
    pub fn prepare(
        &self,
        relying_party_id: Option<&str>,
        authn_request: Option<&AuthnRequest>,
        store: &mut AuthenticationContextStore,
    ) -> std::result::Result<(), AuthnEvent> {
        negotiate::negotiate(relying_party_id, authn_request, &self.mappings, store)
    }

    /// Extract observed headers and attributes into the store.
    pub fn extract(
        &self,
        request: Option<&InboundRequest>,
        record: Option<&IdentityRecord>,
        store: &mut AuthenticationContextStore,
    ) -> std::result::Result<(), AuthnEvent> {
        extract::extract(request, record, &self.extraction, store)
    }

    /// Validate the populated store into an authentication result.
    pub fn validate(
        &self,
        store: Option<&AuthenticationContextStore>,
    ) -> std::result::Result<AuthenticationResult, AuthnEvent> {
        validate::validate(store, &self.validation)
    }
}
