/*!
# Authn Bridge

A federated-authentication bridge for host identity providers that sit
behind an upstream access-control layer (a Shibboleth-style service
provider). The upstream layer performs the actual federated exchange and
delivers identity assertions out-of-band as HTTP headers and request
attributes; this crate normalizes them into a validated authentication
result.

The pipeline has three stages, communicating only through a per-attempt
[`AuthenticationContextStore`]:

1. **Negotiation** ([`negotiate`]) — during request preparation, resolve
   the requested authentication-context references against a per-relying-
   party mapping table.
2. **Extraction** ([`extract`]) — once the upstream response is available,
   read headers/attributes (or a previously assembled identity record in
   delegated mode), strip configured prefixes, apply the encoding
   transform and populate the store.
3. **Validation** ([`validate`]) — resolve the username from a configured
   candidate list and assemble the principal set into an
   [`AuthenticationResult`].

Each stage either completes or returns one terminal [`AuthnEvent`]; the
host owns recovery. Key/value assertions persist across process
boundaries through the JSON [`codec`], which round-trips bit-exactly.

## Quick Start

```rust
use authn_bridge::{
    AuthenticationContextStore, AuthnRequest, BridgeConfig, FederationBridge, InboundRequest,
};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let config = BridgeConfig::from_toml_str(
    r#"
    prefix = "AJP_"
    attribute_names = ["uid"]
    username_attribute_names = "uid"
    populate_attributes = true
    "#,
)?;
let bridge = FederationBridge::from_config(&config)?;

let mut store = AuthenticationContextStore::new();
bridge
    .prepare(Some("https://sp.example.org"), Some(&AuthnRequest::new()), &mut store)
    .map_err(|e| format!("negotiation failed: {e}"))?;

// ... the upstream layer performs the federated exchange ...

let request = InboundRequest::new()
    .with_header("AJP_Shib-Identity-Provider", "https://idp.example.org")
    .with_attribute("uid", "alice");
bridge
    .extract(Some(&request), None, &mut store)
    .map_err(|e| format!("extraction failed: {e}"))?;

let result = bridge
    .validate(Some(&store))
    .map_err(|e| format!("validation failed: {e}"))?;
assert_eq!(result.subject.username(), Some("alice"));
# Ok(())
# }
```

This crate performs no credential verification of its own: trust in the
upstream layer's assertions is assumed, and the outer protocol exchange,
session lifecycle and storage belong to the host.
*/

pub mod bridge;
pub mod codec;
pub mod config;
pub mod context;
pub mod errors;
pub mod extract;
pub mod negotiate;
pub mod principal;
pub mod request;
pub mod validate;

pub use bridge::FederationBridge;
pub use codec::{CodecRegistry, KeyValueCodec};
pub use config::{AbsentMapping, BridgeConfig, RelyingPartyMappingConfig};
pub use context::{AuthenticationContextStore, ContextRef, ContextRefKind};
pub use errors::{AuthnEvent, BridgeError, Outcome, Result};
pub use extract::{extract, ExtractionPolicy};
pub use negotiate::{negotiate, AuthnRequest, RelyingPartyMappingTable, RequestedAuthnContext, RpMappings};
pub use principal::{AssertionKind, KeyValueAssertion, Principal, Subject, SEPARATOR};
pub use request::{AttributeValue, IdentityRecord, InboundRequest, HEADER_NAME_REMOTE_USER};
pub use validate::{validate, AuthenticationResult, ValidationPolicy, USERNAME_DELIMITER};
