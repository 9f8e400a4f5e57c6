//! End-to-end pipeline tests: negotiation, extraction and validation over
//! one shared context store, plus cross-process persistence of the
//! resulting principals through the codec.

use authn_bridge::{
    AssertionKind, AuthenticationContextStore, AuthnEvent, AuthnRequest, BridgeConfig,
    CodecRegistry, ContextRef, FederationBridge, IdentityRecord, InboundRequest, Outcome,
    Principal, RequestedAuthnContext,
};

const RP_ID: &str = "mockRelyingParty";

fn bridge_config(extra: &str) -> BridgeConfig {
    let toml = format!(
        r#"
        prefix = "AJP_"
        attribute_names = ["mockAttribute"]
        username_attribute_names = "mockAttribute"
        populate_attributes = true
        {extra}
        "#
    );
    BridgeConfig::from_toml_str(&toml).expect("config should parse")
}

#[test]
fn full_attempt_with_prefixed_headers() {
    let bridge = FederationBridge::from_config(&bridge_config("")).unwrap();
    let mut store = AuthenticationContextStore::new();

    // stage 1: negotiation, before the upstream exchange
    bridge
        .prepare(Some(RP_ID), Some(&AuthnRequest::new()), &mut store)
        .expect("negotiation should proceed");

    // stage 2: the upstream layer delivered headers and attributes
    let request = InboundRequest::new()
        .with_header("AJP_Shib-Identity-Provider", "mockIdp")
        .with_attribute("mockAttribute", "mockAttribute");
    bridge
        .extract(Some(&request), None, &mut store)
        .expect("extraction should proceed");

    assert_eq!(store.issuer.as_deref(), Some("mockIdp"));
    assert_eq!(
        store.attributes.get("mockAttribute").map(String::as_str),
        Some("mockAttribute")
    );

    // stage 3: validation assembles the principal set
    let result = bridge.validate(Some(&store)).expect("validation should proceed");
    assert_eq!(result.subject.username(), Some("mockAttribute"));

    let attribute_assertions: Vec<_> = result.subject.assertions(AssertionKind::Attribute).collect();
    assert_eq!(attribute_assertions.len(), 1);
    assert_eq!(attribute_assertions[0].key(), "mockAttribute");
}

#[test]
fn negotiation_rewrites_per_relying_party() {
    let config = bridge_config(&format!(
        r#"
        [relying_party_mappings."{RP_ID}".classes]
        "urn:oasis:names:tc:SAML:2.0:ac:classes:Password" = "urn:example:mfa"
        "#
    ));
    let bridge = FederationBridge::from_config(&config).unwrap();
    let mut store = AuthenticationContextStore::new();

    let request = AuthnRequest::new().with_requested_context(
        RequestedAuthnContext::new()
            .with_class_ref("urn:oasis:names:tc:SAML:2.0:ac:classes:Password")
            .with_class_ref("urn:example:other")
            .with_decl_ref("urn:example:decl"),
    );
    bridge.prepare(Some(RP_ID), Some(&request), &mut store).unwrap();

    assert_eq!(
        store.initial_requested_context,
        vec![
            ContextRef::class("urn:oasis:names:tc:SAML:2.0:ac:classes:Password"),
            ContextRef::class("urn:example:other"),
            ContextRef::decl("urn:example:decl"),
        ]
    );
    assert_eq!(
        store.mapped_authn_context,
        vec![
            ContextRef::class("urn:example:mfa"),
            ContextRef::class("urn:example:other"),
            ContextRef::decl("urn:example:decl"),
        ]
    );
}

#[test]
fn delegated_attempt_round_trips_through_codec() {
    // first process: a request is distilled into an identity record whose
    // principals are persisted through the codec
    let inbound = InboundRequest::new()
        .with_header("REMOTE_USER", "mockUser")
        .with_header("AJP_Shib-Identity-Provider", "mockIdp")
        .with_header("AJP_mockHeader", "mockValue");
    let record = IdentityRecord::from_request(&inbound);
    let subject = record.subject().unwrap();

    let registry = CodecRegistry::new();
    let persisted: Vec<String> = subject
        .principals()
        .iter()
        .filter_map(|p| match p {
            Principal::KeyValue(kv) => Some(registry.encode(kv).unwrap()),
            Principal::Username(_) => None,
        })
        .collect();
    assert_eq!(persisted.len(), 3);

    // second process: the record is rebuilt from the persisted assertions
    let mut rebuilt = authn_bridge::Subject::new();
    for text in &persisted {
        let assertion = registry.decode(text).unwrap().expect("codec should match");
        rebuilt.add(Principal::KeyValue(assertion));
    }
    let record = IdentityRecord::new(rebuilt);

    // delegated-mode extraction over the rebuilt record
    let config = BridgeConfig::from_toml_str(
        r#"
        prefix = "AJP_"
        delegated_mode = true
        username_attribute_names = "mockHeader"
        populate_headers = true
        "#,
    )
    .unwrap();
    let bridge = FederationBridge::from_config(&config).unwrap();
    let mut store = AuthenticationContextStore::new();
    bridge
        .extract(Some(&InboundRequest::new()), Some(&record), &mut store)
        .expect("delegated extraction should proceed");

    assert_eq!(store.issuer.as_deref(), Some("mockIdp"));
    assert_eq!(
        store.headers.get("mockHeader").map(String::as_str),
        Some("mockValue")
    );

    let result = bridge.validate(Some(&store)).unwrap();
    assert_eq!(result.subject.username(), Some("mockValue"));
    assert!(result.subject.assertions(AssertionKind::Header).count() >= 1);
}

#[test]
fn failures_surface_as_distinct_outcomes() {
    let bridge = FederationBridge::from_config(&bridge_config("")).unwrap();
    let mut store = AuthenticationContextStore::new();

    let negotiation = bridge.prepare(Some(" "), Some(&AuthnRequest::new()), &mut store);
    assert_eq!(Outcome::of(&negotiation), Outcome::InvalidRelyingParty);

    let negotiation = bridge.prepare(Some(RP_ID), None, &mut store);
    assert_eq!(Outcome::of(&negotiation), Outcome::InvalidProfileContext);

    let extraction = bridge.extract(None, None, &mut store);
    assert_eq!(Outcome::of(&extraction), Outcome::NoCredentials);

    assert_eq!(bridge.validate(None), Err(AuthnEvent::InvalidAuthnContext));

    // extraction succeeded but nothing resolvable as a username
    let request = InboundRequest::new().with_header("X-Unrelated", "value");
    bridge.extract(Some(&request), None, &mut store).unwrap();
    let validation = bridge.validate(Some(&store));
    assert_eq!(Outcome::of(&validation), Outcome::NoCredentials);
}
