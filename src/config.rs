//! Configuration surface of the bridge.
//!
//! Everything the pipeline stages consume is configured here and loaded
//! once at startup; the derived policy and table types are read-only
//! during request processing.
//!
//! TOML shape:
//!
//! ```toml
//! prefix = "AJP_"
//! attribute_names = ["mockAttribute"]
//! username_attribute_names = "username,username2"
//! populate_attributes = true
//!
//! [relying_party_mappings."https://sp.example.org/shibboleth"]
//! absent = { value = "urn:example:mfa" }
//!
//! [relying_party_mappings."https://sp.example.org/shibboleth".classes]
//! "urn:oasis:names:tc:SAML:2.0:ac:classes:Password" = "urn:example:mfa"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::context::{ContextRef, ContextRefKind};
use crate::errors::{BridgeError, Result};
use crate::extract::ExtractionPolicy;
use crate::negotiate::{RelyingPartyMappingTable, RpMappings};
use crate::validate::ValidationPolicy;

/// The mapped reference for the distinguished "absent" key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsentMapping {
    /// The reference to request when nothing was requested.
    pub value: String,
    /// The reference flavor; class unless configured otherwise.
    #[serde(default = "default_ref_kind")]
    pub kind: ContextRefKind,
}

fn default_ref_kind() -> ContextRefKind {
    ContextRefKind::Class
}

/// Context-reference mappings for one relying party, in config form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelyingPartyMappingConfig {
    /// Mapping applied when the request carried no requested context.
    pub absent: Option<AbsentMapping>,
    /// Exact class-reference replacements.
    pub classes: HashMap<String, String>,
    /// Exact declaration-reference replacements.
    pub declarations: HashMap<String, String>,
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Prefix stripped from observed keys before interpretation.
    pub prefix: String,

    /// Optional charset name for the value encoding transform.
    pub encoding: Option<String>,

    /// Allow-list of request attribute names to fetch.
    pub attribute_names: Option<Vec<String>>,

    /// Extract from a previously assembled identity record instead of
    /// live request headers.
    pub delegated_mode: bool,

    /// Attribute name(s) carrying the user identifier, comma-delimited.
    pub username_attribute_names: String,

    /// Include all extracted attributes in the result subject.
    pub populate_attributes: bool,

    /// Include all extracted headers in the result subject.
    pub populate_headers: bool,

    /// Per-relying-party context-reference mappings.
    pub relying_party_mappings: HashMap<String, RelyingPartyMappingConfig>,
}

impl BridgeConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.username_attribute_names.trim().is_empty() {
            return Err(BridgeError::configuration(
                "username_attribute_names cannot be empty",
            ));
        }
        Ok(())
    }

    /// The extraction policy derived from this configuration.
    pub fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy {
            prefix: self.prefix.clone(),
            encoding: self.encoding.clone(),
            attribute_names: self.attribute_names.clone(),
            delegated_mode: self.delegated_mode,
        }
    }

    /// The validation policy derived from this configuration.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(self.username_attribute_names.clone())
            .with_populate_attributes(self.populate_attributes)
            .with_populate_headers(self.populate_headers)
    }

    /// The runtime mapping table derived from this configuration.
    pub fn mapping_table(&self) -> RelyingPartyMappingTable {
        let mut table = RelyingPartyMappingTable::new();
        for (rp_id, config) in &self.relying_party_mappings {
            let mut mappings = RpMappings::new();
            if let Some(absent) = &config.absent {
                let mapped = ContextRef {
                    kind: absent.kind,
                    value: absent.value.clone(),
                };
                mappings = mappings.with_absent(mapped);
            }
            for (from, to) in &config.classes {
                mappings = mappings.with_mapping(ContextRef::class(from), ContextRef::class(to));
            }
            for (from, to) in &config.declarations {
                mappings = mappings.with_mapping(ContextRef::decl(from), ContextRef::decl(to));
            }
            table = table.with_relying_party(rp_id, mappings);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        prefix = "AJP_"
        attribute_names = ["mockAttribute"]
        username_attribute_names = "username,username2"
        populate_attributes = true

        [relying_party_mappings."mockRelyingParty"]
        absent = { value = "urn:example:mfa" }

        [relying_party_mappings."mockRelyingParty".classes]
        "urn:oasis:names:tc:SAML:2.0:ac:classes:Password" = "urn:example:mfa"

        [relying_party_mappings."mockRelyingParty".declarations]
        "urn:example:decl" = "urn:example:decl2"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = BridgeConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.prefix, "AJP_");
        assert_eq!(
            config.attribute_names.as_deref(),
            Some(&["mockAttribute".to_string()][..])
        );
        assert!(config.populate_attributes);
        assert!(!config.populate_headers);
        assert!(!config.delegated_mode);
        assert!(config.encoding.is_none());
    }

    #[test]
    fn test_mapping_table_conversion() {
        let config = BridgeConfig::from_toml_str(CONFIG).unwrap();
        let table = config.mapping_table();
        let mappings = table.for_relying_party("mockRelyingParty").unwrap();

        assert_eq!(
            mappings.absent(),
            Some(&ContextRef::class("urn:example:mfa"))
        );
        assert_eq!(
            mappings.lookup(&ContextRef::class(
                "urn:oasis:names:tc:SAML:2.0:ac:classes:Password"
            )),
            Some(&ContextRef::class("urn:example:mfa"))
        );
        assert_eq!(
            mappings.lookup(&ContextRef::decl("urn:example:decl")),
            Some(&ContextRef::decl("urn:example:decl2"))
        );
        // kinds stay separate
        assert_eq!(
            mappings.lookup(&ContextRef::class("urn:example:decl")),
            None
        );
        assert!(table.for_relying_party("unknown").is_none());
    }

    #[test]
    fn test_absent_mapping_kind_override() {
        let config = BridgeConfig::from_toml_str(
            r#"
            username_attribute_names = "username"
            [relying_party_mappings."rp"]
            absent = { value = "urn:example:decl", kind = "decl" }
            "#,
        )
        .unwrap();
        let table = config.mapping_table();
        assert_eq!(
            table.for_relying_party("rp").unwrap().absent(),
            Some(&ContextRef::decl("urn:example:decl"))
        );
    }

    #[test]
    fn test_empty_username_attributes_rejected() {
        let err = BridgeConfig::from_toml_str("prefix = \"AJP_\"").unwrap_err();
        assert!(matches!(err, BridgeError::Configuration { .. }));
    }

    #[test]
    fn test_malformed_toml_is_toml_error() {
        let err = BridgeConfig::from_toml_str("prefix = [").unwrap_err();
        assert!(matches!(err, BridgeError::Toml(_)));
    }

    #[test]
    fn test_policies_reflect_config() {
        let config = BridgeConfig::from_toml_str(CONFIG).unwrap();
        let extraction = config.extraction_policy();
        assert_eq!(extraction.prefix, "AJP_");
        assert!(!extraction.delegated_mode);

        let validation = config.validation_policy();
        assert_eq!(validation.username_attributes, "username,username2");
        assert!(validation.populate_attributes);
    }
}
