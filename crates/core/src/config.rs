//! Generator configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! [mobile]
//! package_name = "pet_store"
//!
//! [web]
//! axios_instance = "petStoreAxios"
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub mobile: MobileConfig,
    pub server: ServerConfig,
    pub web: WebConfig,
}

impl GeneratorConfig {
    /// Parse a TOML configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Dart client layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MobileConfig {
    /// Dart package name used in `package:` imports.
    pub package_name: String,
    pub model_dir: String,
    pub api_dir: String,
    /// Name of the retrofit client class.
    pub client_name: String,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            package_name: "api_client".to_string(),
            model_dir: "lib/model".to_string(),
            api_dir: "lib/api".to_string(),
            client_name: "RestClient".to_string(),
        }
    }
}

/// Go server layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub package_name: String,
    pub source_dir: String,
    /// Check each request against the embedded document before decoding.
    pub validate_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            package_name: "api".to_string(),
            source_dir: "api".to_string(),
            validate_requests: true,
        }
    }
}

/// TypeScript client layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    pub model_dir: String,
    pub api_dir: String,
    /// Exported name of the shared axios instance.
    pub axios_instance: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            model_dir: "src/model".to_string(),
            api_dir: "src/api".to_string(),
            axios_instance: "defaultAxios".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.mobile.client_name, "RestClient");
        assert_eq!(config.server.package_name, "api");
        assert!(config.server.validate_requests);
    }

    #[test]
    fn test_request_validation_can_be_disabled() {
        let config = GeneratorConfig::from_toml_str("[server]\nvalidate_requests = false\n").unwrap();
        assert!(!config.server.validate_requests);
        assert_eq!(config.server.source_dir, "api");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
[mobile]
package_name = "pet_store"

[web]
axios_instance = "petAxios"
"#,
        )
        .unwrap();
        assert_eq!(config.mobile.package_name, "pet_store");
        assert_eq!(config.mobile.model_dir, "lib/model");
        assert_eq!(config.web.axios_instance, "petAxios");
        assert_eq!(config.web.api_dir, "src/api");
    }

    #[test]
    fn test_unknown_key_is_a_config_error() {
        let err = GeneratorConfig::from_toml_str("[server]\nport = 8080\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
