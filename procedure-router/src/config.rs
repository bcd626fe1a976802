//! Configuration for an [`Api`](crate::Api) instance.
//!
//! [`ApiConfig`] holds the plain-data settings of an API: the schema
//! operation used for parsing, the method procedures get when none is given,
//! and an optional allow-list of methods. Closures (default transforms,
//! context factories, groups) are configured on [`ApiBuilder`](crate::ApiBuilder).
//!
//! # Example
//! ```rust,ignore
//! use procedure_router::ApiConfig;
//!
//! let config = ApiConfig::new()
//!     .with_parse_key("validate")
//!     .with_default_method("get")
//!     .with_allowed_methods(["get", "post"]);
//! config.validate()?;
//! ```

use crate::context::CALL_METHOD;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the schema operation used when none is configured.
pub const DEFAULT_PARSE_KEY: &str = "parse";

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// parse_key must not be empty
    EmptyParseKey,
    /// default_method must not be empty
    EmptyDefaultMethod,
    /// allowed_methods is configured but empty
    EmptyAllowedMethods,
    /// default_method is missing from allowed_methods
    DefaultMethodNotAllowed(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyParseKey => write!(f, "parse_key must not be empty"),
            Self::EmptyDefaultMethod => write!(f, "default_method must not be empty"),
            Self::EmptyAllowedMethods => {
                write!(f, "allowed_methods must contain at least one method")
            }
            Self::DefaultMethodNotAllowed(method) => {
                write!(f, "default method \"{}\" is not in allowed_methods", method)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Plain-data API settings.
///
/// # Fields
///
/// * `parse_key` - Name of the operation invoked on schema transforms.
///   Default: `"parse"`.
///
/// * `default_method` - Method assigned to procedures built without an
///   explicit method. Default: `"call"`.
///
/// * `allowed_methods` - Optional allow-list. When set, building a procedure
///   with any other method fails. Default: `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Schema operation name (default: "parse")
    pub parse_key: String,
    /// Method used when a procedure does not name one (default: "call")
    pub default_method: String,
    /// Optional method allow-list (default: None)
    pub allowed_methods: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            parse_key: DEFAULT_PARSE_KEY.to_string(),
            default_method: CALL_METHOD.to_string(),
            allowed_methods: None,
        }
    }
}

impl ApiConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Example
    /// ```rust,ignore
    /// let config = ApiConfig::new();
    /// config.validate().expect("Config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.parse_key.is_empty() {
            return Err(ConfigValidationError::EmptyParseKey);
        }
        if self.default_method.is_empty() {
            return Err(ConfigValidationError::EmptyDefaultMethod);
        }
        if self.allowed_methods.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigValidationError::EmptyAllowedMethods);
        }
        if !self.allows(&self.default_method) {
            return Err(ConfigValidationError::DefaultMethodNotAllowed(
                self.default_method.clone(),
            ));
        }
        Ok(())
    }

    /// Returns true if `method` passes the allow-list (always true without one).
    pub fn allows(&self, method: &str) -> bool {
        method_allowed(self.allowed_methods.as_deref(), method)
    }

    /// Set the schema operation name.
    #[must_use = "This method returns a new ApiConfig and does not modify self"]
    pub fn with_parse_key(mut self, key: impl Into<String>) -> Self {
        self.parse_key = key.into();
        self
    }

    /// Set the default method.
    #[must_use = "This method returns a new ApiConfig and does not modify self"]
    pub fn with_default_method(mut self, method: impl Into<String>) -> Self {
        self.default_method = method.into();
        self
    }

    /// Restrict procedures to the given methods.
    #[must_use = "This method returns a new ApiConfig and does not modify self"]
    pub fn with_allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }
}

/// Returns true if `method` is in `allowed`, or if there is no allow-list.
pub(crate) fn method_allowed(allowed: Option<&[String]>, method: &str) -> bool {
    allowed.is_none_or(|allowed| allowed.iter().any(|m| m == method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert_eq!(config.parse_key, "parse");
        assert_eq!(config.default_method, "call");
        assert!(config.allowed_methods.is_none());
        assert!(config.validate().is_ok());
        assert!(config.allows("anything"));
    }

    #[test]
    fn test_empty_parse_key_rejected() {
        let config = ApiConfig::new().with_parse_key("");
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyParseKey));
    }

    #[test]
    fn test_default_method_must_be_allowed() {
        let config = ApiConfig::new().with_allowed_methods(["foo", "bar"]);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DefaultMethodNotAllowed("call".into()))
        );

        let config = config.with_default_method("foo");
        assert!(config.validate().is_ok());
        assert!(config.allows("bar"));
        assert!(!config.allows("call"));
    }

    #[test]
    fn test_empty_allow_list_rejected() {
        let config = ApiConfig::new().with_allowed_methods(Vec::<String>::new());
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyAllowedMethods)
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ApiConfig = serde_json::from_value(serde_json::json!({
            "default_method": "get",
            "allowed_methods": ["get", "post"]
        }))
        .unwrap();
        assert_eq!(config.parse_key, "parse");
        assert_eq!(config.default_method, "get");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_method_allowed_without_list() {
        assert!(method_allowed(None, "anything"));
        let allowed = vec!["get".to_string()];
        assert!(method_allowed(Some(allowed.as_slice()), "get"));
        assert!(!method_allowed(Some(allowed.as_slice()), "GET"));
    }
}
