//! Error types for router construction and invocation
//!
//! Every fallible operation in this crate returns [`RpcResult`]. Errors raised
//! by user code (transforms, handlers, resolvers, interceptors) travel through
//! the pipeline untouched; the router only creates errors of its own for
//! construction and lookup failures.
//!
//! # Error Codes
//!
//! Codes are represented by the [`RpcErrorCode`] enum. When serialized they
//! become SCREAMING_SNAKE_CASE strings.
//!
//! # Example
//! ```rust,ignore
//! use procedure_router::{RpcError, RpcErrorCode};
//!
//! let error = RpcError::new(RpcErrorCode::ValidationError, "id must be a string");
//! let error = RpcError::validation("id must be a string"); // Convenience method
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type-safe error codes.
///
/// Construction codes are produced while an API or router is assembled,
/// lookup codes while resolving a `(method, name)` pair, and the remaining
/// codes are available to transforms and handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RpcErrorCode {
    // Construction errors
    /// A route with the same method and name is already registered
    DuplicateRoute,
    /// A static context tried to supply a reserved key
    ReservedContextKey,
    /// A group name shadows a reserved API member
    ReservedName,
    /// The requested group was never configured
    UnknownGroup,
    /// The method is outside the configured allow-list
    MethodNotAllowed,
    /// The API configuration is invalid
    InvalidConfig,

    // Lookup errors
    /// No route with method `call` matches the name
    ProcedureNotFound,
    /// No route with a non-`call` method matches the name
    RequestNotFound,

    // Transform and handler errors
    /// The request was malformed
    BadRequest,
    /// A resource a handler looked up does not exist
    NotFound,
    /// Input or output validation failed
    ValidationError,
    /// A schema does not expose the configured operation
    UnsupportedOperation,
    /// JSON serialization/deserialization failed
    SerializationError,
    /// An unexpected internal error occurred
    InternalError,
}

impl RpcErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateRoute => "DUPLICATE_ROUTE",
            Self::ReservedContextKey => "RESERVED_CONTEXT_KEY",
            Self::ReservedName => "RESERVED_NAME",
            Self::UnknownGroup => "UNKNOWN_GROUP",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::ProcedureNotFound => "PROCEDURE_NOT_FOUND",
            Self::RequestNotFound => "REQUEST_NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the error is raised while building an API or router.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRoute
                | Self::ReservedContextKey
                | Self::ReservedName
                | Self::UnknownGroup
                | Self::MethodNotAllowed
                | Self::InvalidConfig
        )
    }

    /// Returns true if the error comes from a failed route lookup.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::ProcedureNotFound | Self::RequestNotFound)
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Router error with type-safe code and message.
///
/// # Example
/// ```rust,ignore
/// use procedure_router::{RpcError, RpcErrorCode};
///
/// let error = RpcError::new(RpcErrorCode::ValidationError, "Invalid id")
///     .with_details(serde_json::json!({"id": -1}))
///     .with_cause("id must be positive");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    /// Type-safe error code
    pub code: RpcErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (JSON value)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional cause for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RpcError {
    /// Create a new error with code and message.
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    // Construction errors

    /// Create a DUPLICATE_ROUTE error naming both the route and the method.
    pub fn duplicate_route(name: &str, method: &str) -> Self {
        Self::new(
            RpcErrorCode::DuplicateRoute,
            format!("Route \"{}\" with method \"{}\" already exists", name, method),
        )
    }

    /// Create a RESERVED_CONTEXT_KEY error.
    pub fn reserved_context_key(key: &str) -> Self {
        Self::new(
            RpcErrorCode::ReservedContextKey,
            format!("Property \"{}\" is a reserved keyword for base context", key),
        )
    }

    /// Create a RESERVED_NAME error.
    pub fn reserved_name(name: &str) -> Self {
        Self::new(
            RpcErrorCode::ReservedName,
            format!(
                "Property \"{}\" is a reserved method. Please choose a different name",
                name
            ),
        )
    }

    /// Create an UNKNOWN_GROUP error.
    pub fn unknown_group(name: &str) -> Self {
        Self::new(
            RpcErrorCode::UnknownGroup,
            format!("Group \"{}\" is not configured", name),
        )
    }

    /// Create a METHOD_NOT_ALLOWED error.
    pub fn method_not_allowed(method: &str, allowed: &[String]) -> Self {
        Self::new(
            RpcErrorCode::MethodNotAllowed,
            format!("Method \"{}\" is not allowed", method),
        )
        .with_details(serde_json::json!({ "allowed_methods": allowed }))
    }

    /// Create an INVALID_CONFIG error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidConfig, message)
    }

    // Lookup errors

    /// Create a not-found error for a `(method, name)` pair.
    ///
    /// Routes registered under the `call` method are procedures, everything
    /// else is a request, and the message uses the matching term.
    pub fn route_not_found(method: &str, name: &str) -> Self {
        if method == crate::context::CALL_METHOD {
            Self::new(
                RpcErrorCode::ProcedureNotFound,
                format!("Procedure \"{}\" with method \"{}\" not found", name, method),
            )
        } else {
            Self::new(
                RpcErrorCode::RequestNotFound,
                format!("Request \"{}\" with method \"{}\" not found", name, method),
            )
        }
    }

    // Transform and handler errors

    /// Create a BAD_REQUEST error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    /// Create a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotFound, message)
    }

    /// Create a VALIDATION_ERROR error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ValidationError, message)
    }

    /// Create an UNSUPPORTED_OPERATION error.
    pub fn unsupported_operation(operation: &str) -> Self {
        Self::new(
            RpcErrorCode::UnsupportedOperation,
            format!("Schema does not expose a \"{}\" operation", operation),
        )
    }

    /// Create a SERIALIZATION_ERROR error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::SerializationError, message)
    }

    /// Create an INTERNAL_ERROR error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<crate::config::ConfigValidationError> for RpcError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        Self::invalid_config(err.to_string())
    }
}

/// Result type alias for router operations.
pub type RpcResult<T> = Result<T, RpcError>;
