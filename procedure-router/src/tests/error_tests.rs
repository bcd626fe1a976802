//! Property-based tests for error handling
//!
//! These tests validate error serialization and the exact messages produced
//! for construction and lookup failures.

use crate::{RpcError, RpcErrorCode};
use proptest::prelude::*;

/// Strategy to generate arbitrary RpcErrorCode values
fn arb_error_code() -> impl Strategy<Value = RpcErrorCode> {
    prop_oneof![
        Just(RpcErrorCode::DuplicateRoute),
        Just(RpcErrorCode::ReservedContextKey),
        Just(RpcErrorCode::ReservedName),
        Just(RpcErrorCode::UnknownGroup),
        Just(RpcErrorCode::MethodNotAllowed),
        Just(RpcErrorCode::InvalidConfig),
        Just(RpcErrorCode::ProcedureNotFound),
        Just(RpcErrorCode::RequestNotFound),
        Just(RpcErrorCode::BadRequest),
        Just(RpcErrorCode::NotFound),
        Just(RpcErrorCode::ValidationError),
        Just(RpcErrorCode::UnsupportedOperation),
        Just(RpcErrorCode::SerializationError),
        Just(RpcErrorCode::InternalError),
    ]
}

/// Strategy to generate arbitrary RpcError values
fn arb_rpc_error() -> impl Strategy<Value = RpcError> {
    (
        arb_error_code(),
        ".*",
        proptest::option::of(any::<String>()),
    )
        .prop_map(|(code, message, cause)| {
            let mut error = RpcError::new(code, message);
            if let Some(c) = cause {
                error = error.with_cause(c);
            }
            error
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Serialized errors carry `code` and `message` and deserialize back unchanged.
    #[test]
    fn prop_error_serialization_roundtrip(error in arb_rpc_error()) {
        let json = serde_json::to_value(&error).expect("Failed to serialize error");

        prop_assert!(json.get("code").is_some(), "Serialized error must have 'code' field");
        prop_assert!(json.get("message").is_some(), "Serialized error must have 'message' field");

        let restored: RpcError = serde_json::from_value(json).expect("Failed to deserialize error");
        prop_assert_eq!(error, restored);
    }

    /// Error codes serialize to their SCREAMING_SNAKE_CASE `as_str` form.
    #[test]
    fn prop_error_code_serializes_to_screaming_snake_case(code in arb_error_code()) {
        let json = serde_json::to_value(code).expect("Failed to serialize code");
        let code_str = json.as_str().expect("Code should be a string");

        prop_assert!(
            code_str.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
            "Error code '{}' should be SCREAMING_SNAKE_CASE", code_str
        );
        prop_assert_eq!(code_str, code.as_str());
    }

    /// Not-found errors name the route and method, with the term picked by method.
    #[test]
    fn prop_not_found_message(name in "[a-z][a-z0-9_]{0,12}", method in "[a-z]{1,8}") {
        let error = RpcError::route_not_found(&method, &name);
        if method == "call" {
            prop_assert_eq!(error.code, RpcErrorCode::ProcedureNotFound);
            prop_assert_eq!(
                error.message,
                format!("Procedure \"{}\" with method \"call\" not found", name)
            );
        } else {
            prop_assert_eq!(error.code, RpcErrorCode::RequestNotFound);
            prop_assert_eq!(
                error.message,
                format!("Request \"{}\" with method \"{}\" not found", name, method)
            );
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_duplicate_route_message() {
        let error = RpcError::duplicate_route("example", "call");
        assert_eq!(error.code, RpcErrorCode::DuplicateRoute);
        assert_eq!(error.message, "Route \"example\" with method \"call\" already exists");
        assert!(error.code.is_construction_error());
    }

    #[test]
    fn test_error_display_format() {
        let error = RpcError::route_not_found("call", "missing");
        assert_eq!(
            error.to_string(),
            "[PROCEDURE_NOT_FOUND] Procedure \"missing\" with method \"call\" not found"
        );
        assert!(error.code.is_lookup_error());
    }

    #[test]
    fn test_method_not_allowed_lists_allow_list() {
        let allowed = vec!["get".to_string(), "post".to_string()];
        let error = RpcError::method_not_allowed("put", &allowed);
        assert_eq!(error.details.unwrap()["allowed_methods"], serde_json::json!(["get", "post"]));
    }

    #[test]
    fn test_config_error_converts_to_invalid_config() {
        let error: RpcError = crate::ConfigValidationError::EmptyParseKey.into();
        assert_eq!(error.code, RpcErrorCode::InvalidConfig);
        assert_eq!(error.message, "parse_key must not be empty");
    }

    #[test]
    fn test_serde_error_converts_to_serialization_error() {
        let parse = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let error: RpcError = parse.into();
        assert_eq!(error.code, RpcErrorCode::SerializationError);
        assert!(error.message.starts_with("JSON error:"));
    }

    #[test]
    fn test_handler_not_found_is_not_a_lookup_error() {
        let error = RpcError::not_found("User 7 not found");
        assert_eq!(error.code.as_str(), "NOT_FOUND");
        assert!(!error.code.is_lookup_error());
        assert!(!error.code.is_construction_error());
    }
}
