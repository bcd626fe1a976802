//! Per-invocation context
//!
//! A [`Context`] is built by the router for every invocation. It carries the
//! call metadata (router name, route, method, call type, raw args) next to
//! the caller-supplied environment, a shared [`ContextMap`] configured once on
//! the API. The environment may never supply one of the [`RESERVED_CONTEXT`]
//! keys; [`ensure_unreserved`] enforces that when the API is configured.

use crate::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Raw invocation arguments.
pub type Args = Vec<Value>;

/// Caller-supplied context environment.
pub type ContextMap = serde_json::Map<String, Value>;

/// The method token that marks a route as a procedure.
pub const CALL_METHOD: &str = "call";

/// Method tokens classified as requests (compared case-insensitively).
pub const HTTP_METHODS: &[&str] = &[
    "connect", "delete", "get", "head", "options", "patch", "post", "put", "trace",
];

/// Keys owned by the base context.
pub const RESERVED_CONTEXT: &[&str] = &["route", "method", "args", "type", "routerName", "result"];

/// Kind of route being invoked, derived from its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// Routes registered under the `call` method
    Procedure,
    /// Routes registered under an HTTP method
    Request,
    /// Any other method
    Custom,
}

impl CallType {
    /// Classify a method token.
    pub fn from_method(method: &str) -> Self {
        if method == CALL_METHOD {
            Self::Procedure
        } else if HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            Self::Request
        } else {
            Self::Custom
        }
    }

    /// Returns the string form used in serialized contexts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procedure => "procedure",
            Self::Request => "request",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject a caller context that tries to supply a reserved key.
pub fn ensure_unreserved(context: &ContextMap) -> RpcResult<()> {
    match RESERVED_CONTEXT.iter().find(|key| context.contains_key(**key)) {
        Some(key) => Err(RpcError::reserved_context_key(key)),
        None => Ok(()),
    }
}

/// Context handed to interceptors and resolvers.
///
/// Cloning is cheap for the environment, which is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Context {
    env: Arc<ContextMap>,
    router_name: String,
    route: String,
    method: String,
    call_type: CallType,
    args: Args,
    result: Option<Value>,
}

impl Context {
    pub(crate) fn new(
        env: Arc<ContextMap>,
        router_name: &str,
        route: &str,
        method: &str,
        args: Args,
    ) -> Self {
        Self {
            env,
            router_name: router_name.to_string(),
            route: route.to_string(),
            method: method.to_string(),
            call_type: CallType::from_method(method),
            args,
            result: None,
        }
    }

    /// Copy of this context carrying `result`.
    pub(crate) fn with_result(&self, result: Value) -> Self {
        Self {
            result: Some(result),
            ..self.clone()
        }
    }

    /// Name of the router handling the invocation.
    pub fn router_name(&self) -> &str {
        &self.router_name
    }

    /// Name of the invoked route.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Method the route was invoked with.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Call type derived from the method.
    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    /// Arguments as passed by the caller.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Result of the current stage, only set for fn and resolver interceptors.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// The caller-supplied environment.
    pub fn env(&self) -> &ContextMap {
        &self.env
    }

    /// Look up a single environment entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.env.get(key)
    }

    /// Flatten into one JSON object: environment entries plus the reserved keys.
    pub fn to_value(&self) -> Value {
        let mut map = (*self.env).clone();
        map.insert("routerName".into(), Value::String(self.router_name.clone()));
        map.insert("route".into(), Value::String(self.route.clone()));
        map.insert("method".into(), Value::String(self.method.clone()));
        map.insert("type".into(), Value::String(self.call_type.to_string()));
        map.insert("args".into(), Value::Array(self.args.clone()));
        if let Some(result) = &self.result {
            map.insert("result".into(), result.clone());
        }
        Value::Object(map)
    }
}
