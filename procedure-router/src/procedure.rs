//! Procedure builder
//!
//! Builds [`Route`]s through a chain of optional stages:
//!
//! ```text
//! raw args -> input transform -> context derivation -> handler -> output transform
//! ```
//!
//! Each stage may finish immediately or defer. The chain stays synchronous
//! until a stage defers, and from then on the remaining stages run after it
//! settles. A procedure without any asynchronous stage therefore replies
//! immediately.
//!
//! `.input` and `.output` can each be set once; the builder's type parameters
//! track which of them have been set, so a second call does not compile.
//! Defaults inherited from the API or group apply until overridden.
//!
//! # Example
//!
//! ```rust,ignore
//! use procedure_router::prelude::*;
//!
//! let route = api
//!     .procedure("user")
//!     .input(TypedSchema::<String>::new())
//!     .output(from_value_fn(|user| Ok(json!({ "user": user }))))
//!     .define(|data| Ok(data.input.unwrap_or_default()));
//! ```

use crate::{
    Args, ContextMap, Outcome, RpcResult,
    config::DEFAULT_PARSE_KEY,
    context::CALL_METHOD,
    deferred::MaybeDeferred,
    group::ContextSource,
    handler::RouteHandler,
    logging::log_procedure_defined,
    route::Route,
    schema::Transform,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Group assigned to procedures built outside a named group.
pub const DEFAULT_GROUP: &str = "procedure";

/// Identity of a procedure, handed to its handler and context factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureMeta {
    /// Route name
    pub route: String,
    /// Method the route is registered under
    pub method: String,
    /// Group the procedure was built in
    pub group: String,
}

/// Everything a procedure handler receives.
#[derive(Debug, Clone)]
pub struct ProcedureData {
    /// Derived handler context
    pub context: Arc<ContextMap>,
    /// Route, method and group
    pub meta: ProcedureMeta,
    /// Parsed input; `None` when the procedure has no input transform
    pub input: Option<Value>,
}

impl ProcedureData {
    /// Deserialize the parsed input into `T`. A missing input reads as `null`.
    pub fn input_as<T: DeserializeOwned>(&self) -> RpcResult<T> {
        Ok(T::deserialize(self.input.as_ref().unwrap_or(&Value::Null))?)
    }
}

type ProcedureFn = Arc<dyn Fn(ProcedureData) -> Outcome + Send + Sync>;

/// Settings a builder inherits from its API and group.
#[derive(Debug, Clone)]
pub(crate) struct ProcedureScope {
    pub(crate) group: String,
    pub(crate) parse_key: String,
    pub(crate) default_context: Arc<ContextMap>,
    pub(crate) context: ContextSource,
    pub(crate) input: Option<Transform>,
    pub(crate) output: Option<Transform>,
}

impl Default for ProcedureScope {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            parse_key: DEFAULT_PARSE_KEY.to_string(),
            default_context: Arc::new(ContextMap::new()),
            context: ContextSource::Inherit,
            input: None,
            output: None,
        }
    }
}

/// Marker: the stage has not been set on this builder.
pub struct Unset;

/// Marker: the stage has been set on this builder.
pub struct Set;

/// Chainable builder producing a [`Route`].
///
/// # Type Parameters
///
/// - `In`: whether `.input` has been called
/// - `Out`: whether `.output` has been called
pub struct ProcedureBuilder<In = Unset, Out = Unset> {
    scope: ProcedureScope,
    meta: ProcedureMeta,
    input: Option<Transform>,
    output: Option<Transform>,
    _state: PhantomData<(In, Out)>,
}

impl ProcedureBuilder {
    /// Standalone builder for a `call` procedure with no inherited settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_method(name, CALL_METHOD)
    }

    /// Standalone builder with an explicit method.
    pub fn with_method(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::scoped(ProcedureScope::default(), name.into(), method.into())
    }

    pub(crate) fn scoped(scope: ProcedureScope, name: String, method: String) -> Self {
        let meta = ProcedureMeta {
            route: name,
            method,
            group: scope.group.clone(),
        };
        Self {
            input: scope.input.clone(),
            output: scope.output.clone(),
            scope,
            meta,
            _state: PhantomData,
        }
    }
}

impl<Out> ProcedureBuilder<Unset, Out> {
    /// Set the input transform, replacing any inherited default.
    pub fn input(self, transform: impl Into<Transform>) -> ProcedureBuilder<Set, Out> {
        ProcedureBuilder {
            scope: self.scope,
            meta: self.meta,
            input: Some(transform.into()),
            output: self.output,
            _state: PhantomData,
        }
    }
}

impl<In> ProcedureBuilder<In, Unset> {
    /// Set the output transform, replacing any inherited default.
    pub fn output(self, transform: impl Into<Transform>) -> ProcedureBuilder<In, Set> {
        ProcedureBuilder {
            scope: self.scope,
            meta: self.meta,
            input: self.input,
            output: Some(transform.into()),
            _state: PhantomData,
        }
    }
}

impl<In, Out> ProcedureBuilder<In, Out> {
    /// Route name.
    pub fn name(&self) -> &str {
        &self.meta.route
    }

    /// Method the route will be registered under.
    pub fn method(&self) -> &str {
        &self.meta.method
    }

    /// Group the procedure belongs to.
    pub fn group(&self) -> &str {
        &self.meta.group
    }

    /// Returns true if an input transform applies, set here or inherited.
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Finish with a synchronous handler.
    pub fn define<F>(self, handler: F) -> Route
    where
        F: Fn(ProcedureData) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.build(Arc::new(move |data| MaybeDeferred::Immediate(handler(data))))
    }

    /// Finish with an async handler. Replies are always deferred.
    pub fn define_async<F, Fut>(self, handler: F) -> Route
    where
        F: Fn(ProcedureData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        self.build(Arc::new(move |data| MaybeDeferred::defer(handler(data))))
    }

    /// Finish with a handler that decides per call whether to defer.
    pub fn define_outcome<F>(self, handler: F) -> Route
    where
        F: Fn(ProcedureData) -> Outcome + Send + Sync + 'static,
    {
        self.build(Arc::new(handler))
    }

    fn build(self, handler: ProcedureFn) -> Route {
        let Self {
            scope,
            meta,
            input,
            output,
            ..
        } = self;
        let ProcedureScope {
            group,
            parse_key,
            default_context,
            context: source,
            ..
        } = scope;

        log_procedure_defined(&meta.route, &meta.method, &group);
        let name = meta.route.clone();
        let method = meta.method.clone();

        let route_handler: RouteHandler = Arc::new(move |args: Args| {
            let parsed = match &input {
                Some(transform) => transform.apply(&parse_key, args).map_ok(Some),
                None => MaybeDeferred::ok(None),
            };

            let source = source.clone();
            let default_context = default_context.clone();
            let meta = meta.clone();
            let handler = handler.clone();
            let output = output.clone();
            let parse_key = parse_key.clone();

            parsed
                .and_then(move |input| {
                    let derived = source.derive(&default_context, &meta, input.clone());
                    derived.and_then(move |context| {
                        handler(ProcedureData {
                            context,
                            meta,
                            input,
                        })
                    })
                })
                .and_then(move |value| match output {
                    Some(transform) => transform.apply_value(&parse_key, value),
                    None => MaybeDeferred::ok(value),
                })
        });

        Route::from_handler(name, method, route_handler).with_group(group)
    }
}
