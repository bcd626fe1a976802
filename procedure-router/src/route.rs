//! Route definition
//!
//! A [`Route`] is the unit the router dispatches to: a name, a method, the
//! group it was built in, a handler and an optional resolver. Routes are
//! immutable. Changing the method goes through [`Route::with_method`], which
//! returns a new value, so one route can be registered under different
//! methods in different routers without aliasing.
//!
//! Most routes come out of the procedure builder; [`Route::new`] assembles
//! one by hand for custom methods.
//!
//! # Example
//! ```rust,ignore
//! let route = Route::new("health", "status", |_args| Ok(json!("ok")))
//!     .with_resolver(|value, ctx| Ok(json!({ "route": ctx.route(), "value": value })));
//! ```

use crate::{
    Args, Context, Outcome, RpcResult,
    handler::{
        Resolver, RouteHandler, boxed_async_handler, boxed_async_resolver, boxed_handler,
        boxed_resolver,
    },
};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Group recorded on routes assembled by hand.
pub const RAW_GROUP: &str = "raw";

/// A named, method-tagged callable unit.
#[derive(Clone)]
pub struct Route {
    name: String,
    method: String,
    group: String,
    handler: RouteHandler,
    resolver: Option<Resolver>,
}

impl Route {
    /// Assemble a route from a synchronous handler.
    pub fn new<F>(name: impl Into<String>, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Args) -> RpcResult<Value> + Send + Sync + 'static,
    {
        Self::from_handler(name, method, boxed_handler(handler))
    }

    /// Assemble a route from an async handler.
    pub fn new_async<F, Fut>(name: impl Into<String>, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        Self::from_handler(name, method, boxed_async_handler(handler))
    }

    /// Assemble a route from an already boxed handler.
    pub fn from_handler(
        name: impl Into<String>,
        method: impl Into<String>,
        handler: RouteHandler,
    ) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            group: RAW_GROUP.to_string(),
            handler,
            resolver: None,
        }
    }

    pub(crate) fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Attach a synchronous resolver.
    #[must_use = "This method returns a new Route and does not modify self"]
    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(Value, &Context) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.resolver = Some(boxed_resolver(resolver));
        self
    }

    /// Attach an async resolver.
    #[must_use = "This method returns a new Route and does not modify self"]
    pub fn with_async_resolver<F, Fut>(mut self, resolver: F) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        self.resolver = Some(boxed_async_resolver(resolver));
        self
    }

    /// Copy of this route registered under another method.
    ///
    /// The handler and resolver are shared; `self` is left untouched.
    #[must_use = "This method returns a new Route and does not modify self"]
    pub fn with_method(&self, method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..self.clone()
        }
    }

    /// Route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method the route is registered under.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Group the route was built in.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns true if a resolver is attached.
    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Run the handler directly, bypassing any router.
    pub fn handle(&self, args: Args) -> Outcome {
        (self.handler)(args)
    }

    /// Run the resolver, if there is one.
    pub fn resolve(&self, value: Value, ctx: &Context) -> Option<Outcome> {
        self.resolver.as_ref().map(|resolver| resolver(value, ctx))
    }

    pub(crate) fn resolver(&self) -> Option<Resolver> {
        self.resolver.clone()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("group", &self.group)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}
