//! Route registry and invocation
//!
//! [`RouterBuilder`] collects routes, interceptors and adapters, then
//! [`build`](RouterBuilder::build) compiles them in one pass into a
//! method -> name -> route table. A duplicate `(method, name)` pair fails the
//! build; the same name under two methods is fine.
//!
//! The built [`Router`] exposes one [`Invoker`] per distinct method plus the
//! adapter members. Adapters also get the [`Registry`], which adds the full
//! table, [`find`](Registry::find) and [`invoke`](Registry::invoke).
//!
//! # Example
//! ```rust,ignore
//! let router = RouterBuilder::new("users")
//!     .route(api.procedure("user").define(|_| Ok(json!("ada"))))
//!     .intercept_fn(|ctx| Ok(ctx.result().cloned().unwrap_or_default()))
//!     .build()?;
//!
//! let user = router.invoker("call").unwrap().call("user", vec![]).await?;
//! ```

use crate::{
    Args, Context, ContextMap, Outcome, RpcError, RpcResult,
    adapter::{Adapter, AdapterFactory, AdapterValue, into_factory},
    context::ensure_unreserved,
    deferred::MaybeDeferred,
    interceptor::Interceptors,
    logging::{invocation_span, log_adapter_attached, log_route_registered, log_router_built},
    route::Route,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Method -> route name -> route, in registration order.
pub type MappedRouter = IndexMap<String, IndexMap<String, Route>>;

// =============================================================================
// Registry
// =============================================================================

/// The compiled dispatch table, as seen by adapters.
pub struct Registry {
    name: String,
    context: Arc<ContextMap>,
    route_names: Vec<String>,
    methods: Vec<String>,
    routes: MappedRouter,
    interceptors: Interceptors,
}

impl Registry {
    fn compile(
        name: String,
        context: Arc<ContextMap>,
        routes: Vec<Route>,
        interceptors: Interceptors,
    ) -> RpcResult<Self> {
        let mut mapped = MappedRouter::new();
        let mut route_names = Vec::with_capacity(routes.len());
        let mut methods = Vec::with_capacity(routes.len());

        for route in routes {
            let by_name = mapped.entry(route.method().to_string()).or_default();
            if by_name.contains_key(route.name()) {
                return Err(RpcError::duplicate_route(route.name(), route.method()));
            }

            log_route_registered(&name, route.name(), route.method());
            route_names.push(route.name().to_string());
            methods.push(route.method().to_string());
            by_name.insert(route.name().to_string(), route);
        }

        Ok(Self {
            name,
            context,
            route_names,
            methods,
            routes: mapped,
            interceptors,
        })
    }

    /// Router name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static context merged into every invocation context.
    pub fn context(&self) -> &ContextMap {
        &self.context
    }

    /// Route names, one per registered route, in order.
    pub fn route_names(&self) -> &[String] {
        &self.route_names
    }

    /// Methods, one per registered route, parallel to [`route_names`](Self::route_names).
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// The full dispatch table.
    pub fn mapped_router(&self) -> &MappedRouter {
        &self.routes
    }

    /// Look up a route.
    pub fn find(&self, method: &str, name: &str) -> RpcResult<&Route> {
        self.routes
            .get(method)
            .and_then(|by_name| by_name.get(name))
            .ok_or_else(|| RpcError::route_not_found(method, name))
    }

    /// Run one invocation through the interceptor pipeline.
    ///
    /// A failed lookup is reported as an immediate error.
    pub fn invoke(&self, method: &str, name: &str, args: Args) -> Outcome {
        let route = match self.find(method, name) {
            Ok(route) => route.clone(),
            Err(error) => return MaybeDeferred::err(error),
        };

        let span = invocation_span(&self.name, name, method);
        let _entered = span.enter();

        let ctx = Context::new(self.context.clone(), &self.name, name, method, args.clone());
        let Interceptors {
            args: args_interceptor,
            result: fn_interceptor,
            resolver: resolver_interceptor,
        } = self.interceptors.clone();

        let args = match &args_interceptor {
            Some(intercept) => intercept(&ctx),
            None => MaybeDeferred::ok(args),
        };

        let fn_ctx = ctx.clone();
        let resolver = route.resolver();

        args.and_then(move |args| route.handle(args))
            .and_then(move |result| match fn_interceptor {
                Some(intercept) => intercept(&fn_ctx.with_result(result)),
                None => MaybeDeferred::ok(result),
            })
            .and_then(move |result| {
                let Some(resolver) = resolver else {
                    return MaybeDeferred::ok(result);
                };
                let resolved = resolver(result, &ctx);
                match resolver_interceptor {
                    Some(intercept) => {
                        resolved.and_then(move |value| intercept(&ctx.with_result(value)))
                    }
                    None => resolved,
                }
            })
            .in_span(span.clone())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("route_names", &self.route_names)
            .field("methods", &self.methods)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

// =============================================================================
// Invoker
// =============================================================================

/// Calls routes of one method.
#[derive(Clone)]
pub struct Invoker {
    registry: Arc<Registry>,
    method: String,
}

impl Invoker {
    /// Method this invoker dispatches on.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Invoke the route `name` with `args`.
    pub fn call(&self, name: &str, args: Args) -> Outcome {
        self.registry.invoke(&self.method, name, args)
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("router", &self.registry.name)
            .field("method", &self.method)
            .finish()
    }
}

// =============================================================================
// Router
// =============================================================================

/// A named member of a router.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    /// An attached adapter value
    Adapter(&'a (dyn Any + Send + Sync)),
    /// A method invoker
    Invoker(&'a Invoker),
}

impl<'a> Member<'a> {
    /// The adapter value as `T`, if this member is an adapter of that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        match *self {
            Self::Adapter(value) => value.downcast_ref::<T>(),
            Self::Invoker(_) => None,
        }
    }

    /// The invoker, if this member is one.
    pub fn as_invoker(&self) -> Option<&'a Invoker> {
        match *self {
            Self::Invoker(invoker) => Some(invoker),
            Self::Adapter(_) => None,
        }
    }
}

/// A built router.
pub struct Router {
    registry: Arc<Registry>,
    invokers: IndexMap<String, Invoker>,
    adapters: IndexMap<String, AdapterValue>,
}

impl Router {
    /// Start building a router.
    pub fn builder(name: impl Into<String>) -> RouterBuilder {
        RouterBuilder::new(name)
    }

    /// Router name.
    pub fn name(&self) -> &str {
        self.registry.name()
    }

    /// Static context merged into every invocation context.
    pub fn context(&self) -> &ContextMap {
        self.registry.context()
    }

    /// Route names, one per registered route, in order.
    pub fn route_names(&self) -> &[String] {
        self.registry.route_names()
    }

    /// Methods, one per registered route, in order.
    pub fn methods(&self) -> &[String] {
        self.registry.methods()
    }

    /// Invoker for `method`, if any route uses it.
    pub fn invoker(&self, method: &str) -> Option<&Invoker> {
        self.invokers.get(method)
    }

    /// All invokers, in order of first use.
    pub fn invokers(&self) -> impl Iterator<Item = &Invoker> {
        self.invokers.values()
    }

    /// Shorthand for invoking through the `method` invoker.
    ///
    /// Without such an invoker the reply is the same not-found error a
    /// lookup would produce.
    pub fn call(&self, method: &str, name: &str, args: Args) -> Outcome {
        match self.invoker(method) {
            Some(invoker) => invoker.call(name, args),
            None => MaybeDeferred::err(RpcError::route_not_found(method, name)),
        }
    }

    /// Adapter value attached under `name`, if it has type `T`.
    pub fn adapter<T: Any>(&self, name: &str) -> Option<&T> {
        self.adapters
            .get(name)
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    /// Names of attached adapters.
    pub fn adapter_names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Resolve a member by name. Adapters shadow invokers of the same name.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(value) = self.adapters.get(name) {
            return Some(Member::Adapter(&**value));
        }
        self.invokers.get(name).map(Member::Invoker)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.registry.name)
            .field("methods", &self.invokers.keys().collect::<Vec<_>>())
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// RouterBuilder
// =============================================================================

/// Collects routes, interceptors and adapters for a [`Router`].
pub struct RouterBuilder {
    name: String,
    context: Arc<ContextMap>,
    routes: Vec<Route>,
    interceptors: Interceptors,
    adapters: Vec<(String, AdapterFactory)>,
}

impl RouterBuilder {
    /// New builder with an empty static context.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_shared_context(name, Arc::new(ContextMap::new()))
    }

    pub(crate) fn with_shared_context(name: impl Into<String>, context: Arc<ContextMap>) -> Self {
        Self {
            name: name.into(),
            context,
            routes: Vec::new(),
            interceptors: Interceptors::default(),
            adapters: Vec::new(),
        }
    }

    /// Replace the static context. Reserved keys fail the build.
    pub fn context(mut self, context: ContextMap) -> Self {
        self.context = Arc::new(context);
        self
    }

    /// Add a route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Add several routes, keeping their order.
    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Replace all interceptors at once.
    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Set the args interceptor.
    pub fn intercept_args<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Args> + Send + Sync + 'static,
    {
        self.interceptors = self.interceptors.with_args(f);
        self
    }

    /// Set the fn interceptor.
    pub fn intercept_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.interceptors = self.interceptors.with_fn(f);
        self
    }

    /// Set the resolver interceptor.
    pub fn intercept_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.interceptors = self.interceptors.with_resolver(f);
        self
    }

    /// Attach an adapter under `name`.
    pub fn adapter(mut self, name: impl Into<String>, adapter: impl Adapter) -> Self {
        self.adapters.push((name.into(), into_factory(adapter)));
        self
    }

    /// Compile the router.
    ///
    /// # Errors
    ///
    /// - `RESERVED_CONTEXT_KEY` if the static context uses a reserved key
    /// - `DUPLICATE_ROUTE` if two routes share a method and a name
    pub fn build(self) -> RpcResult<Router> {
        ensure_unreserved(&self.context)?;

        let registry = Arc::new(Registry::compile(
            self.name,
            self.context,
            self.routes,
            self.interceptors,
        )?);

        let invokers: IndexMap<String, Invoker> = registry
            .routes
            .keys()
            .map(|method| {
                let invoker = Invoker {
                    registry: registry.clone(),
                    method: method.clone(),
                };
                (method.clone(), invoker)
            })
            .collect();

        let mut adapters = IndexMap::with_capacity(self.adapters.len());
        for (name, factory) in self.adapters {
            let value = factory(registry.clone());
            log_adapter_attached(registry.name(), &name);
            adapters.insert(name, value);
        }

        log_router_built(registry.name(), registry.route_names.len(), invokers.len());

        Ok(Router {
            registry,
            invokers,
            adapters,
        })
    }
}
