#![warn(missing_docs)]
//! # Procedure Router
//!
//! A typed request/procedure router: named, method-tagged routes compiled
//! into a dispatch table, one invoker per method, and a fixed per-call
//! pipeline that can intercept arguments, transform results and inject a
//! per-call context.
//!
//! ## Overview
//!
//! - **Procedures** are built through a chain of optional input transform,
//!   context derivation, handler and output transform
//! - **Routers** dispatch by method then name, reject duplicates and expose
//!   one invoker per method
//! - **Interceptors** wrap every invocation (args, fn and resolver stages)
//! - **Adapters** attach named extensions that see the whole registry
//! - **Sync/async unification**: a reply is immediate unless some stage
//!   deferred, and can always be awaited
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Api (context, defaults, groups, allow-list)                  │
//! │   │                                                          │
//! │   ├── procedure(name) ──► ProcedureBuilder ──► Route         │
//! │   │                        input ► context ► handler ► output│
//! │   │                                                          │
//! │   └── router(name) ──► RouterBuilder ──► Router              │
//! │                          routes        ├── invoker(method)   │
//! │                          interceptors  ├── adapters          │
//! │                          adapters      └── member(name)      │
//! └──────────────────────────────────────────────────────────────┘
//!
//! invoke: args interceptor ► handler ► fn interceptor ► resolver ► resolver interceptor
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use procedure_router::prelude::*;
//! use serde_json::json;
//!
//! let api = Api::builder()
//!     .context(context_map! { "service" => "users" })
//!     .build()?;
//!
//! let user = api
//!     .procedure("user")
//!     .input(TypedSchema::<u64>::new())
//!     .define(|data| Ok(json!({ "id": data.input, "name": "ada" })));
//!
//! let router = api
//!     .router("users")
//!     .route(user)
//!     .intercept_fn(|ctx| Ok(json!({ "data": ctx.result() })))
//!     .build()?;
//!
//! let reply = router.invoker("call").unwrap().call("user", vec![json!(1)]);
//! assert_eq!(reply.await?["data"]["name"], "ada");
//! ```
//!
//! ## Errors
//!
//! Construction fails with [`RpcError`]s such as `DUPLICATE_ROUTE` or
//! `RESERVED_CONTEXT_KEY`. Lookups fail with `PROCEDURE_NOT_FOUND` (method
//! `call`) or `REQUEST_NOT_FOUND` (any other method). Errors raised by
//! transforms, handlers, resolvers and interceptors reach the caller as they
//! were produced.

pub mod adapter;
mod api;
mod config;
mod context;
pub mod deferred;
mod error;
mod group;
mod handler;
pub mod interceptor;
pub mod logging;
mod procedure;
mod route;
mod router;
pub mod schema;
pub mod validation;

#[cfg(test)]
mod tests;

pub use adapter::{Adapter, AdapterValue};
pub use api::{Api, ApiBuilder, GroupScope, RESERVED_NAMES};
pub use config::{ApiConfig, ConfigValidationError, DEFAULT_PARSE_KEY};
pub use context::{
    Args, CALL_METHOD, CallType, Context, ContextMap, HTTP_METHODS, RESERVED_CONTEXT,
    ensure_unreserved,
};
pub use deferred::{MaybeDeferred, Outcome};
pub use error::{RpcError, RpcErrorCode, RpcResult};
pub use group::{ContextFactory, ContextOptions, ContextSource, Group};
pub use handler::{Resolver, RouteHandler};
pub use interceptor::{ArgsInterceptor, Interceptors, ResultInterceptor};
pub use logging::RequestId;
pub use procedure::{
    DEFAULT_GROUP, ProcedureBuilder, ProcedureData, ProcedureMeta, Set, Unset,
};
pub use route::{RAW_GROUP, Route};
pub use router::{Invoker, MappedRouter, Member, Registry, Router, RouterBuilder};
pub use schema::{Schema, Transform, TypedSchema, from_async_fn, from_fn, from_value_fn};
pub use validation::{FieldError, Validate, ValidationResult, ValidationRules};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`ContextMap`] from `key => value` pairs. Values go through `json!`.
///
/// ```rust,ignore
/// let context = context_map! { "region" => "eu", "retries" => 3 };
/// ```
#[macro_export]
macro_rules! context_map {
    () => {
        $crate::ContextMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::ContextMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::__serde_json::json!($value),
            );
        )+
        map
    }};
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use procedure_router::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Adapters
        Adapter,
        // API
        Api,
        ApiBuilder,
        ApiConfig,
        Args,
        CallType,
        // Context
        Context,
        ContextMap,
        ContextOptions,
        // Validation
        FieldError,
        Group,
        // Interceptors
        Interceptors,
        Invoker,
        // Deferred values
        MaybeDeferred,
        Member,
        Outcome,
        // Procedures
        ProcedureBuilder,
        ProcedureData,
        ProcedureMeta,
        Registry,
        RequestId,
        // Routing
        Route,
        Router,
        RouterBuilder,
        // Errors
        RpcError,
        RpcErrorCode,
        RpcResult,
        // Schemas
        Schema,
        Transform,
        TypedSchema,
        Validate,
        ValidationResult,
        ValidationRules,
        // Functions
        context_map,
        from_async_fn,
        from_fn,
        from_value_fn,
    };
}
