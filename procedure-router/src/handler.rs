//! Boxed callables stored on routes
//!
//! Routes keep their handler and resolver type-erased behind `Arc<dyn Fn>`,
//! the same way for synchronous and asynchronous code: both produce an
//! [`Outcome`]. The `boxed_*` helpers turn plain closures into those shapes.

use crate::{Args, Context, Outcome, RpcResult, deferred::MaybeDeferred};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Type-erased route handler: raw args in, possibly deferred result out.
pub type RouteHandler = Arc<dyn Fn(Args) -> Outcome + Send + Sync>;

/// Type-erased resolver: handler result plus context in, final value out.
pub type Resolver = Arc<dyn Fn(Value, &Context) -> Outcome + Send + Sync>;

/// Box a synchronous handler.
pub(crate) fn boxed_handler<F>(f: F) -> RouteHandler
where
    F: Fn(Args) -> RpcResult<Value> + Send + Sync + 'static,
{
    Arc::new(move |args| MaybeDeferred::Immediate(f(args)))
}

/// Box an async handler. Every call produces a deferred outcome.
pub(crate) fn boxed_async_handler<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Value>> + Send + 'static,
{
    Arc::new(move |args| MaybeDeferred::defer(f(args)))
}

/// Box a synchronous resolver.
pub(crate) fn boxed_resolver<F>(f: F) -> Resolver
where
    F: Fn(Value, &Context) -> RpcResult<Value> + Send + Sync + 'static,
{
    Arc::new(move |value, ctx| MaybeDeferred::Immediate(f(value, ctx)))
}

/// Box an async resolver. The context is cloned into the future.
pub(crate) fn boxed_async_resolver<F, Fut>(f: F) -> Resolver
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Value>> + Send + 'static,
{
    Arc::new(move |value, ctx| MaybeDeferred::defer(f(value, ctx.clone())))
}
