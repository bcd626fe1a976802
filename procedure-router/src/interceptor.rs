//! Invocation interceptors
//!
//! A router may carry up to three interceptors, run around every invocation
//! in a fixed order:
//!
//! 1. **args**: sees the base [`Context`]; its value replaces the args passed
//!    to the handler. `Context::args` keeps the original args.
//! 2. **fn**: sees the context with `result` set to the handler's value; its
//!    value replaces that result.
//! 3. **resolver**: only runs when the route has a resolver; sees the context
//!    with `result` set to the resolved value and produces the final reply.
//!
//! Each interceptor may answer synchronously or with a future.

use crate::{Args, Context, Outcome, RpcResult, deferred::MaybeDeferred};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Boxed args interceptor.
pub type ArgsInterceptor = Arc<dyn Fn(&Context) -> Outcome<Args> + Send + Sync>;

/// Boxed result interceptor, used for both the fn and resolver stages.
pub type ResultInterceptor = Arc<dyn Fn(&Context) -> Outcome + Send + Sync>;

/// The interceptors of one router.
#[derive(Clone, Default)]
pub struct Interceptors {
    pub(crate) args: Option<ArgsInterceptor>,
    pub(crate) result: Option<ResultInterceptor>,
    pub(crate) resolver: Option<ResultInterceptor>,
}

impl Interceptors {
    /// No interceptors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the args interceptor.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_args<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Args> + Send + Sync + 'static,
    {
        self.args = Some(Arc::new(move |ctx| MaybeDeferred::Immediate(f(ctx))));
        self
    }

    /// Set an async args interceptor. It receives its own copy of the context.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_async_args<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Args>> + Send + 'static,
    {
        self.args = Some(Arc::new(move |ctx| MaybeDeferred::defer(f(ctx.clone()))));
        self
    }

    /// Set the fn interceptor.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.result = Some(sync_result(f));
        self
    }

    /// Set an async fn interceptor.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_async_fn<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        self.result = Some(async_result(f));
        self
    }

    /// Set the resolver interceptor.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.resolver = Some(sync_result(f));
        self
    }

    /// Set an async resolver interceptor.
    #[must_use = "This method returns new Interceptors and does not modify self"]
    pub fn with_async_resolver<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        self.resolver = Some(async_result(f));
        self
    }

    /// Returns true if no interceptor is set.
    pub fn is_empty(&self) -> bool {
        self.args.is_none() && self.result.is_none() && self.resolver.is_none()
    }
}

fn sync_result<F>(f: F) -> ResultInterceptor
where
    F: Fn(&Context) -> RpcResult<Value> + Send + Sync + 'static,
{
    Arc::new(move |ctx| MaybeDeferred::Immediate(f(ctx)))
}

fn async_result<F, Fut>(f: F) -> ResultInterceptor
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Value>> + Send + 'static,
{
    Arc::new(move |ctx| MaybeDeferred::defer(f(ctx.clone())))
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("args", &self.args.is_some())
            .field("fn", &self.result.is_some())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}
