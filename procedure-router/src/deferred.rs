//! Sync/async unification
//!
//! Every stage of a procedure (input parsing, context derivation, the handler
//! itself) may finish right away or hand back a future. [`MaybeDeferred`]
//! tags which of the two happened, and its combinators keep composing
//! synchronously until a stage actually defers. From that point on the rest
//! of the chain is sequenced on the future, in the same order.
//!
//! Callers never have to branch: every `MaybeDeferred` implements
//! [`IntoFuture`], so `.await` works on immediate and deferred values alike.
//!
//! ```rust,ignore
//! let reply = router.invoker("call").unwrap().call("user", vec![json!("42")]);
//! let value = reply.await?;
//! ```

use crate::RpcResult;
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::{Future, IntoFuture};

/// A value that is either available now or produced by a future.
pub enum MaybeDeferred<T> {
    /// The stage finished synchronously.
    Immediate(T),
    /// The stage suspended; the value arrives when the future settles.
    Deferred(BoxFuture<'static, T>),
}

/// Result of a pipeline stage: an [`RpcResult`] that may be deferred.
pub type Outcome<T = serde_json::Value> = MaybeDeferred<RpcResult<T>>;

impl<T: Send + 'static> MaybeDeferred<T> {
    /// Wrap a future as a deferred value.
    pub fn defer<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::Deferred(fut.boxed())
    }

    /// Returns true if the value is produced by a future.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Take the value if it is available now, or get `self` back.
    pub fn into_immediate(self) -> Result<T, Self> {
        match self {
            Self::Immediate(value) => Ok(value),
            deferred => Err(deferred),
        }
    }

    /// Transform the value once it is available.
    pub fn map<U, F>(self, f: F) -> MaybeDeferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Self::Immediate(value) => MaybeDeferred::Immediate(f(value)),
            Self::Deferred(fut) => MaybeDeferred::Deferred(fut.map(f).boxed()),
        }
    }

    /// Chain a stage that may itself defer.
    ///
    /// The result stays immediate only when both `self` and the value
    /// returned by `f` are immediate.
    pub fn then<U, F>(self, f: F) -> MaybeDeferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> MaybeDeferred<U> + Send + 'static,
    {
        match self {
            Self::Immediate(value) => f(value),
            Self::Deferred(fut) => MaybeDeferred::Deferred(
                async move {
                    let value = fut.await;
                    f(value).await
                }
                .boxed(),
            ),
        }
    }

    /// Attach a tracing span to the deferred part of the chain.
    pub fn in_span(self, span: tracing::Span) -> Self {
        use tracing::Instrument;

        match self {
            Self::Immediate(value) => Self::Immediate(value),
            Self::Deferred(fut) => Self::Deferred(fut.instrument(span).boxed()),
        }
    }
}

impl<T, E> MaybeDeferred<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// An immediate success.
    pub fn ok(value: T) -> Self {
        Self::Immediate(Ok(value))
    }

    /// An immediate failure.
    pub fn err(error: E) -> Self {
        Self::Immediate(Err(error))
    }

    /// Transform the success value; errors pass through untouched.
    pub fn map_ok<U, F>(self, f: F) -> MaybeDeferred<Result<U, E>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.map(|result| result.map(f))
    }

    /// Run a fallible synchronous step on the success value.
    pub fn try_map<U, F>(self, f: F) -> MaybeDeferred<Result<U, E>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.map(|result| result.and_then(f))
    }

    /// Chain a fallible stage that may defer. The first error short-circuits.
    pub fn and_then<U, F>(self, f: F) -> MaybeDeferred<Result<U, E>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> MaybeDeferred<Result<U, E>> + Send + 'static,
    {
        self.then(|result| match result {
            Ok(value) => f(value),
            Err(error) => MaybeDeferred::Immediate(Err(error)),
        })
    }
}

impl<T> From<T> for MaybeDeferred<T> {
    fn from(value: T) -> Self {
        Self::Immediate(value)
    }
}

impl<T: Send + 'static> IntoFuture for MaybeDeferred<T> {
    type Output = T;
    type IntoFuture = BoxFuture<'static, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Immediate(value) => future::ready(value).boxed(),
            Self::Deferred(fut) => fut,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MaybeDeferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
