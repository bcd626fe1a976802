//! Group policies
//!
//! A [`Group`] bundles the defaults shared by every procedure built in it:
//! method, input and output transforms, where the handler context comes from,
//! and which methods are allowed. Groups are registered on the
//! [`ApiBuilder`](crate::ApiBuilder) and never change afterwards. Anything a
//! group leaves unset falls back to the API-wide setting.
//!
//! # Example
//! ```rust,ignore
//! let admin = Group::new()
//!     .with_method("post")
//!     .with_context_fn(|opts| {
//!         let mut ctx = (*opts.context).clone();
//!         ctx.insert("role".into(), json!("admin"));
//!         Ok(ctx)
//!     });
//! ```

use crate::{
    ContextMap, Outcome, RpcResult, deferred::MaybeDeferred, procedure::ProcedureMeta,
    schema::Transform,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Arguments handed to a context factory.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// The API-wide static context
    pub context: Arc<ContextMap>,
    /// Route, method and group of the running procedure
    pub meta: ProcedureMeta,
    /// Parsed input, if the procedure has an input transform
    pub input: Option<Value>,
}

/// Boxed context factory.
pub type ContextFactory = Arc<dyn Fn(ContextOptions) -> Outcome<ContextMap> + Send + Sync>;

/// Where a procedure's handler context comes from.
#[derive(Clone, Default)]
pub enum ContextSource {
    /// Use the API-wide static context.
    #[default]
    Inherit,
    /// A fixed context.
    Static(Arc<ContextMap>),
    /// Computed per invocation, possibly deferred.
    Factory(ContextFactory),
}

impl ContextSource {
    /// Derive the context for one invocation.
    pub(crate) fn derive(
        &self,
        default: &Arc<ContextMap>,
        meta: &ProcedureMeta,
        input: Option<Value>,
    ) -> Outcome<Arc<ContextMap>> {
        match self {
            Self::Inherit => MaybeDeferred::ok(default.clone()),
            Self::Static(context) => MaybeDeferred::ok(context.clone()),
            Self::Factory(factory) => factory(ContextOptions {
                context: default.clone(),
                meta: meta.clone(),
                input,
            })
            .map_ok(Arc::new),
        }
    }

    pub(crate) fn static_context(&self) -> Option<&ContextMap> {
        match self {
            Self::Static(context) => Some(context),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inherit => f.write_str("Inherit"),
            Self::Static(context) => f.debug_tuple("Static").field(context).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Defaults shared by the procedures of one group.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub(crate) method: Option<String>,
    pub(crate) input: Option<Transform>,
    pub(crate) output: Option<Transform>,
    pub(crate) context: ContextSource,
    pub(crate) allowed_methods: Option<Vec<String>>,
}

impl Group {
    /// A group that inherits every API-wide setting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default method for procedures of this group.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Default input transform.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_input(mut self, transform: impl Into<Transform>) -> Self {
        self.input = Some(transform.into());
        self
    }

    /// Default output transform.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_output(mut self, transform: impl Into<Transform>) -> Self {
        self.output = Some(transform.into());
        self
    }

    /// Fixed handler context. Checked for reserved keys when the API is built.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_context(mut self, context: ContextMap) -> Self {
        self.context = ContextSource::Static(Arc::new(context));
        self
    }

    /// Handler context computed per invocation.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_context_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn(ContextOptions) -> RpcResult<ContextMap> + Send + Sync + 'static,
    {
        self.context = ContextSource::Factory(Arc::new(move |opts| {
            MaybeDeferred::Immediate(factory(opts))
        }));
        self
    }

    /// Handler context computed per invocation by a future.
    ///
    /// Every procedure of the group then produces deferred replies.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_async_context_fn<F, Fut>(mut self, factory: F) -> Self
    where
        F: Fn(ContextOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<ContextMap>> + Send + 'static,
    {
        self.context = ContextSource::Factory(Arc::new(move |opts| {
            MaybeDeferred::defer(factory(opts))
        }));
        self
    }

    /// Restrict this group's procedures to the given methods.
    #[must_use = "This method returns a new Group and does not modify self"]
    pub fn with_allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    /// Default method, if the group sets one.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Method allow-list, if the group sets one.
    pub fn allowed_methods(&self) -> Option<&[String]> {
        self.allowed_methods.as_deref()
    }
}
