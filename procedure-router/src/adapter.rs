//! Router adapters
//!
//! An adapter extends a router with a named member built from the internal
//! [`Registry`]. Factories run exactly once, in registration order, while the
//! router is built. The value they return is stored type-erased and read back
//! with [`Router::adapter`](crate::Router::adapter).
//!
//! # Example
//! ```rust,ignore
//! let router = api
//!     .router("users")
//!     .routes(routes)
//!     .adapter("describe", |registry: Arc<Registry>| registry.route_names().to_vec())
//!     .build()?;
//!
//! let names: &Vec<String> = router.adapter("describe").unwrap();
//! ```

use crate::router::Registry;
use std::any::Any;
use std::sync::Arc;

/// Type-erased adapter value.
pub type AdapterValue = Arc<dyn Any + Send + Sync>;

pub(crate) type AdapterFactory = Box<dyn FnOnce(Arc<Registry>) -> AdapterValue + Send>;

/// Something that can be attached to a router under a name.
///
/// Implemented for every `FnOnce(Arc<Registry>) -> T`.
pub trait Adapter: Send + 'static {
    /// Value stored on the router.
    type Output: Any + Send + Sync;

    /// Build the adapter value from the registry view.
    fn attach(self, registry: Arc<Registry>) -> Self::Output;
}

impl<F, T> Adapter for F
where
    F: FnOnce(Arc<Registry>) -> T + Send + 'static,
    T: Any + Send + Sync,
{
    type Output = T;

    fn attach(self, registry: Arc<Registry>) -> T {
        self(registry)
    }
}

pub(crate) fn into_factory<A: Adapter>(adapter: A) -> AdapterFactory {
    Box::new(move |registry| Arc::new(adapter.attach(registry)) as AdapterValue)
}
