//! App RPC - API, router, types and services

mod context;
mod handlers;
mod types;

pub use context::*;
pub use handlers::*;
pub use types::*;
