//! Lifecycle logging
//!
//! The router emits `tracing` events when it is assembled (routes registered,
//! router built, adapters attached, API configured) and opens a span per
//! invocation keyed by a [`RequestId`]. It never logs errors: they belong to
//! whoever awaits the reply.

mod lifecycle;
mod types;

pub use lifecycle::{
    invocation_span, log_adapter_attached, log_api_configured, log_procedure_defined,
    log_route_registered, log_router_built,
};
pub use types::{RequestId, SHORT_ID_LENGTH};
