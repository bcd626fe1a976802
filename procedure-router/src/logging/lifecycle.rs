//! Router lifecycle logging functions.
//!
//! Construction events are logged at trace level per item and at debug level
//! per summary. Invocations get a trace-level span.

use super::types::RequestId;

/// Log API configuration. Logged at Debug level.
///
/// ```rust,ignore
/// log_api_configured("call", 2);
/// ```
pub fn log_api_configured(default_method: &str, group_count: usize) {
    tracing::debug!(
        default_method = %default_method,
        group_count = %group_count,
        "API configured"
    );
}

/// Log a procedure definition. Logged at Trace level.
pub fn log_procedure_defined(route: &str, method: &str, group: &str) {
    tracing::trace!(
        route = %route,
        method = %method,
        group = %group,
        "Procedure defined"
    );
}

/// Log route registration. Logged at Trace level.
///
/// ```rust,ignore
/// log_route_registered("users", "get", "call");
/// ```
pub fn log_route_registered(router: &str, route: &str, method: &str) {
    tracing::trace!(
        router = %router,
        route = %route,
        method = %method,
        "Route registered"
    );
}

/// Log router construction. Logged at Debug level.
pub fn log_router_built(router: &str, route_count: usize, method_count: usize) {
    tracing::debug!(
        router = %router,
        route_count = %route_count,
        method_count = %method_count,
        "Router built"
    );
}

/// Log adapter attachment. Logged at Trace level.
pub fn log_adapter_attached(router: &str, adapter: &str) {
    tracing::trace!(
        router = %router,
        adapter = %adapter,
        "Adapter attached"
    );
}

/// Open the span for one invocation and log its start.
///
/// The span stays attached to any deferred stage of the invocation.
pub fn invocation_span(router: &str, route: &str, method: &str) -> tracing::Span {
    let request_id = RequestId::new();
    let span = tracing::trace_span!(
        "invoke",
        request_id = %request_id.short(),
        router = %router,
        route = %route,
        method = %method,
    );
    span.in_scope(|| tracing::trace!("Invocation started"));
    span
}
