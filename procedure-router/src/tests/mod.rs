//! Test module for procedure-router
//!
//! Unit and property-based tests covering route registration, the
//! invocation pipeline, the procedure chain, API configuration and adapters.

use crate::{Outcome, RpcResult};
use serde_json::Value;

pub mod api_tests;
pub mod error_tests;
pub mod procedure_tests;

/// Unwrap an outcome that must not have deferred.
pub(crate) fn immediate(outcome: Outcome) -> RpcResult<Value> {
    outcome
        .into_immediate()
        .expect("outcome should be immediate")
}
