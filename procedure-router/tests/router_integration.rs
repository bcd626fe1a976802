//! Integration tests for the public API
//!
//! These tests build an API, groups, procedures and a router the way a
//! consumer of the crate would, and drive invocations end to end.

use procedure_router::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// Test Types
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
struct Signup {
    name: String,
    email: String,
}

impl Validate for Signup {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new()
            .required("name", &self.name)
            .email("email", &self.email)
            .build()
    }
}

/// Adapter listing `method name` pairs.
fn describe(registry: Arc<Registry>) -> Vec<String> {
    registry
        .methods()
        .iter()
        .zip(registry.route_names())
        .map(|(method, name)| format!("{} {}", method, name))
        .collect()
}

fn build_router() -> RpcResult<Router> {
    let api = Api::builder()
        .context(context_map! { "service" => "accounts" })
        .group(
            "session",
            Group::new().with_async_context_fn(|opts: ContextOptions| async move {
                let mut ctx = (*opts.context).clone();
                ctx.insert("user".into(), json!("ada"));
                Ok(ctx)
            }),
        )
        .group("http", Group::new().with_method("post"))
        .build()?;

    let signup = api
        .group("http")?
        .procedure("signup")
        .input(TypedSchema::<Signup>::validated())
        .define(|data| {
            let signup: Signup = data.input_as()?;
            Ok(json!({ "created": signup.name }))
        });

    let whoami = api
        .group("session")?
        .procedure("whoami")
        .define(|data| Ok(data.context.get("user").cloned().unwrap_or_default()));

    let status = Route::new("status", "health", |_| Ok(json!("up")))
        .with_resolver(|value, ctx| Ok(json!({ "status": value, "type": ctx.call_type() })));

    api.router("accounts")
        .routes([signup, whoami, status])
        .intercept_fn(|ctx| {
            let service = ctx.get("service").cloned().unwrap_or_default();
            Ok(json!({ "service": service, "data": ctx.result() }))
        })
        .adapter("describe", describe)
        .build()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_group_method_and_validated_input() {
    let router = build_router().unwrap();
    let post = router.invoker("post").expect("post invoker");

    let reply = post
        .call("signup", vec![json!({ "name": "ada", "email": "ada@example.com" })])
        .await
        .unwrap();
    assert_eq!(reply, json!({ "service": "accounts", "data": { "created": "ada" } }));

    let error = post
        .call("signup", vec![json!({ "name": "", "email": "nope" })])
        .await
        .unwrap_err();
    assert_eq!(error.code, RpcErrorCode::ValidationError);
    let fields: Vec<&str> = error.details.as_ref().unwrap()["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, ["name", "email"]);
}

#[tokio::test]
async fn test_async_group_context_defers() {
    let router = build_router().unwrap();
    let reply = router.invoker("call").unwrap().call("whoami", vec![]);

    assert!(reply.is_deferred());
    assert_eq!(
        reply.await.unwrap(),
        json!({ "service": "accounts", "data": "ada" })
    );
}

#[test]
fn test_custom_method_route_with_resolver() {
    let router = build_router().unwrap();
    let reply = router.invoker("health").unwrap().call("status", vec![]);

    let value = reply.into_immediate().ok().unwrap().unwrap();
    assert_eq!(value, json!({ "status": { "service": "accounts", "data": "up" }, "type": "custom" }));
}

#[test]
fn test_adapter_lists_routes() {
    let router = build_router().unwrap();
    let listing = router.adapter::<Vec<String>>("describe").unwrap();
    assert_eq!(listing, &["post signup", "call whoami", "health status"]);

    let member = router.member("describe").unwrap();
    assert!(member.downcast_ref::<Vec<String>>().is_some());
}

#[tokio::test]
async fn test_not_found_through_public_surface() {
    let router = build_router().unwrap();

    let error = router.call("call", "missing", vec![]).await.unwrap_err();
    assert_eq!(error.message, "Procedure \"missing\" with method \"call\" not found");

    let error = router.call("post", "missing", vec![]).await.unwrap_err();
    assert_eq!(error.message, "Request \"missing\" with method \"post\" not found");
}

#[test]
fn test_duplicate_across_groups_is_rejected() {
    let api = Api::builder()
        .group("a", Group::new())
        .group("b", Group::new())
        .build()
        .unwrap();

    let first = api.group("a").unwrap().procedure("same").define(|_| Ok(Value::Null));
    let second = api.group("b").unwrap().procedure("same").define(|_| Ok(Value::Null));

    let error = api.router("r").routes([first, second]).build().unwrap_err();
    assert_eq!(error.code, RpcErrorCode::DuplicateRoute);
}
