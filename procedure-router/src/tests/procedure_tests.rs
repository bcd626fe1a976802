//! Procedure chain: transforms, context derivation, sync/async unification

use super::immediate;
use crate::{
    Api, ContextMap, Group, ProcedureBuilder, RouterBuilder, RpcError, RpcErrorCode,
    TypedSchema, context_map, from_async_fn, from_fn, from_value_fn,
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn add(n: i64) -> crate::Transform {
    from_value_fn(move |v| Ok(json!(v.as_i64().unwrap_or_default() + n)))
}

#[test]
fn test_handler_without_input_transform_gets_none() {
    let route = ProcedureBuilder::new("abc").define(|data| Ok(json!(data.input.is_none())));
    assert_eq!(immediate(route.handle(vec![json!(1)])).unwrap(), json!(true));
}

#[test]
fn test_meta_is_passed_to_handler() {
    let api = Api::new();
    let route = api
        .procedure_with("abc", "foo")
        .unwrap()
        .define(|data| Ok(serde_json::to_value(&data.meta)?));

    assert_eq!(route.method(), "foo");
    assert_eq!(route.group(), "procedure");
    assert_eq!(
        immediate(route.handle(vec![])).unwrap(),
        json!({ "route": "abc", "method": "foo", "group": "procedure" })
    );
}

#[test]
fn test_input_handler_output_compose() {
    // g(h(f(a))) with f = +1, h = *10, g = +2
    let route = ProcedureBuilder::new("compose")
        .input(add(1))
        .output(add(2))
        .define(|data| Ok(json!(data.input_as::<i64>()? * 10)));

    assert_eq!(immediate(route.handle(vec![json!(4)])).unwrap(), json!(52));
}

#[test]
fn test_input_transform_sees_every_arg() {
    let route = ProcedureBuilder::new("sum")
        .input(from_fn(|args| {
            Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
        }))
        .define(|data| Ok(data.input.unwrap_or_default()));

    let reply = route.handle(vec![json!(1), json!(2), json!(3)]);
    assert_eq!(immediate(reply).unwrap(), json!(6));
}

#[test]
fn test_typed_schema_input() {
    let route = ProcedureBuilder::new("user")
        .input(TypedSchema::<String>::new())
        .define(|data| Ok(json!({ "user": data.input })));

    assert_eq!(
        immediate(route.handle(vec![json!("ada")])).unwrap(),
        json!({ "user": "ada" })
    );
    let error = immediate(route.handle(vec![json!(1)])).unwrap_err();
    assert_eq!(error.code, RpcErrorCode::ValidationError);
}

#[test]
fn test_parse_key_selects_schema_operation() {
    let api = Api::builder().parse_key("validate").build().unwrap();

    let matching = api
        .procedure("ok")
        .input(TypedSchema::<i64>::new().named("validate"))
        .define(|data| Ok(data.input.unwrap_or_default()));
    assert_eq!(immediate(matching.handle(vec![json!(7)])).unwrap(), json!(7));

    let missing = api
        .procedure("missing")
        .input(TypedSchema::<i64>::new())
        .define(|data| Ok(data.input.unwrap_or_default()));
    let error = immediate(missing.handle(vec![json!(7)])).unwrap_err();
    assert_eq!(error.code, RpcErrorCode::UnsupportedOperation);
}

#[test]
fn test_transform_errors_propagate_unchanged() {
    let original = RpcError::validation("Invalid id").with_cause("negative");
    let thrown = original.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let route = ProcedureBuilder::new("strict")
        .input(from_fn(move |_| Err(thrown.clone())))
        .define(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(null))
        });

    assert_eq!(immediate(route.handle(vec![])).unwrap_err(), original);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_output_error_propagates() {
    let route = ProcedureBuilder::new("out")
        .output(from_value_fn(|_| Err(RpcError::internal("bad output"))))
        .define(|_| Ok(json!(1)));

    assert_eq!(immediate(route.handle(vec![])).unwrap_err().message, "bad output");
}

#[test]
fn test_context_inherits_api_context() {
    let api = Api::builder()
        .context(context_map! { "foo" => "foo" })
        .build()
        .unwrap();
    let route = api
        .procedure("abc")
        .define(|data| Ok(Value::Object((*data.context).clone())));

    assert_eq!(immediate(route.handle(vec![])).unwrap(), json!({ "foo": "foo" }));
}

#[test]
fn test_static_group_context_replaces_api_context() {
    let api = Api::builder()
        .context(context_map! { "foo" => "foo" })
        .group("admin", Group::new().with_context(context_map! { "role" => "admin" }))
        .build()
        .unwrap();
    let route = api
        .group("admin")
        .unwrap()
        .procedure("abc")
        .define(|data| Ok(Value::Object((*data.context).clone())));

    assert_eq!(immediate(route.handle(vec![])).unwrap(), json!({ "role": "admin" }));
}

#[test]
fn test_context_factory_receives_defaults_meta_and_input() {
    let api = Api::builder()
        .context(context_map! { "foo" => "foo" })
        .group(
            "scoped",
            Group::new()
                .with_input(add(0))
                .with_context_fn(|opts| {
                    let mut ctx: ContextMap = (*opts.context).clone();
                    ctx.insert("route".into(), json!(opts.meta.route));
                    ctx.insert("input".into(), opts.input.unwrap_or_default());
                    Ok(ctx)
                }),
        )
        .build()
        .unwrap();

    let route = api
        .group("scoped")
        .unwrap()
        .procedure("abc")
        .define(|data| Ok(Value::Object((*data.context).clone())));

    assert_eq!(
        immediate(route.handle(vec![json!(3)])).unwrap(),
        json!({ "foo": "foo", "route": "abc", "input": 3 })
    );
}

#[test]
fn test_sync_chain_stays_immediate() {
    let route = ProcedureBuilder::new("sync")
        .input(add(1))
        .output(add(1))
        .define(|data| Ok(data.input.unwrap_or_default()));
    assert!(!route.handle(vec![json!(1)]).is_deferred());
}

#[tokio::test]
async fn test_async_context_defers_with_same_content() {
    let sync_api = Api::builder()
        .group(
            "g",
            Group::new().with_context_fn(|_| Ok(context_map! { "user" => "ada" })),
        )
        .build()
        .unwrap();
    let async_api = Api::builder()
        .group(
            "g",
            Group::new().with_async_context_fn(|_| async {
                tokio::task::yield_now().await;
                Ok(context_map! { "user" => "ada" })
            }),
        )
        .build()
        .unwrap();

    let handler = |data: crate::ProcedureData| Ok(json!({ "ctx": *data.context, "in": data.input }));
    let sync_route = sync_api.group("g").unwrap().procedure("abc").input(add(1)).define(handler);
    let async_route = async_api.group("g").unwrap().procedure("abc").input(add(1)).define(handler);

    let sync_reply = sync_route.handle(vec![json!(1)]);
    let async_reply = async_route.handle(vec![json!(1)]);
    assert!(!sync_reply.is_deferred());
    assert!(async_reply.is_deferred());
    assert_eq!(immediate(sync_reply).unwrap(), async_reply.await.unwrap());
}

#[tokio::test]
async fn test_async_handler_through_router() {
    let api = Api::new();
    let router = api
        .router("b")
        .route(api.procedure("slow").define_async(|_| async { Ok(json!("done")) }))
        .build()
        .unwrap();

    let reply = router.invoker("call").unwrap().call("slow", vec![]);
    assert!(reply.is_deferred());
    assert_eq!(reply.await.unwrap(), json!("done"));
}

#[tokio::test]
async fn test_deferred_context_error_propagates() {
    let api = Api::builder()
        .group(
            "g",
            Group::new().with_async_context_fn(|_| async { Err(RpcError::bad_request("no session")) }),
        )
        .build()
        .unwrap();
    let route = api
        .group("g")
        .unwrap()
        .procedure("abc")
        .define(|_| Ok(json!("unreachable")));

    let error = route.handle(vec![]).await.unwrap_err();
    assert_eq!(error.code, RpcErrorCode::BadRequest);
    assert_eq!(error.message, "no session");
}

#[tokio::test]
async fn test_deferred_input_defers_whole_chain() {
    let api = Api::new();
    let route = api
        .procedure("abc")
        .input(from_async_fn(|args| async move {
            tokio::task::yield_now().await;
            let n = args.first().and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(n + 1))
        }))
        .output(from_value_fn(|v| Ok(json!(v.as_i64().unwrap_or_default() * 10))))
        .define(|data| {
            let n = data.input.as_ref().and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(n + 100))
        });
    let router = api.router("b").route(route).build().unwrap();

    let reply = router.invoker("call").unwrap().call("abc", vec![json!(1)]);
    assert!(reply.is_deferred());
    assert_eq!(reply.await.unwrap(), json!(1020));
}

#[tokio::test]
async fn test_deferred_input_error_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let route = ProcedureBuilder::new("abc")
        .input(from_async_fn(|_| async { Err(RpcError::validation("bad")) }))
        .define(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("unreachable"))
        });

    let reply = route.handle(vec![json!(1)]);
    assert!(reply.is_deferred());
    let error = reply.await.unwrap_err();
    assert_eq!(error.code, RpcErrorCode::ValidationError);
    assert_eq!(error.message, "bad");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_define_outcome_chooses_per_call() {
    let route = ProcedureBuilder::new("maybe")
        .input(add(0))
        .define_outcome(|data| {
            let n = data.input.as_ref().and_then(Value::as_i64).unwrap_or_default();
            if n > 0 {
                crate::MaybeDeferred::defer(async move { Ok(json!(n)) })
            } else {
                crate::MaybeDeferred::ok(json!(0))
            }
        });

    assert!(!route.handle(vec![json!(0)]).is_deferred());
    assert!(route.handle(vec![json!(1)]).is_deferred());
}

#[test]
fn test_procedures_register_on_router() {
    let api = Api::new();
    let router = RouterBuilder::new("b")
        .route(api.procedure("a").define(|_| Ok(json!("a"))))
        .route(api.procedure_with("a", "get").unwrap().define(|_| Ok(json!("get a"))))
        .build()
        .unwrap();

    assert_eq!(immediate(router.call("call", "a", vec![])).unwrap(), json!("a"));
    assert_eq!(immediate(router.call("get", "a", vec![])).unwrap(), json!("get a"));
}
