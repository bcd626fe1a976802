//! API configuration: reserved keys and names, groups, allow-lists, defaults

use super::immediate;
use crate::{
    Api, ApiConfig, Group, RESERVED_CONTEXT, RESERVED_NAMES, RpcErrorCode, context_map,
    from_value_fn,
};
use serde_json::json;

#[test]
fn test_reserved_api_context_key_rejected() {
    for key in RESERVED_CONTEXT {
        let mut context = context_map! { "foo" => "foo" };
        context.insert((*key).to_string(), json!("x"));

        let error = Api::builder().context(context).build().unwrap_err();
        assert_eq!(error.code, RpcErrorCode::ReservedContextKey);
        assert_eq!(
            error.message,
            format!("Property \"{}\" is a reserved keyword for base context", key)
        );
    }
}

#[test]
fn test_unreserved_context_accepted() {
    let api = Api::builder()
        .context(context_map! { "foo" => "foo" })
        .build()
        .unwrap();
    assert_eq!(api.context().get("foo"), Some(&json!("foo")));
}

#[test]
fn test_reserved_group_context_key_rejected() {
    let error = Api::builder()
        .group("admin", Group::new().with_context(context_map! { "args" => "x" }))
        .build()
        .unwrap_err();
    assert_eq!(error.code, RpcErrorCode::ReservedContextKey);
}

#[test]
fn test_reserved_group_names_rejected() {
    for name in RESERVED_NAMES {
        let error = Api::builder().group(*name, Group::new()).build().unwrap_err();
        assert_eq!(error.code, RpcErrorCode::ReservedName);
        assert!(error.message.contains(name));
    }
}

#[test]
fn test_unknown_group() {
    let api = Api::new();
    let error = api.group("nope").unwrap_err();
    assert_eq!(error.code, RpcErrorCode::UnknownGroup);
}

#[test]
fn test_invalid_config_rejected() {
    let error = Api::builder().parse_key("").build().unwrap_err();
    assert_eq!(error.code, RpcErrorCode::InvalidConfig);

    let error = Api::builder()
        .config(ApiConfig::new().with_allowed_methods(["get"]))
        .build()
        .unwrap_err();
    assert_eq!(error.code, RpcErrorCode::InvalidConfig);
}

#[test]
fn test_default_method_applies() {
    let api = Api::builder().default_method("get").build().unwrap();
    let route = api.procedure("abc").define(|_| Ok(json!(1)));
    assert_eq!(route.method(), "get");
}

#[test]
fn test_allowed_methods_enforced() {
    let api = Api::builder()
        .default_method("get")
        .allowed_methods(["get", "post"])
        .build()
        .unwrap();

    assert!(api.procedure_with("abc", "post").is_ok());
    let error = api.procedure_with("abc", "put").err().unwrap();
    assert_eq!(error.code, RpcErrorCode::MethodNotAllowed);
    assert_eq!(error.message, "Method \"put\" is not allowed");
}

#[test]
fn test_group_allow_list_overrides_api() {
    let api = Api::builder()
        .group(
            "writes",
            Group::new()
                .with_method("post")
                .with_allowed_methods(["post", "put"]),
        )
        .build()
        .unwrap();

    let writes = api.group("writes").unwrap();
    assert_eq!(writes.default_method(), "post");
    assert!(writes.procedure_with("a", "put").is_ok());
    assert_eq!(
        writes.procedure_with("a", "call").err().unwrap().code,
        RpcErrorCode::MethodNotAllowed
    );
    // Outside the group no allow-list applies.
    assert!(api.procedure_with("a", "anything").is_ok());
}

#[test]
fn test_group_default_method_must_be_allowed() {
    let error = Api::builder()
        .group("g", Group::new().with_allowed_methods(["get"]))
        .build()
        .unwrap_err();
    assert_eq!(error.code, RpcErrorCode::MethodNotAllowed);
}

#[test]
fn test_group_defaults_and_precedence() {
    let api = Api::builder()
        .default_output(from_value_fn(|v| Ok(json!({ "api": v }))))
        .group(
            "wrapped",
            Group::new()
                .with_method("get")
                .with_output(from_value_fn(|v| Ok(json!({ "group": v })))),
        )
        .build()
        .unwrap();

    let plain = api.procedure("a").define(|_| Ok(json!(1)));
    assert_eq!(immediate(plain.handle(vec![])).unwrap(), json!({ "api": 1 }));

    let grouped = api.group("wrapped").unwrap().procedure("b").define(|_| Ok(json!(2)));
    assert_eq!(grouped.method(), "get");
    assert_eq!(grouped.group(), "wrapped");
    assert_eq!(immediate(grouped.handle(vec![])).unwrap(), json!({ "group": 2 }));

    let explicit = api
        .group("wrapped")
        .unwrap()
        .procedure("c")
        .output(from_value_fn(|v| Ok(json!({ "own": v }))))
        .define(|_| Ok(json!(3)));
    assert_eq!(immediate(explicit.handle(vec![])).unwrap(), json!({ "own": 3 }));
}

#[test]
fn test_default_input_is_inherited() {
    let api = Api::builder()
        .default_input(from_value_fn(|v| Ok(json!(v.as_i64().unwrap_or_default() * 2))))
        .build()
        .unwrap();

    let builder = api.procedure("abc");
    assert!(builder.has_input());
    let route = builder.define(|data| Ok(data.input.unwrap_or_default()));
    assert_eq!(immediate(route.handle(vec![json!(21)])).unwrap(), json!(42));
}

#[test]
fn test_router_inherits_api_context() {
    let api = Api::builder()
        .context(context_map! { "foo" => "foo" })
        .build()
        .unwrap();

    let router = api
        .router("b")
        .route(api.procedure("abc").define(|_| Ok(json!(true))))
        .intercept_fn(|ctx| Ok(ctx.get("foo").cloned().unwrap_or_default()))
        .build()
        .unwrap();

    assert_eq!(router.context().get("foo"), Some(&json!("foo")));
    assert_eq!(immediate(router.call("call", "abc", vec![])).unwrap(), json!("foo"));
}

#[test]
fn test_config_deserializes_into_api() {
    let config: ApiConfig = serde_json::from_value(json!({ "default_method": "post" })).unwrap();
    let api = Api::builder().config(config).build().unwrap();
    assert_eq!(api.config().default_method, "post");
    assert_eq!(api.config().parse_key, "parse");
}
