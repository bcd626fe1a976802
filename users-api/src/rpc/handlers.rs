//! RPC handlers
//!
//! [`create_api`] configures the API and its groups, [`create_router`]
//! registers every procedure on top of it and attaches the interceptors and
//! adapters.

use super::*;
use procedure_router::prelude::*;
use procedure_router::HTTP_METHODS;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// API
// =============================================================================

/// Configure the API: static context plus the `user` and `admin` groups.
pub fn create_api(app: &AppContext) -> RpcResult<Api> {
    Api::builder()
        .context(app.context_map())
        .group(
            "user",
            Group::new()
                .with_method("get")
                .with_allowed_methods(["get", "post", "put", "delete"])
                .with_context_fn(|opts| {
                    let mut ctx = (*opts.context).clone();
                    ctx.insert("scope".into(), json!(format!("user.{}", opts.meta.route)));
                    Ok(ctx)
                }),
        )
        .group(
            "admin",
            Group::new()
                .with_method("post")
                .with_allowed_methods(["post"])
                .with_async_context_fn(|opts: ContextOptions| async move {
                    let mut ctx = (*opts.context).clone();
                    ctx.insert("role".into(), json!("admin"));
                    Ok(ctx)
                }),
        )
        .build()
}

// =============================================================================
// Router
// =============================================================================

/// Create the application router.
pub fn create_router(app: AppContext) -> RpcResult<Router> {
    let api = create_api(&app)?;

    let mut routes = root_procedures(&api, &app);
    routes.extend(user_procedures(&api, &app)?);
    routes.extend(admin_procedures(&api, &app)?);
    routes.push(version_route());

    api.router("users")
        .routes(routes)
        .interceptors(logging())
        .adapter("describe", describe)
        .adapter("http", HttpGateway::new)
        .build()
}

/// Logging interceptors - trace every stage, pass values through.
pub fn logging() -> Interceptors {
    Interceptors::new()
        .with_args(|ctx| {
            tracing::debug!(route = %ctx.route(), method = %ctx.method(), "→ invoke");
            Ok(ctx.args().to_vec())
        })
        .with_fn(|ctx| {
            tracing::debug!(route = %ctx.route(), method = %ctx.method(), "← handled");
            Ok(ctx.result().cloned().unwrap_or_default())
        })
        .with_resolver(|ctx| {
            tracing::trace!(route = %ctx.route(), "← resolved");
            Ok(ctx.result().cloned().unwrap_or_default())
        })
}

fn root_procedures(api: &Api, app: &AppContext) -> Vec<Route> {
    let health = api.procedure("health").define(|_| {
        to_value(HealthResponse {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        })
    });

    let greet = api
        .procedure("greet")
        .input(TypedSchema::<GreetInput>::validated())
        .define(|data| {
            let input: GreetInput = data.input_as()?;
            Ok(json!(format!("Hello, {}!", input.name)))
        });

    let store = app.store.clone();
    let stats = api.procedure("stats").define_async(move |_| {
        let store = store.clone();
        async move { store.len().map(|users| json!({ "users": users })) }
    });

    vec![health, greet, stats]
}

fn user_procedures(api: &Api, app: &AppContext) -> RpcResult<Vec<Route>> {
    let user = api.group("user")?;

    let store = app.store.clone();
    let get = user
        .procedure("get")
        .input(TypedSchema::<UserIdInput>::validated())
        .define(move |data| {
            let input: UserIdInput = data.input_as()?;
            let user = store.get(input.id)?.ok_or_else(|| user_not_found(input.id))?;
            to_value(user)
        });

    let store = app.store.clone();
    let list = user
        .procedure("list")
        .output(from_value_fn(|value| {
            let total = value.as_array().map_or(0, Vec::len);
            Ok(json!({ "items": value, "total": total }))
        }))
        .define(move |_| to_value(store.list()?));

    let store = app.store.clone();
    let create = user
        .procedure_with("create", "post")?
        .input(TypedSchema::<CreateUserInput>::validated())
        .define(move |data| {
            let input: CreateUserInput = data.input_as()?;
            to_value(store.insert(&input.name, &input.email)?)
        });

    let store = app.store.clone();
    let update = user
        .procedure_with("update", "put")?
        .input(TypedSchema::<UpdateUserInput>::validated())
        .define(move |data| {
            let input: UpdateUserInput = data.input_as()?;
            let user = store.update(&input)?.ok_or_else(|| user_not_found(input.id))?;
            to_value(user)
        });

    let store = app.store.clone();
    let delete = user
        .procedure_with("delete", "delete")?
        .input(TypedSchema::<UserIdInput>::validated())
        .define(move |data| {
            let input: UserIdInput = data.input_as()?;
            if store.remove(input.id)? {
                Ok(json!({ "deleted": input.id }))
            } else {
                Err(user_not_found(input.id))
            }
        });

    Ok(vec![get, list, create, update, delete])
}

fn admin_procedures(api: &Api, app: &AppContext) -> RpcResult<Vec<Route>> {
    let store = app.store.clone();
    let audit = api.group("admin")?.procedure("audit").define(move |data| {
        let users = store.len()?;
        Ok(json!({
            "role": data.context.get("role").cloned().unwrap_or_default(),
            "users": users,
        }))
    });

    Ok(vec![audit])
}

/// Raw route under a custom method; the resolver stamps the router name.
fn version_route() -> Route {
    Route::new("version", "meta", |_| Ok(json!(env!("CARGO_PKG_VERSION"))))
        .with_resolver(|value, ctx| Ok(json!({ "version": value, "router": ctx.router_name() })))
}

fn to_value<T: Serialize>(value: T) -> RpcResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn user_not_found(id: u32) -> RpcError {
    RpcError::not_found(format!("User {} not found", id)).with_details(json!({ "id": id }))
}

// =============================================================================
// Adapters
// =============================================================================

/// Adapter listing every route as `METHOD name`.
pub fn describe(registry: Arc<Registry>) -> Vec<String> {
    registry
        .methods()
        .iter()
        .zip(registry.route_names())
        .map(|(method, name)| format!("{} {}", method.to_uppercase(), name))
        .collect()
}

/// Adapter dispatching HTTP-style requests onto the registry.
///
/// Methods are matched case-insensitively and only HTTP methods are served;
/// the request body, if any, becomes the single argument.
pub struct HttpGateway {
    registry: Arc<Registry>,
}

impl HttpGateway {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Routes reachable through the gateway, as `(method, name)`.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.registry
            .mapped_router()
            .iter()
            .filter(|(method, _)| is_http(method))
            .flat_map(|(method, by_name)| {
                by_name.keys().map(move |name| (method.as_str(), name.as_str()))
            })
    }

    /// Serve one request. `method` matches a registered method key in any
    /// letter case.
    pub fn handle(&self, method: &str, name: &str, body: Option<Value>) -> Outcome {
        if !is_http(method) {
            return MaybeDeferred::err(RpcError::bad_request(format!(
                "Unsupported HTTP method \"{}\"",
                method
            )));
        }
        let key = self
            .registry
            .mapped_router()
            .keys()
            .find(|key| key.eq_ignore_ascii_case(method))
            .map_or_else(|| method.to_ascii_lowercase(), String::clone);
        self.registry.invoke(&key, name, body.into_iter().collect())
    }
}

fn is_http(method: &str) -> bool {
    HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}
