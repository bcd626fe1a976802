//! API entry point
//!
//! An [`Api`] holds everything procedures and routers inherit: the static
//! context, API-wide defaults, the parse key, the method allow-list and the
//! named [`Group`]s. It is configured once through [`ApiBuilder`], which
//! validates the whole configuration up front, and is read-only afterwards.
//!
//! Precedence for inherited settings is procedure, then group, then API.
//!
//! # Example
//!
//! ```rust,ignore
//! use procedure_router::prelude::*;
//!
//! let api = Api::builder()
//!     .context(context_map! { "db" => "primary" })
//!     .group("admin", Group::new().with_method("post"))
//!     .build()?;
//!
//! let user = api.procedure("user").define(|_| Ok(json!("ada")));
//! let ban = api.group("admin")?.procedure("ban").define(|_| Ok(json!(true)));
//!
//! let router = api.router("users").routes([user, ban]).build()?;
//! ```

use crate::{
    ContextMap, RpcError, RpcResult,
    config::{ApiConfig, method_allowed},
    context::ensure_unreserved,
    group::Group,
    logging::log_api_configured,
    procedure::{DEFAULT_GROUP, ProcedureBuilder, ProcedureScope},
    router::RouterBuilder,
    schema::Transform,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Names a group may not take.
pub const RESERVED_NAMES: &[&str] = &["call", "procedure", "create", "router", "context"];

/// Configured API.
#[derive(Debug, Clone)]
pub struct Api {
    config: ApiConfig,
    context: Arc<ContextMap>,
    input: Option<Transform>,
    output: Option<Transform>,
    groups: IndexMap<String, Group>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            config: ApiConfig::default(),
            context: Arc::new(ContextMap::new()),
            input: None,
            output: None,
            groups: IndexMap::new(),
        }
    }
}

impl Api {
    /// Start configuring an API.
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    /// API with default settings and an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-data settings.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Static context.
    pub fn context(&self) -> &ContextMap {
        &self.context
    }

    /// Names of configured groups.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Procedure in the default group, with the default method.
    pub fn procedure(&self, name: impl Into<String>) -> ProcedureBuilder {
        ProcedureBuilder::scoped(
            self.scope(DEFAULT_GROUP, None),
            name.into(),
            self.config.default_method.clone(),
        )
    }

    /// Procedure in the default group with an explicit method.
    ///
    /// # Errors
    ///
    /// `METHOD_NOT_ALLOWED` if the method is outside the allow-list.
    pub fn procedure_with(
        &self,
        name: impl Into<String>,
        method: impl Into<String>,
    ) -> RpcResult<ProcedureBuilder> {
        let method = method.into();
        check_allowed(&method, self.config.allowed_methods.as_deref())?;
        Ok(ProcedureBuilder::scoped(
            self.scope(DEFAULT_GROUP, None),
            name.into(),
            method,
        ))
    }

    /// Scope for building procedures in a configured group.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_GROUP` if no group has that name.
    pub fn group(&self, name: &str) -> RpcResult<GroupScope<'_>> {
        let (name, group) = self
            .groups
            .get_key_value(name)
            .ok_or_else(|| RpcError::unknown_group(name))?;
        Ok(GroupScope {
            api: self,
            name,
            group,
        })
    }

    /// Router builder seeded with this API's static context.
    pub fn router(&self, name: impl Into<String>) -> RouterBuilder {
        RouterBuilder::with_shared_context(name, self.context.clone())
    }

    fn scope(&self, group_name: &str, group: Option<&Group>) -> ProcedureScope {
        ProcedureScope {
            group: group_name.to_string(),
            parse_key: self.config.parse_key.clone(),
            default_context: self.context.clone(),
            context: group.map(|g| g.context.clone()).unwrap_or_default(),
            input: or_inherit(group.and_then(|g| g.input.as_ref()), &self.input),
            output: or_inherit(group.and_then(|g| g.output.as_ref()), &self.output),
        }
    }
}

/// Procedure factory bound to one group.
#[derive(Debug, Clone, Copy)]
pub struct GroupScope<'a> {
    api: &'a Api,
    name: &'a str,
    group: &'a Group,
}

impl GroupScope<'_> {
    /// Group name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Method used when a procedure does not name one.
    pub fn default_method(&self) -> &str {
        self.group
            .method
            .as_deref()
            .unwrap_or(&self.api.config.default_method)
    }

    /// Procedure in this group, with the group's default method.
    pub fn procedure(&self, name: impl Into<String>) -> ProcedureBuilder {
        ProcedureBuilder::scoped(
            self.api.scope(self.name, Some(self.group)),
            name.into(),
            self.default_method().to_string(),
        )
    }

    /// Procedure in this group with an explicit method.
    ///
    /// # Errors
    ///
    /// `METHOD_NOT_ALLOWED` if the method is outside the group's allow-list,
    /// or the API's when the group has none.
    pub fn procedure_with(
        &self,
        name: impl Into<String>,
        method: impl Into<String>,
    ) -> RpcResult<ProcedureBuilder> {
        let method = method.into();
        check_allowed(&method, allowed_methods(self.group, &self.api.config))?;
        Ok(ProcedureBuilder::scoped(
            self.api.scope(self.name, Some(self.group)),
            name.into(),
            method,
        ))
    }
}

fn or_inherit(own: Option<&Transform>, fallback: &Option<Transform>) -> Option<Transform> {
    own.or(fallback.as_ref()).cloned()
}

/// The group's allow-list, or the API's when the group has none.
fn allowed_methods<'a>(group: &'a Group, config: &'a ApiConfig) -> Option<&'a [String]> {
    group
        .allowed_methods
        .as_deref()
        .or(config.allowed_methods.as_deref())
}

fn check_allowed(method: &str, allowed: Option<&[String]>) -> RpcResult<()> {
    match allowed {
        Some(allowed) if !method_allowed(Some(allowed), method) => {
            Err(RpcError::method_not_allowed(method, allowed))
        }
        _ => Ok(()),
    }
}

/// Builder for [`Api`].
#[derive(Debug, Default)]
pub struct ApiBuilder {
    config: ApiConfig,
    context: ContextMap,
    input: Option<Transform>,
    output: Option<Transform>,
    groups: IndexMap<String, Group>,
}

impl ApiBuilder {
    /// Replace the plain-data settings.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Static context shared by every procedure and router.
    pub fn context(mut self, context: ContextMap) -> Self {
        self.context = context;
        self
    }

    /// Name of the schema operation used by transforms.
    pub fn parse_key(mut self, key: impl Into<String>) -> Self {
        self.config.parse_key = key.into();
        self
    }

    /// Method used when a procedure does not name one.
    pub fn default_method(mut self, method: impl Into<String>) -> Self {
        self.config.default_method = method.into();
        self
    }

    /// Restrict procedures to the given methods.
    pub fn allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    /// Input transform inherited by every procedure.
    pub fn default_input(mut self, transform: impl Into<Transform>) -> Self {
        self.input = Some(transform.into());
        self
    }

    /// Output transform inherited by every procedure.
    pub fn default_output(mut self, transform: impl Into<Transform>) -> Self {
        self.output = Some(transform.into());
        self
    }

    /// Register a named group. A later group with the same name replaces it.
    pub fn group(mut self, name: impl Into<String>, group: Group) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// - `INVALID_CONFIG` if [`ApiConfig::validate`] fails
    /// - `RESERVED_CONTEXT_KEY` if the API or a group context uses a reserved key
    /// - `RESERVED_NAME` if a group shadows an API member
    /// - `METHOD_NOT_ALLOWED` if a group's default method is outside its allow-list
    pub fn build(self) -> RpcResult<Api> {
        self.config.validate()?;
        ensure_unreserved(&self.context)?;

        for (name, group) in &self.groups {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(RpcError::reserved_name(name));
            }
            if let Some(context) = group.context.static_context() {
                ensure_unreserved(context)?;
            }

            let method = group.method.as_deref().unwrap_or(&self.config.default_method);
            check_allowed(method, allowed_methods(group, &self.config))?;
        }

        log_api_configured(&self.config.default_method, self.groups.len());

        Ok(Api {
            config: self.config,
            context: Arc::new(self.context),
            input: self.input,
            output: self.output,
            groups: self.groups,
        })
    }
}
