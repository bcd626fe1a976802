//! Input and output transforms
//!
//! A procedure may parse its raw args before the handler runs and reshape the
//! handler's value afterwards. Both steps take a [`Transform`], which is one
//! of two things:
//!
//! - a plain function, built with [`from_fn`], [`from_value_fn`] or
//!   [`from_async_fn`];
//! - a [`Schema`] object exposing named operations. The API calls the
//!   operation named by its parse key (`"parse"` unless configured), and a
//!   schema without that operation fails with `UNSUPPORTED_OPERATION`.
//!
//! [`TypedSchema`] is the schema this crate ships: a serde round trip through
//! a Rust type, optionally followed by its [`Validate`] rules.
//!
//! Errors raised by a transform reach the caller unchanged.

use crate::{
    Args, Outcome, RpcError, RpcResult,
    config::DEFAULT_PARSE_KEY,
    deferred::MaybeDeferred,
    validation::{Validate, ValidationResult},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A schema object with named operations.
pub trait Schema: Send + Sync + 'static {
    /// Run `operation` on `args`.
    ///
    /// Returns `None` when the schema has no operation by that name.
    fn run(&self, operation: &str, args: Args) -> Option<Outcome>;
}

/// Boxed transform function.
pub type TransformFn = Arc<dyn Fn(Args) -> Outcome + Send + Sync>;

/// An input or output transform.
#[derive(Clone)]
pub enum Transform {
    /// Plain function over the raw args.
    Fn(TransformFn),
    /// Schema object; the configured operation is invoked.
    Schema(Arc<dyn Schema>),
}

impl Transform {
    /// Wrap a schema object.
    pub fn schema(schema: impl Schema) -> Self {
        Self::Schema(Arc::new(schema))
    }

    /// Apply to raw args, as an input transform does.
    pub fn apply(&self, parse_key: &str, args: Args) -> Outcome {
        match self {
            Self::Fn(f) => f(args),
            Self::Schema(schema) => schema
                .run(parse_key, args)
                .unwrap_or_else(|| MaybeDeferred::err(RpcError::unsupported_operation(parse_key))),
        }
    }

    /// Apply to a single value, as an output transform does.
    pub fn apply_value(&self, parse_key: &str, value: Value) -> Outcome {
        self.apply(parse_key, vec![value])
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fn(_) => f.write_str("Transform::Fn(..)"),
            Self::Schema(_) => f.write_str("Transform::Schema(..)"),
        }
    }
}

impl<T> From<TypedSchema<T>> for Transform
where
    T: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    fn from(schema: TypedSchema<T>) -> Self {
        Self::schema(schema)
    }
}

impl From<Arc<dyn Schema>> for Transform {
    fn from(schema: Arc<dyn Schema>) -> Self {
        Self::Schema(schema)
    }
}

/// Transform from a function over all raw args.
pub fn from_fn<F>(f: F) -> Transform
where
    F: Fn(Args) -> RpcResult<Value> + Send + Sync + 'static,
{
    Transform::Fn(Arc::new(move |args| MaybeDeferred::Immediate(f(args))))
}

/// Transform from a function over the first arg (`null` when there is none).
///
/// The natural shape for output transforms, which always see one value.
pub fn from_value_fn<F>(f: F) -> Transform
where
    F: Fn(Value) -> RpcResult<Value> + Send + Sync + 'static,
{
    Transform::Fn(Arc::new(move |args| {
        MaybeDeferred::Immediate(f(first_arg(args)))
    }))
}

/// Transform from an async function over all raw args.
pub fn from_async_fn<F, Fut>(f: F) -> Transform
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Value>> + Send + 'static,
{
    Transform::Fn(Arc::new(move |args| MaybeDeferred::defer(f(args))))
}

fn first_arg(args: Args) -> Value {
    args.into_iter().next().unwrap_or(Value::Null)
}

/// Collapse raw args into one value: none is `null`, one is itself, more is an array.
fn collapse(mut args: Args) -> Value {
    match args.len() {
        0 => Value::Null,
        1 => args.swap_remove(0),
        _ => Value::Array(args),
    }
}

type Check<T> = fn(&T) -> ValidationResult;

/// Schema that parses through a Rust type with serde.
///
/// The args are collapsed into one JSON value, deserialized into `T`,
/// optionally validated, and serialized back. Deserialization failures are
/// `VALIDATION_ERROR`s.
///
/// ```rust,ignore
/// let by_id = api
///     .procedure("user")
///     .input(TypedSchema::<UserId>::new())
///     .define(|data| Ok(data.input.unwrap_or_default()));
/// ```
pub struct TypedSchema<T> {
    operation: String,
    check: Option<Check<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    /// Schema exposing the default `"parse"` operation.
    pub fn new() -> Self {
        Self {
            operation: DEFAULT_PARSE_KEY.to_string(),
            check: None,
            _marker: PhantomData,
        }
    }

    /// Expose the operation under another name.
    #[must_use = "This method returns a new TypedSchema and does not modify self"]
    pub fn named(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Name of the exposed operation.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    fn parse(&self, args: Args) -> RpcResult<Value> {
        let value: T = serde_json::from_value(collapse(args))
            .map_err(|e| RpcError::validation(format!("Invalid input: {}", e)))?;
        if let Some(check) = self.check {
            check(&value).into_result()?;
        }
        Ok(serde_json::to_value(value)?)
    }
}

impl<T> TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
{
    /// Schema that also runs `T`'s validation rules after parsing.
    pub fn validated() -> Self {
        Self {
            check: Some(T::validate),
            ..Self::new()
        }
    }
}

impl<T> Default for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    fn run(&self, operation: &str, args: Args) -> Option<Outcome> {
        (operation == self.operation).then(|| MaybeDeferred::Immediate(self.parse(args)))
    }
}
