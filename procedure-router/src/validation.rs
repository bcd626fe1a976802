//! Input validation
//!
//! Types parsed by a [`TypedSchema`](crate::TypedSchema) can opt into a
//! validation pass by implementing [`Validate`]. Rules are collected with
//! [`ValidationRules`]; every failing rule is reported, not just the first.
//! A failing [`ValidationResult`] becomes a `VALIDATION_ERROR` whose details
//! hold `{ "errors": [FieldError, ..] }`.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Validate for CreateUserInput {
//!     fn validate(&self) -> ValidationResult {
//!         ValidationRules::new()
//!             .required("name", &self.name)
//!             .max_length("name", &self.name, 100)
//!             .email("email", &self.email)
//!             .range("age", self.age, 0, 150)
//!             .build()
//!     }
//! }
//! ```

use crate::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Blank string
    Required,
    /// Fewer characters than allowed
    MinLength(usize),
    /// More characters than allowed
    MaxLength(usize),
    /// Number outside an inclusive range
    Range(i64, i64),
    /// Not shaped like an email address
    Email,
    /// Caller-defined check
    Custom(String),
}

impl Rule {
    /// Stable code reported in [`FieldError::code`].
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Range(..) => "range",
            Self::Email => "email",
            Self::Custom(_) => "custom",
        }
    }

    fn describe(&self, field: &str) -> String {
        match self {
            Self::Required => format!("{} is required", field),
            Self::MinLength(min) => format!("{} must be at least {} characters", field, min),
            Self::MaxLength(max) => format!("{} must be at most {} characters", field, max),
            Self::Range(min, max) => format!("{} must be between {} and {}", field, min, max),
            Self::Email => format!("{} must be a valid email address", field),
            Self::Custom(message) => message.clone(),
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Rule code, see [`Rule::code`]
    pub code: String,
}

impl FieldError {
    /// Error for `field` breaking `rule`.
    pub fn new(field: impl Into<String>, rule: &Rule) -> Self {
        let field = field.into();
        Self {
            message: rule.describe(&field),
            code: rule.code().to_string(),
            field,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating one value. Valid when no errors were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<FieldError>,
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Result holding `errors`; passing if empty.
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Returns true if nothing failed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collected errors, in rule order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors reported for `field`.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Append the errors of `other`.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self
    }

    /// `Ok` when valid, otherwise a `VALIDATION_ERROR` carrying the errors.
    pub fn into_result(self) -> RpcResult<()> {
        if self.is_valid() {
            return Ok(());
        }
        Err(RpcError::validation("Input validation failed")
            .with_details(json!({ "errors": self.errors })))
    }
}

/// Types that can check their own contents after parsing.
pub trait Validate {
    /// Run the checks.
    fn validate(&self) -> ValidationResult;
}

impl Validate for () {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl Validate for serde_json::Value {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> ValidationResult {
        self.as_ref().map(Validate::validate).unwrap_or_default()
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> ValidationResult {
        self.iter()
            .fold(ValidationResult::ok(), |acc, item| acc.merge(item.validate()))
    }
}

/// Chainable rule set.
#[derive(Debug, Default)]
pub struct ValidationRules {
    errors: Vec<FieldError>,
}

impl ValidationRules {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(mut self, passed: bool, field: &str, rule: Rule) -> Self {
        if !passed {
            self.errors.push(FieldError::new(field, &rule));
        }
        self
    }

    /// String must not be blank.
    pub fn required(self, field: &str, value: &str) -> Self {
        self.check(!value.trim().is_empty(), field, Rule::Required)
    }

    /// At least `min` characters.
    pub fn min_length(self, field: &str, value: &str, min: usize) -> Self {
        self.check(value.chars().count() >= min, field, Rule::MinLength(min))
    }

    /// At most `max` characters.
    pub fn max_length(self, field: &str, value: &str, max: usize) -> Self {
        self.check(value.chars().count() <= max, field, Rule::MaxLength(max))
    }

    /// `min <= value <= max`.
    pub fn range(self, field: &str, value: i64, min: i64, max: i64) -> Self {
        self.check((min..=max).contains(&value), field, Rule::Range(min, max))
    }

    /// One `@`, a non-empty local part and a dotted domain.
    pub fn email(self, field: &str, value: &str) -> Self {
        let passed = value.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
        self.check(passed, field, Rule::Email)
    }

    /// Fails with `message` unless `predicate` holds.
    pub fn custom<F>(self, field: &str, predicate: F, message: &str) -> Self
    where
        F: FnOnce() -> bool,
    {
        self.check(predicate(), field, Rule::Custom(message.to_string()))
    }

    /// Finish the rule set.
    pub fn build(self) -> ValidationResult {
        ValidationResult::from_errors(self.errors)
    }
}
