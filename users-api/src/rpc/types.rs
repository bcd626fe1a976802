//! Application types

use procedure_router::{Validate, ValidationResult, ValidationRules};
use serde::{Deserialize, Serialize};

// =============================================================================
// User Types
// =============================================================================

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: u32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Input for getting or deleting a user by ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdInput {
    pub id: u32,
}

impl Validate for UserIdInput {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new()
            .range("id", i64::from(self.id), 1, i64::from(u32::MAX))
            .build()
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
}

impl Validate for CreateUserInput {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new()
            .required("name", &self.name)
            .max_length("name", &self.name, 64)
            .email("email", &self.email)
            .build()
    }
}

/// Input for updating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Validate for UpdateUserInput {
    fn validate(&self) -> ValidationResult {
        let mut rules = ValidationRules::new();
        if let Some(name) = &self.name {
            rules = rules.required("name", name);
        }
        if let Some(email) = &self.email {
            rules = rules.email("email", email);
        }
        rules.build()
    }
}

// =============================================================================
// General Types
// =============================================================================

/// Input for greeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetInput {
    pub name: String,
}

impl Validate for GreetInput {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new().required("name", &self.name).build()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
