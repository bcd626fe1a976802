//! Application context and services

use super::{UpdateUserInput, User};
use procedure_router::{ContextMap, RpcError, RpcResult, context_map};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Services shared by all handlers.
#[derive(Clone, Default)]
pub struct AppContext {
    pub store: UserStore,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static router context: plain data visible to every invocation.
    pub fn context_map(&self) -> ContextMap {
        context_map! {
            "service" => "users",
            "version" => env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug)]
struct Table {
    rows: BTreeMap<u32, User>,
    next_id: u32,
}

/// In-memory user table, seeded with two users. Clones share the table.
///
/// A poisoned lock fails every operation with `INTERNAL_ERROR`; a missing
/// row is `Ok(None)` or `Ok(false)`.
#[derive(Debug, Clone)]
pub struct UserStore {
    table: Arc<RwLock<Table>>,
}

impl UserStore {
    pub fn new() -> Self {
        let seed = [
            User::new(1, "Alice", "alice@example.com"),
            User::new(2, "Bob", "bob@example.com"),
        ];
        let table = Table {
            next_id: seed.len() as u32 + 1,
            rows: seed.into_iter().map(|u| (u.id, u)).collect(),
        };
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    fn read(&self) -> RpcResult<RwLockReadGuard<'_, Table>> {
        self.table.read().map_err(|_| unavailable())
    }

    fn write(&self) -> RpcResult<RwLockWriteGuard<'_, Table>> {
        self.table.write().map_err(|_| unavailable())
    }

    pub fn get(&self, id: u32) -> RpcResult<Option<User>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    /// All users, by id.
    pub fn list(&self) -> RpcResult<Vec<User>> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    pub fn len(&self) -> RpcResult<usize> {
        Ok(self.read()?.rows.len())
    }

    pub fn is_empty(&self) -> RpcResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn insert(&self, name: &str, email: &str) -> RpcResult<User> {
        let mut table = self.write()?;
        let user = User::new(table.next_id, name, email);
        table.next_id += 1;
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    /// Apply the fields present in `patch`.
    pub fn update(&self, patch: &UpdateUserInput) -> RpcResult<Option<User>> {
        let mut table = self.write()?;
        let Some(user) = table.rows.get_mut(&patch.id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            user.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            user.email.clone_from(email);
        }
        Ok(Some(user.clone()))
    }

    pub fn remove(&self, id: u32) -> RpcResult<bool> {
        Ok(self.write()?.rows.remove(&id).is_some())
    }
}

fn unavailable() -> RpcError {
    RpcError::internal("User store unavailable")
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
