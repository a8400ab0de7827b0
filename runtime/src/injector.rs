//! Named service lookup for `resolve` entries that reference a service by name.

use ahash::AHashMap;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Injector: Send + Sync {
    /// Look up a service by name. `None` rejects the resolving state.
    async fn get(&self, name: &str) -> Option<Value>;
}

/// A fixed table of named values.
#[derive(Debug, Clone, Default)]
pub struct ServiceMap {
    services: AHashMap<String, Value>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.services.insert(name.into(), value);
    }
}

#[async_trait]
impl Injector for ServiceMap {
    async fn get(&self, name: &str) -> Option<Value> {
        self.services.get(name).cloned()
    }
}
