//! Session Store
//!
//! A minimal key-value contract for persisting JSON documents. The controller
//! never talks to a concrete backend: production wires in a database-backed
//! implementation, while tests and offline runs use [`MemoryStore`].

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key holding the serialized profile of the signed-in learner.
pub const ACTIVE_LEARNER_KEY: &str = "mastery_active_session";

/// Key holding the full learner roster as a JSON array.
pub const ROSTER_KEY: &str = "mastery_learner_roster";

/// Defines the contract for any backend that can store JSON values by key.
///
/// Each call either fully succeeds or returns an error; there is no partial
/// write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// An in-process `KeyValueStore` for tests and development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
