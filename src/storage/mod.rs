//! Whole-collection persistence for the billing snapshot.

pub mod json_backend;
pub mod memory;

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;

/// Names of the four independently persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKey {
    Registrations,
    Payments,
    Expenses,
    Budgets,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [
        CollectionKey::Registrations,
        CollectionKey::Payments,
        CollectionKey::Expenses,
        CollectionKey::Budgets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKey::Registrations => "registrations",
            CollectionKey::Payments => "payments",
            CollectionKey::Expenses => "expenses",
            CollectionKey::Budgets => "budgets",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over backends that load and save whole collections.
///
/// Each call must appear atomic to the caller: a reader never observes a
/// partially written collection.
pub trait CollectionStore: Send + Sync {
    /// Returns the stored document, or `None` if the collection was never saved.
    fn read(&self, key: CollectionKey) -> Result<Option<Value>>;
    fn write(&self, key: CollectionKey, value: &Value) -> Result<()>;
}

/// Loads a typed collection, substituting the default when nothing is stored.
pub fn load_collection<T>(store: &dyn CollectionStore, key: CollectionKey) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.read(key)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => {
            debug!(collection = %key, "collection missing, using default");
            Ok(T::default())
        }
    }
}

pub fn save_collection<T>(store: &dyn CollectionStore, key: CollectionKey, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(data)?;
    store.write(key, &value)
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
