//! Record-store seam to the distributed multi-party table.
//!
//! The table itself is an external collaborator; this node only issues
//! put/get calls and never assumes strong consistency; a `get` right after
//! another node's `put` may legitimately miss. The store is constructed
//! with a `(namespace, validator)` pair so records under the reserved
//! namespace are checked at write time and during conflict resolution.

use crate::{StoreError, Validator};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Put/get interface over the shared, eventually-consistent table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store `value` under the namespaced `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WrongNamespace`] for keys outside the reserved
    /// namespace, [`StoreError::InvalidRecord`] if validation rejects the
    /// value, or [`StoreError::Unavailable`] if the table is unreachable.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Fetch the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists, or
    /// [`StoreError::Unavailable`] if the table is unreachable. Failure
    /// propagates to the caller as a resolution failure; no synthetic
    /// fallback record is invented.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Start the table's periodic self-maintenance routine.
    ///
    /// Runs for the lifetime of the process once started.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if maintenance cannot start.
    async fn bootstrap(&self) -> Result<(), StoreError>;
}

/// Validating in-memory table.
///
/// Stands in for the multi-party table in tests and single-process
/// deployments. Enforces the same write-time contract the external table
/// would: namespace check, record validation, and select-best conflict
/// resolution between the stored record and the incoming one.
pub struct MemoryRecordStore {
    namespace: String,
    validator: Arc<dyn Validator>,
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryRecordStore {
    /// Create a store bound to `namespace` with the given validator.
    #[must_use]
    pub fn new(namespace: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        Self {
            namespace: namespace.into(),
            validator,
            entries: DashMap::new(),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_namespace(&self, key: &str) -> Result<(), StoreError> {
        let prefix = format!("/{}/", self.namespace);
        if key.starts_with(&prefix) && key.len() > prefix.len() {
            Ok(())
        } else {
            Err(StoreError::WrongNamespace {
                key: key.to_owned(),
            })
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.check_namespace(key)?;
        self.validator.validate(key, &value)?;

        match self.entries.entry(key.to_owned()) {
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(value);
            }
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let candidates = [occupied.get().clone(), value];
                let winner = self.validator.select(key, &candidates)?;
                debug!(key, winner, "resolved record conflict");
                let [stored, incoming] = candidates;
                occupied.insert(if winner == 1 { incoming } else { stored });
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.check_namespace(key)?;
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })
    }

    async fn bootstrap(&self) -> Result<(), StoreError> {
        // An in-process table has no routing state to refresh.
        debug!(namespace = %self.namespace, "record store bootstrap started");
        Ok(())
    }
}
