// 🗂️ Registry - keyed collection of one participant or asset type
//
// Multi-version storage: an update never overwrites, it expires the current
// version and appends the next one. `get` always answers with the current
// version; `get_at_time` answers "what did this record look like at T?".

use crate::entities::{Relationship, Resource};
use crate::error::{LedgerError, Result};
use crate::schema::{FullyQualifiedName, TypeDefinition, TypeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

// ============================================================================
// VERSIONED RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub record: T,
    pub version: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl<T: Clone> Versioned<T> {
    fn first(record: T, now: DateTime<Utc>) -> Self {
        Versioned {
            record,
            version: 1,
            valid_from: now,
            valid_until: None,
        }
    }

    pub fn is_current(&self) -> bool {
        self.valid_until.is_none()
    }

    pub fn was_valid_at(&self, as_of: DateTime<Utc>) -> bool {
        self.valid_from <= as_of && self.valid_until.map_or(true, |until| until > as_of)
    }

    fn next(&self, record: T, now: DateTime<Utc>) -> Self {
        Versioned {
            record,
            version: self.version + 1,
            valid_from: now,
            valid_until: None,
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Handle to a registry. Clones share the same storage.
#[derive(Clone)]
pub struct Registry<T> {
    definition: Arc<TypeDefinition>,
    /// ALL versions of all records (append-only)
    versions: Arc<RwLock<Vec<Versioned<T>>>>,
}

impl<T: Resource> Registry<T> {
    /// Create an empty registry for a participant or asset definition
    pub fn new(definition: TypeDefinition) -> Result<Self> {
        if definition.fqn.name() != T::TYPE_NAME || definition.kind == TypeKind::Transaction {
            return Err(LedgerError::UnknownType(format!(
                "{} cannot hold {} records",
                definition.fqn,
                T::TYPE_NAME
            )));
        }

        Ok(Registry {
            definition: Arc::new(definition),
            versions: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub fn fqn(&self) -> &FullyQualifiedName {
        &self.definition.fqn
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Versioned<T>>>> {
        self.versions
            .read()
            .map_err(|_| LedgerError::Poisoned(self.fqn().to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Versioned<T>>>> {
        self.versions
            .write()
            .map_err(|_| LedgerError::Poisoned(self.fqn().to_string()))
    }

    fn validate(&self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.definition
            .validate(&value)
            .map_err(LedgerError::Validation)
    }

    fn not_found(&self, id: &str) -> LedgerError {
        LedgerError::not_found(self.fqn(), id)
    }

    /// Get the current version of a record
    pub fn get(&self, id: &str) -> Result<T> {
        let versions = self.read()?;
        versions
            .iter()
            .find(|v| v.is_current() && v.record.identifier() == id)
            .map(|v| v.record.clone())
            .ok_or_else(|| self.not_found(id))
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        let versions = self.read()?;
        Ok(versions
            .iter()
            .any(|v| v.is_current() && v.record.identifier() == id))
    }

    /// Follow a relationship into this registry
    pub fn resolve(&self, relationship: &Relationship<T>) -> Result<T> {
        if relationship.fqn() != self.fqn() {
            return Err(LedgerError::not_found(relationship.fqn(), relationship.id()));
        }
        self.get(relationship.id())
    }

    /// Add a new record; fails if the identifier is taken
    pub fn add(&self, record: T) -> Result<()> {
        self.validate(&record)?;

        let mut versions = self.write()?;
        let id = record.identifier().to_string();
        if versions.iter().any(|v| v.record.identifier() == id) {
            return Err(LedgerError::duplicate(self.fqn(), id));
        }

        versions.push(Versioned::first(record, Utc::now()));
        debug!(registry = %self.fqn(), id = %id, "record added");
        Ok(())
    }

    /// Add a batch of records. The whole batch is checked before anything is
    /// written, so a failing batch leaves the registry untouched.
    pub fn add_all(&self, records: impl IntoIterator<Item = T>) -> Result<()> {
        let records: Vec<T> = records.into_iter().collect();
        for record in &records {
            self.validate(record)?;
        }

        let mut versions = self.write()?;
        let mut seen: HashSet<String> = versions
            .iter()
            .map(|v| v.record.identifier().to_string())
            .collect();
        for record in &records {
            if !seen.insert(record.identifier().to_string()) {
                return Err(LedgerError::duplicate(self.fqn(), record.identifier()));
            }
        }

        let now = Utc::now();
        let count = records.len();
        versions.extend(records.into_iter().map(|r| Versioned::first(r, now)));
        debug!(registry = %self.fqn(), count, "records added");
        Ok(())
    }

    /// Replace the current version of a record (expires it, appends the next)
    pub fn update(&self, record: T) -> Result<()> {
        self.validate(&record)?;

        let mut versions = self.write()?;
        let id = record.identifier().to_string();
        let now = Utc::now();

        let current = versions
            .iter_mut()
            .find(|v| v.is_current() && v.record.identifier() == id)
            .ok_or_else(|| self.not_found(&id))?;
        current.valid_until = Some(now);
        let next = current.next(record, now);
        let version = next.version;

        versions.push(next);
        debug!(registry = %self.fqn(), id = %id, version, "record updated");
        Ok(())
    }

    /// All current records, ordered by identifier
    pub fn get_all(&self) -> Result<Vec<T>> {
        let versions = self.read()?;
        let mut current: Vec<T> = versions
            .iter()
            .filter(|v| v.is_current())
            .map(|v| v.record.clone())
            .collect();
        current.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        Ok(current)
    }

    pub fn count(&self) -> Result<usize> {
        let versions = self.read()?;
        Ok(versions.iter().filter(|v| v.is_current()).count())
    }

    /// Every version of one record, oldest first
    pub fn get_all_versions(&self, id: &str) -> Result<Vec<Versioned<T>>> {
        let versions = self.read()?;
        let mut found: Vec<Versioned<T>> = versions
            .iter()
            .filter(|v| v.record.identifier() == id)
            .cloned()
            .collect();
        found.sort_by_key(|v| v.version);
        Ok(found)
    }

    /// The record as it was at `as_of`; `None` if it did not exist yet
    pub fn get_at_time(&self, id: &str, as_of: DateTime<Utc>) -> Result<Option<T>> {
        let versions = self.read()?;
        Ok(versions
            .iter()
            .filter(|v| v.record.identifier() == id)
            .find(|v| v.was_valid_at(as_of))
            .map(|v| v.record.clone()))
    }

    /// Full version log, for persistence
    pub fn snapshot(&self) -> Result<Vec<Versioned<T>>> {
        Ok(self.read()?.clone())
    }

    /// Replace the storage with a previously saved version log
    pub fn restore(&self, snapshot: Vec<Versioned<T>>) -> Result<()> {
        let mut versions = self.write()?;
        *versions = snapshot;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
