//! In-process [`CrudRepository`] backed by a `BTreeMap`.
//!
//! Same semantics as the MySQL repository, without a server: the id and
//! every [`Entity::unique_columns`] entry are unique keys. Each mutation runs
//! under a single write guard, so it is all-or-nothing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{duplicate, not_found, unique_violation, CrudRepository};
use crate::{
    models::{check_id, Entity},
    updates::entity_values,
    DbError, UpdateSet,
};

pub struct MemoryRepository<T> {
    rows: RwLock<BTreeMap<i32, T>>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Pre-populate the store. Later rows replace earlier ones with the same id.
    pub fn with_rows(rows: impl IntoIterator<Item = T>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

/// Reject `candidate` if another row already holds one of its unique values.
fn check_unique<T: Entity>(rows: &BTreeMap<i32, T>, candidate: &T) -> Result<(), DbError> {
    if T::unique_columns().is_empty() {
        return Ok(());
    }
    let wanted = entity_values(candidate)?;
    for other in rows.values().filter(|r| r.id() != candidate.id()) {
        let existing = entity_values(other)?;
        for column in T::unique_columns() {
            if wanted.get(*column) == existing.get(*column) {
                return Err(unique_violation::<T>(column));
            }
        }
    }
    Ok(())
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> CrudRepository<T> for MemoryRepository<T> {
    async fn create(&self, entity: &T) -> Result<(), DbError> {
        entity.validate()?;

        let mut rows = self.rows.write().await;
        if rows.contains_key(&entity.id()) {
            return Err(duplicate::<T>(entity.id()));
        }
        check_unique(&rows, entity)?;
        debug!(table = T::table_name(), id = entity.id(), "create");
        rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn read(&self, id: i32) -> Result<Option<T>, DbError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, entity: &T, updates: &UpdateSet) -> Result<(), DbError> {
        let id = entity.id();
        check_id(id)?;

        let mut rows = self.rows.write().await;
        let stored = rows.get(&id).ok_or_else(|| not_found::<T>(id))?;
        let merged = updates.apply_to(stored)?;
        check_unique(&rows, &merged)?;
        debug!(table = T::table_name(), id, fields = updates.len(), "update");
        rows.insert(id, merged);
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), DbError> {
        check_id(id)?;

        let mut rows = self.rows.write().await;
        if rows.remove(&id).is_none() {
            return Err(not_found::<T>(id));
        }
        debug!(table = T::table_name(), id, "delete");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<T>, DbError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}
