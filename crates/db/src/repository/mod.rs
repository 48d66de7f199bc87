//! The generic CRUD contract and its implementations.
//!
//! [`CrudRepository`] is written once for any [`Entity`]. The per-entity
//! contracts ([`UserRepository`], [`EmployeeRepository`]) are bindings of it,
//! not re-declarations.

pub mod employees;
pub mod memory;
pub mod mysql;
pub mod sql;
pub mod users;

use async_trait::async_trait;

use crate::{models::Entity, DbError, UpdateSet};

pub use employees::EmployeeRepository;
pub use memory::MemoryRepository;
pub use mysql::MySqlRepository;
pub use users::UserRepository;

/// Create, read, update, delete and list one entity type.
///
/// Mutating operations are all-or-nothing: on error no partial change is
/// visible.
#[async_trait]
pub trait CrudRepository<T: Entity>: Send + Sync {
    /// Persist a new entity.
    ///
    /// # Errors
    /// - [`DbError::InvalidArgument`] if `entity` fails validation, its id is
    ///   already taken, or another unique key (see
    ///   [`Entity::unique_columns`]) is.
    /// - [`DbError::StorageAccess`] on any driver failure.
    async fn create(&self, entity: &T) -> Result<(), DbError>;

    /// Fetch the entity with `id`, or `None` if there is none.
    async fn read(&self, id: i32) -> Result<Option<T>, DbError>;

    /// Apply `updates` to the stored entity identified by `entity.id()`.
    ///
    /// Only the id of `entity` is used to locate the record. The values in
    /// `updates` are merged into the stored row, not into `entity`.
    ///
    /// # Errors
    /// - [`DbError::InvalidArgument`] if the id is not positive, no such
    ///   record exists, `updates` is rejected by [`UpdateSet::apply_to`], or
    ///   the change would clash with another row's unique key.
    /// - [`DbError::StorageAccess`] on any driver failure.
    async fn update(&self, entity: &T, updates: &UpdateSet) -> Result<(), DbError>;

    /// Remove the entity with `id`.
    ///
    /// # Errors
    /// - [`DbError::InvalidArgument`] if `id` is not positive or no such
    ///   record exists.
    /// - [`DbError::StorageAccess`] on any driver failure.
    async fn delete(&self, id: i32) -> Result<(), DbError>;

    /// Every entity, ordered by id. Empty when there are none.
    async fn find_all(&self) -> Result<Vec<T>, DbError>;
}

pub(crate) fn not_found<T: Entity>(id: i32) -> DbError {
    DbError::invalid(format!("no row in {} with id {id}", T::table_name()))
}

pub(crate) fn duplicate<T: Entity>(id: i32) -> DbError {
    DbError::invalid(format!("{} already has a row with id {id}", T::table_name()))
}

pub(crate) fn unique_violation<T: Entity>(key: &str) -> DbError {
    DbError::invalid(format!(
        "unique constraint '{key}' violated in {}",
        T::table_name()
    ))
}
