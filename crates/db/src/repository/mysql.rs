//! [`CrudRepository`] over a single MySQL connection.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::Query,
    Connection, FromRow, MySql,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::{duplicate, not_found, sql, unique_violation, CrudRepository};
use crate::{
    connection::DbConnection,
    models::{check_id, Entity},
    updates::entity_values,
    DbError, UpdateSet,
};

/// A repository that owns one connection obtained from
/// [`crate::ConnectionFactory`].
///
/// Operations are serialized on that connection. Give the connection back
/// with [`MySqlRepository::into_connection`] or release it with
/// [`MySqlRepository::close`].
pub struct MySqlRepository<T> {
    conn: Mutex<DbConnection>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> MySqlRepository<T> {
    pub fn new(conn: DbConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
            _marker: PhantomData,
        }
    }

    pub fn into_connection(self) -> DbConnection {
        self.conn.into_inner()
    }

    /// Close the underlying session.
    pub async fn close(self) -> Result<(), DbError> {
        self.into_connection().close().await?;
        Ok(())
    }
}

/// Bind one JSON value as a MySQL parameter.
fn bind_value(
    query: Query<'_, MySql, MySqlArguments>,
    value: Value,
) -> Query<'_, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s),
        other => query.bind(other.to_string()),
    }
}

/// Name of the unique key a duplicate-entry error tripped.
///
/// `None` for any other error. MySQL does not report the constraint
/// separately, so the name is read from the server message.
fn violated_key(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(
            db.constraint()
                .or_else(|| key_from_message(db.message()))
                .unwrap_or_default()
                .to_string(),
        ),
        _ => None,
    }
}

/// `Duplicate entry 'x' for key 'users.username'` → `users.username`.
fn key_from_message(message: &str) -> Option<&str> {
    let rest = message.split("for key '").nth(1)?;
    rest.split('\'').next()
}

/// MySQL 8 prefixes key names with the table (`users.PRIMARY`), 5.7 does not.
fn is_primary_key(key: &str) -> bool {
    key.rsplit('.').next() == Some("PRIMARY")
}

/// Map a failed INSERT/UPDATE, turning unique-key clashes into caller errors.
fn write_error<T: Entity>(err: sqlx::Error, id: i32) -> DbError {
    match violated_key(&err) {
        Some(key) if is_primary_key(&key) => duplicate::<T>(id),
        Some(key) => unique_violation::<T>(key.rsplit('.').next().unwrap_or(&key)),
        None => err.into(),
    }
}

#[async_trait]
impl<T> CrudRepository<T> for MySqlRepository<T>
where
    T: Entity + for<'r> FromRow<'r, MySqlRow>,
{
    async fn create(&self, entity: &T) -> Result<(), DbError> {
        entity.validate()?;
        let mut values = entity_values(entity)?;

        let sql = sql::insert_sql::<T>();
        let mut query = sqlx::query(&sql);
        for column in T::columns() {
            query = bind_value(query, values.remove(*column).unwrap_or(Value::Null));
        }

        debug!(table = T::table_name(), id = entity.id(), "create");
        let mut conn = self.conn.lock().await;
        query
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error::<T>(e, entity.id()))?;
        Ok(())
    }

    async fn read(&self, id: i32) -> Result<Option<T>, DbError> {
        if id <= 0 {
            return Ok(None);
        }

        debug!(table = T::table_name(), id, "read");
        let sql = sql::select_by_id_sql::<T>();
        let mut conn = self.conn.lock().await;
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    async fn update(&self, entity: &T, updates: &UpdateSet) -> Result<(), DbError> {
        let id = entity.id();
        check_id(id)?;

        debug!(table = T::table_name(), id, fields = updates.len(), "update");
        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await?;

        let lock_sql = sql::select_for_update_sql::<T>();
        let stored = sqlx::query_as::<_, T>(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;

        // Dropping `tx` on any early return rolls the transaction back.
        let merged = updates.apply_to(&stored)?;
        let mut values = entity_values(&merged)?;

        let fields: Vec<&str> = updates.fields().collect();
        let update_sql = sql::update_sql::<T>(&fields);
        let mut query = sqlx::query(&update_sql);
        for field in &fields {
            query = bind_value(query, values.remove(*field).unwrap_or(Value::Null));
        }
        query
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error::<T>(e, id))?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), DbError> {
        check_id(id)?;

        debug!(table = T::table_name(), id, "delete");
        let sql = sql::delete_sql::<T>();
        let mut conn = self.conn.lock().await;
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(not_found::<T>(id));
        }

        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<T>, DbError> {
        debug!(table = T::table_name(), "find_all");
        let sql = sql::select_all_sql::<T>();
        let mut conn = self.conn.lock().await;
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&mut *conn).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_name_is_read_from_duplicate_entry_message() {
        assert_eq!(
            key_from_message("Duplicate entry 'alice' for key 'users.username'"),
            Some("users.username")
        );
        assert_eq!(
            key_from_message("Duplicate entry '2' for key 'PRIMARY'"),
            Some("PRIMARY")
        );
        assert_eq!(key_from_message("Lock wait timeout exceeded"), None);
    }

    #[test]
    fn only_primary_key_counts_as_duplicate_id() {
        assert!(is_primary_key("PRIMARY"));
        assert!(is_primary_key("users.PRIMARY"));
        assert!(!is_primary_key("users.username"));
        assert!(!is_primary_key(""));
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = write_error::<crate::User>(sqlx::Error::RowNotFound, 1);
        assert!(matches!(err, DbError::StorageAccess(sqlx::Error::RowNotFound)));
    }
}
