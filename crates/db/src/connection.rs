//! Connection factory.
//!
//! Every call opens a fresh session. There is no pool, no cache and no
//! retry. The caller owns the returned connection and must close it.

use std::sync::Arc;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::info;

use crate::{DbConfig, DbError};

/// An owned session against one database.
pub type DbConnection = MySqlConnection;

/// MySQL caps schema names at 64 characters.
pub const DATABASE_NAME_MAX_LEN: usize = 64;

/// Drivers compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    MySql,
}

impl Driver {
    /// Look up a driver by its configured name.
    pub fn resolve(name: &str) -> Result<Self, DbError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            other => Err(DbError::DriverUnavailable(format!(
                "no driver for '{other}' (available: mysql)"
            ))),
        }
    }
}

/// Reject names that are empty, too long, or contain anything other than
/// ASCII letters, digits, `_` and `$`.
pub fn validate_database_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::invalid("database name must not be empty"));
    }
    if name.len() > DATABASE_NAME_MAX_LEN {
        return Err(DbError::invalid(format!(
            "database name longer than {DATABASE_NAME_MAX_LEN} characters"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
    {
        return Err(DbError::invalid(format!(
            "database name '{name}' contains '{c}'"
        )));
    }
    Ok(())
}

/// Build driver options for `database_name` without touching the network.
pub fn connect_options(
    config: &DbConfig,
    database_name: &str,
) -> Result<MySqlConnectOptions, DbError> {
    validate_database_name(database_name)?;
    match Driver::resolve(&config.driver)? {
        Driver::MySql => Ok(MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(database_name)),
    }
}

/// Open a new connection to `database_name` using `config`.
///
/// # Errors
/// - [`DbError::InvalidArgument`] for a malformed database name.
/// - [`DbError::DriverUnavailable`] if the configured driver is not built in
///   or rejects its configuration.
/// - [`DbError::StorageAccess`] if the server is unreachable or refuses the
///   credentials.
pub async fn get_connection(
    config: &DbConfig,
    database_name: &str,
) -> Result<DbConnection, DbError> {
    let options = connect_options(config, database_name)?;

    info!(
        host = %config.host,
        port = config.port,
        database = database_name,
        "Opening database connection"
    );
    MySqlConnection::connect_with(&options)
        .await
        .map_err(|e| match e {
            sqlx::Error::Configuration(err) => DbError::DriverUnavailable(err.to_string()),
            other => DbError::StorageAccess(other),
        })
}

/// Round-trip to the server on an open connection.
pub async fn ping(conn: &mut DbConnection) -> Result<(), DbError> {
    conn.ping().await?;
    Ok(())
}

/// Release a connection obtained from [`get_connection`].
pub async fn close(conn: DbConnection) -> Result<(), DbError> {
    conn.close().await?;
    Ok(())
}

/// Opens connections with a configuration fixed at construction.
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    config: Arc<DbConfig>,
}

impl ConnectionFactory {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub async fn get_connection(&self, database_name: &str) -> Result<DbConnection, DbError> {
        get_connection(&self.config, database_name).await
    }

    /// Connect to the database named in the configuration.
    pub async fn default_connection(&self) -> Result<DbConnection, DbError> {
        self.get_connection(&self.config.database).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_mysql_family() {
        assert_eq!(Driver::resolve("mysql").unwrap(), Driver::MySql);
        assert_eq!(Driver::resolve(" MariaDB ").unwrap(), Driver::MySql);
    }

    #[test]
    fn unknown_driver_is_unavailable() {
        let err = Driver::resolve("oracle").unwrap_err();
        assert!(matches!(err, DbError::DriverUnavailable(msg) if msg.contains("oracle")));
    }

    #[test]
    fn database_names() {
        assert!(validate_database_name("roster").is_ok());
        assert!(validate_database_name("hr_2024$archive").is_ok());
        for bad in ["", "hr db", "hr;drop", "hr/other", "ümlaut"] {
            assert!(
                validate_database_name(bad).unwrap_err().is_invalid_argument(),
                "accepted '{bad}'"
            );
        }
        assert!(validate_database_name(&"d".repeat(DATABASE_NAME_MAX_LEN)).is_ok());
        assert!(validate_database_name(&"d".repeat(DATABASE_NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn options_check_name_before_driver() {
        let config = DbConfig {
            driver: "oracle".into(),
            ..DbConfig::default()
        };
        assert!(connect_options(&config, "").unwrap_err().is_invalid_argument());
        assert!(matches!(
            connect_options(&config, "roster").unwrap_err(),
            DbError::DriverUnavailable(_)
        ));
        assert!(connect_options(&DbConfig::default(), "roster").is_ok());
    }
}
