//! `db` crate: persistence layer for users and employees.
//!
//! Provides a connection factory, typed row structs, partial update sets and
//! one generic CRUD contract with MySQL and in-memory implementations.
//! No business logic lives here.

pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod repository;
pub mod updates;

pub use config::DbConfig;
pub use connection::{get_connection, ConnectionFactory, DbConnection, Driver};
pub use error::{ConfigError, DbError};
pub use models::{Employee, Entity, User};
pub use repository::{
    CrudRepository, EmployeeRepository, MemoryRepository, MySqlRepository, UserRepository,
};
pub use updates::UpdateSet;
