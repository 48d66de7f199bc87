//! Row structs that map 1-to-1 onto database tables.
//!
//! Serialized field names are the column names. [`crate::UpdateSet`] relies
//! on this to check field names and value types.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::FromRow;

use crate::DbError;

/// A persisted record with a positive integer identifier.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    fn table_name() -> &'static str;

    fn id_column() -> &'static str {
        "id"
    }

    /// Every persisted column, id included, in insert order.
    fn columns() -> &'static [&'static str];

    /// Columns other than the id that carry a unique key.
    fn unique_columns() -> &'static [&'static str] {
        &[]
    }

    fn id(&self) -> i32;

    /// Field-level checks. Failures are `InvalidArgument`.
    fn validate(&self) -> Result<(), DbError>;
}

/// Identifiers are positive; zero and negatives are never stored.
pub fn check_id(id: i32) -> Result<(), DbError> {
    if id <= 0 {
        return Err(DbError::invalid(format!("id must be positive, got {id}")));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DbError> {
    if value.trim().is_empty() {
        return Err(DbError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

pub const USERNAME_MAX_LEN: usize = 64;

/// An application account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
}

impl Entity for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "username", "email", "first_name", "last_name", "active"]
    }

    fn unique_columns() -> &'static [&'static str] {
        &["username"]
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn validate(&self) -> Result<(), DbError> {
        check_id(self.id)?;
        require_non_empty("username", &self.username)?;
        if self.username.chars().count() > USERNAME_MAX_LEN {
            return Err(DbError::invalid(format!(
                "username longer than {USERNAME_MAX_LEN} characters"
            )));
        }
        if !is_plausible_email(&self.email) {
            return Err(DbError::invalid(format!("invalid email '{}'", self.email)));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// employees
// ---------------------------------------------------------------------------

/// A staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: Option<String>,
    pub salary: f64,
    pub hire_date: NaiveDate,
}

impl Entity for Employee {
    fn table_name() -> &'static str {
        "employees"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "first_name",
            "last_name",
            "position",
            "department",
            "salary",
            "hire_date",
        ]
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn validate(&self) -> Result<(), DbError> {
        check_id(self.id)?;
        require_non_empty("first_name", &self.first_name)?;
        require_non_empty("last_name", &self.last_name)?;
        require_non_empty("position", &self.position)?;
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Err(DbError::invalid(format!(
                "salary must be a non-negative amount, got {}",
                self.salary
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            active: true,
        }
    }

    #[test]
    fn valid_user_passes() {
        assert!(user(1).validate().is_ok());
    }

    #[test]
    fn non_positive_id_is_rejected() {
        assert!(user(0).validate().unwrap_err().is_invalid_argument());
        assert!(user(-4).validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn email_needs_exactly_one_at() {
        for bad in ["", "alice", "@example.com", "alice@", "a@b@c"] {
            let u = User { email: bad.into(), ..user(1) };
            assert!(u.validate().is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn overlong_username_is_rejected() {
        let u = User { username: "x".repeat(USERNAME_MAX_LEN + 1), ..user(1) };
        assert!(u.validate().is_err());
    }

    #[test]
    fn employee_salary_must_be_non_negative() {
        let e = Employee {
            id: 3,
            first_name: "Bob".into(),
            last_name: "Builder".into(),
            position: "Engineer".into(),
            department: None,
            salary: -1.0,
            hire_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        assert!(e.validate().is_err());
        assert!(Employee { salary: 52_000.0, ..e.clone() }.validate().is_ok());
        assert!(Employee { salary: f64::NAN, ..e }.validate().is_err());
    }

    #[test]
    fn columns_match_serialized_fields() {
        let value = serde_json::to_value(user(1)).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for col in User::columns() {
            assert!(keys.contains(col), "missing {col}");
        }
        assert_eq!(keys.len(), User::columns().len());
        for col in User::unique_columns() {
            assert!(User::columns().contains(col));
        }
    }
}
