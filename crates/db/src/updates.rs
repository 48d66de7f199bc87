//! Partial updates expressed as field-name → value pairs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{models::Entity, DbError};

/// A set of field changes for one entity.
///
/// Keys are column names of the target entity. Unknown keys and the id
/// column are rejected by [`UpdateSet::apply_to`], never silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateSet(Map<String, Value>);

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`UpdateSet::insert`].
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check every key against `T`, merge the values into a copy of
    /// `entity` and validate the result.
    ///
    /// # Errors
    /// [`DbError::InvalidArgument`] when the set is empty, names the id
    /// column or an unknown field, carries a value of the wrong type, or
    /// produces an entity that fails [`Entity::validate`].
    pub fn apply_to<T: Entity>(&self, entity: &T) -> Result<T, DbError> {
        if self.is_empty() {
            return Err(DbError::invalid("update set is empty"));
        }

        for field in self.fields() {
            if field == T::id_column() {
                return Err(DbError::invalid(format!(
                    "'{field}' is the identifier of {} and cannot be updated",
                    T::table_name()
                )));
            }
            if !T::columns().contains(&field) {
                return Err(DbError::invalid(format!(
                    "unknown field '{field}' for {}",
                    T::table_name()
                )));
            }
        }

        let mut current = entity_values(entity)?;
        for (field, value) in &self.0 {
            current.insert(field.clone(), value.clone());
        }

        let merged: T = serde_json::from_value(Value::Object(current)).map_err(|e| {
            DbError::invalid(format!("update does not fit {}: {e}", T::table_name()))
        })?;
        merged.validate()?;
        Ok(merged)
    }
}

impl From<Map<String, Value>> for UpdateSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for UpdateSet {
    type Error = DbError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DbError::invalid(format!(
                "update set must be a JSON object, got {other}"
            ))),
        }
    }
}

/// Serialize an entity into its column → value map.
pub(crate) fn entity_values<T: Entity>(entity: &T) -> Result<Map<String, Value>, DbError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DbError::invalid(format!(
            "{} rows must serialize to an object",
            T::table_name()
        ))),
        Err(e) => Err(DbError::invalid(format!(
            "cannot serialize {} row: {e}",
            T::table_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, User};
    use chrono::NaiveDate;
    use serde_json::json;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            active: true,
        }
    }

    #[test]
    fn merges_only_named_fields() {
        let updates = UpdateSet::new().set("first_name", "Alicia").set("active", false);
        let merged = updates.apply_to(&alice()).unwrap();
        assert_eq!(merged.first_name, "Alicia");
        assert!(!merged.active);
        assert_eq!(merged.email, "alice@example.com");
        assert_eq!(merged.id, 1);
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = UpdateSet::new().apply_to(&alice()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = UpdateSet::new()
            .set("nickname", "Ali")
            .apply_to(&alice())
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument(msg) if msg.contains("nickname")));
    }

    #[test]
    fn id_cannot_be_updated() {
        let err = UpdateSet::new().set("id", 7).apply_to(&alice()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let err = UpdateSet::new().set("active", "yes").apply_to(&alice()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn merged_entity_is_validated() {
        let err = UpdateSet::new()
            .set("email", "not-an-email")
            .apply_to(&alice())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn dates_and_nullable_columns_round_trip() {
        let employee = Employee {
            id: 9,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            position: "Admiral".into(),
            department: Some("Navy".into()),
            salary: 1.0,
            hire_date: NaiveDate::from_ymd_opt(1943, 12, 1).unwrap(),
        };
        let merged = UpdateSet::new()
            .set("department", Value::Null)
            .set("hire_date", "1944-01-15")
            .apply_to(&employee)
            .unwrap();
        assert_eq!(merged.department, None);
        assert_eq!(merged.hire_date, NaiveDate::from_ymd_opt(1944, 1, 15).unwrap());
    }

    #[test]
    fn only_objects_convert() {
        assert!(UpdateSet::try_from(json!({ "username": "bob" })).is_ok());
        assert!(UpdateSet::try_from(json!(["username", "bob"])).is_err());
        assert!(UpdateSet::try_from(json!("username=bob")).is_err());
    }
}
