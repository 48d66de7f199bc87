//! SQL text for the MySQL repository.
//!
//! Only identifiers from [`Entity`] metadata are interpolated, always
//! backtick-quoted. Values are `?` placeholders bound by the caller.

use crate::models::Entity;

/// `` `name` ``, with embedded backticks doubled.
pub fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn column_list(columns: &[&str]) -> String {
    columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
}

pub fn insert_sql<T: Entity>() -> String {
    let columns = T::columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote(T::table_name()),
        column_list(columns),
    )
}

pub fn select_by_id_sql<T: Entity>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?",
        column_list(T::columns()),
        quote(T::table_name()),
        quote(T::id_column()),
    )
}

/// Row-locking variant used inside update transactions.
pub fn select_for_update_sql<T: Entity>() -> String {
    format!("{} FOR UPDATE", select_by_id_sql::<T>())
}

pub fn select_all_sql<T: Entity>() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} ASC",
        column_list(T::columns()),
        quote(T::table_name()),
        quote(T::id_column()),
    )
}

/// `UPDATE … SET a = ?, b = ? WHERE id = ?` for the given `fields`.
///
/// `fields` must already be checked against `T::columns()`.
pub fn update_sql<T: Entity>(fields: &[&str]) -> String {
    let assignments = fields
        .iter()
        .map(|f| format!("{} = ?", quote(f)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {assignments} WHERE {} = ?",
        quote(T::table_name()),
        quote(T::id_column()),
    )
}

pub fn delete_sql<T: Entity>() -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote(T::table_name()),
        quote(T::id_column()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, User};

    #[test]
    fn insert_lists_every_column() {
        assert_eq!(
            insert_sql::<User>(),
            "INSERT INTO `users` (`id`, `username`, `email`, `first_name`, `last_name`, `active`) \
             VALUES (?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn select_by_id() {
        assert_eq!(
            select_by_id_sql::<Employee>(),
            "SELECT `id`, `first_name`, `last_name`, `position`, `department`, \
             `salary`, `hire_date` FROM `employees` WHERE `id` = ?"
        );
        assert!(select_for_update_sql::<Employee>().ends_with("WHERE `id` = ? FOR UPDATE"));
    }

    #[test]
    fn select_all_is_ordered_by_id() {
        assert!(select_all_sql::<User>().ends_with("FROM `users` ORDER BY `id` ASC"));
    }

    #[test]
    fn update_sets_only_given_fields() {
        assert_eq!(
            update_sql::<User>(&["first_name", "active"]),
            "UPDATE `users` SET `first_name` = ?, `active` = ? WHERE `id` = ?"
        );
    }

    #[test]
    fn delete_by_id() {
        assert_eq!(delete_sql::<User>(), "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(delete_sql::<Employee>(), "DELETE FROM `employees` WHERE `id` = ?");
    }

    #[test]
    fn backticks_are_escaped() {
        assert_eq!(quote("we`ird"), "`we``ird`");
    }
}
