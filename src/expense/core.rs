//! Defines the core data models and database queries for expenses.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::DatabaseId, user::UserID};

/// What an expense was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Fuel purchases.
    Fuel,
    /// Mobile data bundles.
    Data,
    /// Food and drink while driving.
    Food,
    /// Vehicle repairs and maintenance.
    Repairs,
    /// Anything else.
    Other,
}

impl Category {
    /// The canonical upper-case name used in the database and in HMAC material.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fuel => "FUEL",
            Category::Data => "DATA",
            Category::Food => "FOOD",
            Category::Repairs => "REPAIRS",
            Category::Other => "OTHER",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "FUEL" => Ok(Category::Fuel),
            "DATA" => Ok(Category::Data),
            "FOOD" => Ok(Category::Food),
            "REPAIRS" => Ok(Category::Repairs),
            "OTHER" => Ok(Category::Other),
            other => Err(FromSqlError::Other(
                format!("unknown category {other:?}").into(),
            )),
        }
    }
}

/// Money spent while driving, e.g. fuel or repairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: DatabaseId,
    /// The ID of the user who owns the expense.
    pub user_id: UserID,
    /// The amount of money spent.
    pub amount: f64,
    /// What the money was spent on.
    pub category: Category,
    /// A free-text note about the expense.
    pub description: String,
    /// When the money was spent, stored in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the expense table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new expense into the database and return it with its ID.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn create_expense(
    user_id: UserID,
    amount: f64,
    category: Category,
    description: &str,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO expense (user_id, amount, category, description, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (user_id.as_i64(), amount, category, description, created_at),
    )?;

    Ok(Expense {
        id: connection.last_insert_rowid(),
        user_id,
        amount,
        category,
        description: description.to_owned(),
        created_at,
    })
}

/// Get all of a user's expenses, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_expenses(user_id: UserID, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, category, description, created_at FROM expense \
             WHERE user_id = :user_id ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .collect::<Result<_, _>>()
        .map_err(|error: rusqlite::Error| error.into())
}

/// Delete the expense with `id` belonging to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the expense does not exist or belongs to
/// another user, or [Error::SqlError] if an SQL related error occurred.
pub fn delete_expense(id: DatabaseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Map a [rusqlite::Row] from the expense table to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        expense::{Category, create_expense, delete_expense, list_expenses},
        password::PasswordHash,
        user::{UserID, create_user},
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    #[test]
    fn create_and_list_roundtrip() {
        let (conn, user_id) = get_test_connection();

        let inserted = create_expense(
            user_id,
            20.0,
            Category::Fuel,
            "morning fill-up",
            datetime!(2026-08-30 08:00:00 UTC),
            &conn,
        )
        .unwrap();

        let expenses = list_expenses(user_id, &conn).unwrap();
        assert_eq!(expenses, vec![inserted]);
    }

    #[test]
    fn list_is_owner_scoped() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter23"),
            &conn,
        )
        .unwrap();
        create_expense(
            other_user.id,
            12.0,
            Category::Data,
            "",
            datetime!(2026-08-30 08:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert!(list_expenses(user_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn delete_fails_for_other_users_expense() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter23"),
            &conn,
        )
        .unwrap();
        let inserted = create_expense(
            user_id,
            35.0,
            Category::Repairs,
            "tire patch",
            datetime!(2026-08-30 08:00:00 UTC),
            &conn,
        )
        .unwrap();

        let result = delete_expense(inserted.id, other_user.id, &conn);

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(list_expenses(user_id, &conn).unwrap().len(), 1);
    }
}
