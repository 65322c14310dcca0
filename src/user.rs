//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, password::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A driver account.
///
/// All transactions and expenses belong to exactly one user; the user ID is
/// the isolation boundary for every query.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, used as the login name.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if a user with `email` already exists, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (email, password_hash.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            let raw_id = row.get(0)?;
            let email: String = row.get(1)?;
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id: UserID::new(raw_id),
                email,
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - no user with `email` is registered.
/// - there was an error trying to access the database.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], |row| {
            let raw_id = row.get(0)?;
            let email: String = row.get(1)?;
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id: UserID::new(raw_id),
                email,
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        password::PasswordHash,
        user::{UserID, create_user, get_user_by_email, get_user_by_id},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let conn = get_test_connection();

        let inserted_user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "driver@example.com");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let conn = get_test_connection();
        create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        let result = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("foobar42"),
            &conn,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_by_id_returns_inserted_user() {
        let conn = get_test_connection();
        let inserted_user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        let selected_user = get_user_by_id(inserted_user.id, &conn).unwrap();

        assert_eq!(inserted_user, selected_user);
    }

    #[test]
    fn get_user_by_id_fails_on_unknown_id() {
        let conn = get_test_connection();

        let result = get_user_by_id(UserID::new(999), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_user_by_email_returns_inserted_user() {
        let conn = get_test_connection();
        let inserted_user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        let selected_user = get_user_by_email("driver@example.com", &conn).unwrap();

        assert_eq!(inserted_user, selected_user);
    }
}
