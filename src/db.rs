//! Database initialization for the application's SQLite schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{expense, transaction, user};

/// Create the tables for the domain models if they do not exist.
///
/// All tables are created within a single exclusive transaction so a partial
/// schema is never left behind.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    user::create_user_table(&sql_transaction)?;
    transaction::create_transaction_table(&sql_transaction)?;
    expense::create_expense_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
