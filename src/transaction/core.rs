//! Defines the core data models and database queries for trip transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::DatabaseId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The ride-hailing platform a transaction originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    /// Trips dispatched through Yango.
    Yango,
    /// Trips dispatched through Bolt.
    Bolt,
    /// Direct trips arranged off-platform.
    Private,
}

impl Platform {
    /// The canonical upper-case name used in the database and in HMAC material.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Yango => "YANGO",
            Platform::Bolt => "BOLT",
            Platform::Private => "PRIVATE",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Platform {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Platform {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "YANGO" => Ok(Platform::Yango),
            "BOLT" => Ok(Platform::Bolt),
            "PRIVATE" => Ok(Platform::Private),
            other => Err(FromSqlError::Other(
                format!("unknown platform {other:?}").into(),
            )),
        }
    }
}

/// The bookkeeping department a transaction is filed under.
///
/// Derived from the platform, never supplied by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    /// Yango earnings.
    Investment,
    /// Bolt earnings.
    Revenue,
    /// Everything else.
    Other,
}

impl Department {
    /// The department that records for `platform` are filed under.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Yango => Department::Investment,
            Platform::Bolt => Department::Revenue,
            Platform::Private => Department::Other,
        }
    }

    /// The canonical upper-case name used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Investment => "INVESTMENT",
            Department::Revenue => "REVENUE",
            Department::Other => "OTHER",
        }
    }
}

impl ToSql for Department {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Department {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INVESTMENT" => Ok(Department::Investment),
            "REVENUE" => Ok(Department::Revenue),
            "OTHER" => Ok(Department::Other),
            other => Err(FromSqlError::Other(
                format!("unknown department {other:?}").into(),
            )),
        }
    }
}

/// A single trip earning event, i.e. money received for a ride along with its
/// split between the driver and the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The ID of the user who owns the transaction.
    pub user_id: UserID,
    /// The external transaction reference from the payment SMS.
    ///
    /// Unique across all users; `None` for manually entered transactions and
    /// impossible to deduplicate against.
    pub tx_ref: Option<String>,
    /// The amount of money paid out, equal to the gross total for trip-price
    /// submissions.
    pub amount_received: f64,
    /// The fare of the trip before bonuses and fees.
    pub trip_price: Option<f64>,
    /// Bonuses paid on top of the trip price.
    pub bonuses: f64,
    /// Fees charged by the platform, typically negative.
    pub system_fees: Option<f64>,
    /// Trip price plus bonuses.
    pub gross_total: Option<f64>,
    /// What the driver keeps after fees.
    pub rider_profit: f64,
    /// What the driver still owes the platform for this trip.
    pub platform_debt: f64,
    /// The platform the trip was dispatched through.
    pub platform: Platform,
    /// The bookkeeping department, derived from the platform.
    pub department: Department,
    /// Whether the payment was a tip.
    pub is_tip: bool,
    /// The tip portion of the payment.
    pub tip_amount: f64,
    /// When the payment was received, stored in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to insert a new transaction row.
///
/// Use [crate::transaction::TripSplit] to derive the monetary fields when a
/// trip price is available.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The ID of the user who will own the transaction.
    pub user_id: UserID,
    /// The external transaction reference, if any.
    pub tx_ref: Option<String>,
    /// The amount of money paid out.
    pub amount_received: f64,
    /// The fare of the trip before bonuses and fees.
    pub trip_price: Option<f64>,
    /// Bonuses paid on top of the trip price.
    pub bonuses: f64,
    /// Fees charged by the platform, typically negative.
    pub system_fees: Option<f64>,
    /// Trip price plus bonuses.
    pub gross_total: Option<f64>,
    /// What the driver keeps after fees.
    pub rider_profit: f64,
    /// What the driver still owes the platform for this trip.
    pub platform_debt: f64,
    /// The platform the trip was dispatched through.
    pub platform: Platform,
    /// Whether the payment was a tip.
    pub is_tip: bool,
    /// The tip portion of the payment.
    pub tip_amount: f64,
    /// When the payment was received.
    pub created_at: OffsetDateTime,
}

impl NewTransaction {
    /// A new transaction with every monetary field zeroed.
    ///
    /// Useful as a starting point for synthetic records such as debt offsets.
    pub fn empty(user_id: UserID, platform: Platform, created_at: OffsetDateTime) -> Self {
        Self {
            user_id,
            tx_ref: None,
            amount_received: 0.0,
            trip_price: None,
            bonuses: 0.0,
            system_fees: None,
            gross_total: None,
            rider_profit: 0.0,
            platform_debt: 0.0,
            platform,
            is_tip: false,
            tip_amount: 0.0,
            created_at,
        }
    }
}

// ============================================================================
// DATABASE
// ============================================================================

/// Create the transaction table.
///
/// The UNIQUE constraint on `tx_ref` is the authoritative guard against two
/// callers racing to ingest the same SMS: the dedup gate's read-then-write is
/// not atomic, so the losing writer gets [Error::DuplicateReference] and must
/// re-fetch. SQLite permits multiple NULLs in a UNIQUE column, which is what
/// keeps manual entries out of the dedup scope.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                tx_ref TEXT UNIQUE,
                amount_received REAL NOT NULL,
                trip_price REAL,
                bonuses REAL NOT NULL DEFAULT 0,
                system_fees REAL,
                gross_total REAL,
                rider_profit REAL NOT NULL,
                platform_debt REAL NOT NULL DEFAULT 0,
                platform TEXT NOT NULL,
                department TEXT NOT NULL,
                is_tip INTEGER NOT NULL DEFAULT 0,
                tip_amount REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new transaction into the database and return it with its ID.
///
/// The creation timestamp is normalized to UTC so that stored timestamps
/// compare correctly in range queries.
///
/// # Errors
///
/// Returns [Error::DuplicateReference] if `tx_ref` already exists, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let department = Department::for_platform(new_transaction.platform);
    let created_at = new_transaction.created_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO \"transaction\" (user_id, tx_ref, amount_received, trip_price, bonuses, \
         system_fees, gross_total, rider_profit, platform_debt, platform, department, is_tip, \
         tip_amount, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        (
            new_transaction.user_id.as_i64(),
            &new_transaction.tx_ref,
            new_transaction.amount_received,
            new_transaction.trip_price,
            new_transaction.bonuses,
            new_transaction.system_fees,
            new_transaction.gross_total,
            new_transaction.rider_profit,
            new_transaction.platform_debt,
            new_transaction.platform,
            department,
            new_transaction.is_tip,
            new_transaction.tip_amount,
            created_at,
        ),
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        user_id: new_transaction.user_id,
        tx_ref: new_transaction.tx_ref,
        amount_received: new_transaction.amount_received,
        trip_price: new_transaction.trip_price,
        bonuses: new_transaction.bonuses,
        system_fees: new_transaction.system_fees,
        gross_total: new_transaction.gross_total,
        rider_profit: new_transaction.rider_profit,
        platform_debt: new_transaction.platform_debt,
        platform: new_transaction.platform,
        department,
        is_tip: new_transaction.is_tip,
        tip_amount: new_transaction.tip_amount,
        created_at,
    })
}

const TRANSACTION_COLUMNS: &str = "id, user_id, tx_ref, amount_received, trip_price, bonuses, \
     system_fees, gross_total, rider_profit, platform_debt, platform, department, is_tip, \
     tip_amount, created_at";

/// Get the transaction with `id` belonging to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, or [Error::SqlError] if an SQL related error occurred.
pub fn get_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            rusqlite::named_params! { ":id": id, ":user_id": user_id.as_i64() },
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// The deduplication gate: find the transaction already ingested for an
/// external reference, regardless of who owns it.
///
/// Dedup is deliberately global rather than per-user so the shared SMS
/// ingestion bridge cannot double-book the same payment across devices.
///
/// `tx_ref` should be unique, so more than one match is a data-integrity
/// anomaly; in that case the lowest-id row is returned and the anomaly is
/// logged, never surfaced to the caller.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_transaction_by_reference(
    tx_ref: &str,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE tx_ref = :tx_ref ORDER BY id ASC"
    ))?;

    let matches: Vec<Transaction> = statement
        .query_map(&[(":tx_ref", &tx_ref)], map_transaction_row)?
        .collect::<Result<_, _>>()?;

    if matches.len() > 1 {
        tracing::warn!(
            "integrity anomaly: {} transactions share the reference {:?}, returning the oldest",
            matches.len(),
            tx_ref
        );
    }

    Ok(matches.into_iter().next())
}

/// Get all of a user's transactions, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_transactions(user_id: UserID, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = :user_id \
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .collect::<Result<_, _>>()
        .map_err(|error: rusqlite::Error| error.into())
}

/// Replace every client-writable field of the transaction with `id`.
///
/// The department is re-derived from the submitted platform rather than
/// taken from the request.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, [Error::DuplicateReference] if the new reference collides
/// with another row, or [Error::SqlError] for other SQL errors.
pub fn update_transaction(
    id: DatabaseId,
    replacement: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let department = Department::for_platform(replacement.platform);
    let created_at = replacement.created_at.to_offset(UtcOffset::UTC);

    let rows_updated = connection.execute(
        "UPDATE \"transaction\" SET tx_ref = ?1, amount_received = ?2, trip_price = ?3, \
         bonuses = ?4, system_fees = ?5, gross_total = ?6, rider_profit = ?7, \
         platform_debt = ?8, platform = ?9, department = ?10, is_tip = ?11, tip_amount = ?12, \
         created_at = ?13 \
         WHERE id = ?14 AND user_id = ?15",
        (
            &replacement.tx_ref,
            replacement.amount_received,
            replacement.trip_price,
            replacement.bonuses,
            replacement.system_fees,
            replacement.gross_total,
            replacement.rider_profit,
            replacement.platform_debt,
            replacement.platform,
            department,
            replacement.is_tip,
            replacement.tip_amount,
            created_at,
            id,
            replacement.user_id.as_i64(),
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(Transaction {
        id,
        user_id: replacement.user_id,
        tx_ref: replacement.tx_ref,
        amount_received: replacement.amount_received,
        trip_price: replacement.trip_price,
        bonuses: replacement.bonuses,
        system_fees: replacement.system_fees,
        gross_total: replacement.gross_total,
        rider_profit: replacement.rider_profit,
        platform_debt: replacement.platform_debt,
        platform: replacement.platform,
        department,
        is_tip: replacement.is_tip,
        tip_amount: replacement.tip_amount,
        created_at,
    })
}

/// Delete the transaction with `id` belonging to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, or [Error::SqlError] if an SQL related error occurred.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Map a [rusqlite::Row] from the transaction table to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        tx_ref: row.get(2)?,
        amount_received: row.get(3)?,
        trip_price: row.get(4)?,
        bonuses: row.get(5)?,
        system_fees: row.get(6)?,
        gross_total: row.get(7)?,
        rider_profit: row.get(8)?,
        platform_debt: row.get(9)?,
        platform: row.get(10)?,
        department: row.get(11)?,
        is_tip: row.get(12)?,
        tip_amount: row.get(13)?,
        created_at: row.get(14)?,
    })
}
