//! Defines debt settlement: clearing a user's outstanding per-platform debt
//! with offsetting transaction records.

use rusqlite::{Connection, TransactionBehavior, named_params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    transaction::{NewTransaction, Platform, create_transaction},
    user::UserID,
};

/// Accumulated float error below this is treated as no debt.
const SETTLED_EPSILON: f64 = 0.005;

/// The outcome of a settlement run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    /// How many offset records were inserted.
    pub records_created: u32,
    /// The total amount of debt cleared.
    pub total_cleared: f64,
}

/// Clear the user's outstanding debt towards Yango and Bolt.
///
/// Sums `platform_debt` over all time per platform and, for each platform
/// with a positive balance, inserts one offsetting transaction that carries
/// the negated balance and nothing else. The read and the inserts run inside
/// one SQLite transaction so two concurrent settlements cannot both offset
/// the same debt.
///
/// Settlement never rewrites history; summaries after a settlement show the
/// offsets alongside the original records.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn settle_debt(
    user_id: UserID,
    connection: &mut Connection,
) -> Result<SettlementReport, Error> {
    let sql_transaction =
        connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let now = OffsetDateTime::now_utc();
    let mut report = SettlementReport {
        records_created: 0,
        total_cleared: 0.0,
    };

    for platform in [Platform::Yango, Platform::Bolt] {
        let outstanding: f64 = sql_transaction.query_row(
            "SELECT TOTAL(platform_debt) FROM \"transaction\" \
             WHERE user_id = :user_id AND platform = :platform",
            named_params! {":user_id": user_id.as_i64(), ":platform": platform},
            |row| row.get(0),
        )?;

        if outstanding < SETTLED_EPSILON {
            continue;
        }

        create_transaction(
            NewTransaction {
                tx_ref: Some(settlement_reference(platform, now)),
                platform_debt: -outstanding,
                ..NewTransaction::empty(user_id, platform, now)
            },
            &sql_transaction,
        )?;

        report.records_created += 1;
        report.total_cleared += outstanding;
    }

    sql_transaction.commit()?;

    Ok(report)
}

/// A reference for an offset record that cannot collide with an external one.
fn settlement_reference(platform: Platform, now: OffsetDateTime) -> String {
    format!("SETTLE-{platform}-{}", now.unix_timestamp_nanos())
}
