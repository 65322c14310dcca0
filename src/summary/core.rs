//! Defines the income summary model and the aggregation queries behind it.

use rusqlite::{Connection, named_params};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

use crate::{Error, user::UserID};

/// Aggregated income, debt, and expenses over a window of time.
///
/// Amounts come from the stored per-trip figures, so the totals are exact
/// sums of what was ingested rather than re-derived from trip prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// The sum of rider profit over the window.
    pub total_profit: f64,
    /// The sum of platform debt over the window.
    pub total_debt: f64,
    /// The sum of expenses over the window.
    pub expenses: f64,
    /// Profit minus expenses.
    pub net_profit: f64,
    /// Rider profit from Yango trips.
    pub yango_income: f64,
    /// Rider profit from Bolt trips.
    pub bolt_income: f64,
    /// Platform debt owed to Yango.
    pub yango_debt: f64,
    /// Platform debt owed to Bolt.
    pub bolt_debt: f64,
}

/// Summarise a user's transactions and expenses over the half-open window
/// `[start, end)`.
///
/// Both bounds are normalised to UTC before querying so they compare
/// correctly against the stored timestamps.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn summarize_period(
    user_id: UserID,
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<PeriodSummary, Error> {
    let start = start.to_offset(UtcOffset::UTC);
    let end = end.to_offset(UtcOffset::UTC);

    let (total_profit, total_debt, yango_income, bolt_income, yango_debt, bolt_debt) = connection
        .query_row(
            "SELECT \
                TOTAL(rider_profit), \
                TOTAL(platform_debt), \
                TOTAL(CASE WHEN platform = 'YANGO' THEN rider_profit ELSE 0 END), \
                TOTAL(CASE WHEN platform = 'BOLT' THEN rider_profit ELSE 0 END), \
                TOTAL(CASE WHEN platform = 'YANGO' THEN platform_debt ELSE 0 END), \
                TOTAL(CASE WHEN platform = 'BOLT' THEN platform_debt ELSE 0 END) \
             FROM \"transaction\" \
             WHERE user_id = :user_id AND created_at >= :start AND created_at < :end",
            named_params! {":user_id": user_id.as_i64(), ":start": start, ":end": end},
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )?;

    let expenses: f64 = connection.query_row(
        "SELECT TOTAL(amount) FROM expense \
         WHERE user_id = :user_id AND created_at >= :start AND created_at < :end",
        named_params! {":user_id": user_id.as_i64(), ":start": start, ":end": end},
        |row| row.get(0),
    )?;

    Ok(PeriodSummary {
        total_profit,
        total_debt,
        expenses,
        net_profit: total_profit - expenses,
        yango_income,
        bolt_income,
        yango_debt,
        bolt_debt,
    })
}

/// Summarise a single UTC calendar day.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn summarize_day(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<PeriodSummary, Error> {
    let start = date.with_time(Time::MIDNIGHT).assume_utc();

    summarize_period(user_id, start, start + Duration::days(1), connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        db::initialize,
        expense::{Category, create_expense},
        password::PasswordHash,
        summary::core::{summarize_day, summarize_period},
        transaction::{NewTransaction, Platform, create_transaction},
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
    fn empty_window_is_all_zero() {
        let (conn, user_id) = get_test_connection();

        let summary = summarize_day(user_id, date!(2026 - 08 - 30), &conn).unwrap();

        assert_eq!(summary.total_profit, 0.0);
        assert_eq!(summary.total_debt, 0.0);
        assert_eq!(summary.expenses, 0.0);
        assert_eq!(summary.net_profit, 0.0);
    }

    #[test]
    fn day_summary_breaks_down_by_platform() {
        let (conn, user_id) = get_test_connection();
        for (platform, rider_profit, platform_debt) in [
            (Platform::Yango, 102.0, 8.0),
            (Platform::Bolt, 55.0, 5.0),
            (Platform::Private, 40.0, 0.0),
        ] {
            create_transaction(
                NewTransaction {
                    rider_profit,
                    platform_debt,
                    ..NewTransaction::empty(user_id, platform, datetime!(2026-08-30 12:00:00 UTC))
                },
                &conn,
            )
            .unwrap();
        }
        create_expense(
            user_id,
            30.0,
            Category::Fuel,
            "",
            datetime!(2026-08-30 08:00:00 UTC),
            &conn,
        )
        .unwrap();

        let summary = summarize_day(user_id, date!(2026 - 08 - 30), &conn).unwrap();

        assert_eq!(summary.total_profit, 197.0);
        assert_eq!(summary.total_debt, 13.0);
        assert_eq!(summary.expenses, 30.0);
        assert_eq!(summary.net_profit, 167.0);
        assert_eq!(summary.yango_income, 102.0);
        assert_eq!(summary.bolt_income, 55.0);
        assert_eq!(summary.yango_debt, 8.0);
        assert_eq!(summary.bolt_debt, 5.0);
    }

    #[test]
    fn window_end_is_exclusive() {
        let (conn, user_id) = get_test_connection();
        create_transaction(
            NewTransaction {
                rider_profit: 50.0,
                ..NewTransaction::empty(
                    user_id,
                    Platform::Yango,
                    datetime!(2026-08-30 00:00:00 UTC),
                )
            },
            &conn,
        )
        .unwrap();

        let inside = summarize_period(
            user_id,
            datetime!(2026-08-29 00:00:00 UTC),
            datetime!(2026-08-31 00:00:00 UTC),
            &conn,
        )
        .unwrap();
        let outside = summarize_period(
            user_id,
            datetime!(2026-08-29 00:00:00 UTC),
            datetime!(2026-08-30 00:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(inside.total_profit, 50.0);
        assert_eq!(outside.total_profit, 0.0);
    }

    #[test]
    fn summary_is_owner_scoped() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter23"),
            &conn,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                rider_profit: 80.0,
                ..NewTransaction::empty(
                    other_user.id,
                    Platform::Bolt,
                    datetime!(2026-08-30 12:00:00 UTC),
                )
            },
            &conn,
        )
        .unwrap();

        let summary = summarize_day(user_id, date!(2026 - 08 - 30), &conn).unwrap();

        assert_eq!(summary.total_profit, 0.0);
    }
}
