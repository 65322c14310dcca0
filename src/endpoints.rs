//! The API endpoint URIs.

/// The route for creating an account.
pub const REGISTER: &str = "/api/auth/register/";
/// The route for exchanging credentials for a bearer token.
pub const LOG_IN: &str = "/api/auth/login/";
/// The route for liveness checks.
pub const HEALTH: &str = "/api/health/";

/// The route the SMS bridge posts transactions to.
pub const INGEST_TRANSACTIONS: &str = "/api/ingest/transactions/";
/// The route the SMS bridge posts expenses to.
pub const INGEST_EXPENSES: &str = "/api/ingest/expenses/";

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions/";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create and list expenses.
pub const EXPENSES: &str = "/api/expenses/";
/// The route to delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for today's income summary.
pub const DAILY_SUMMARY: &str = "/api/summary/daily/";
/// The route for an income summary over an arbitrary window.
pub const PERIOD_SUMMARY: &str = "/api/summary/period/";
/// The route for settling outstanding platform debt.
pub const CLEAR_DEBT: &str = "/api/debt/clear/";
