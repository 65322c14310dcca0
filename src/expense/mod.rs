//! Driving expenses: the data model, database queries, and endpoints for
//! recording, listing, and deleting them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    Category, Expense, create_expense, create_expense_table, delete_expense, list_expenses,
    map_expense_row,
};
pub use create_endpoint::{
    CreateExpenseState, ExpensePayload, bridge_ingest_expense_endpoint, create_expense_endpoint,
};
pub use delete_endpoint::{DeleteExpenseState, delete_expense_endpoint};
pub use list_endpoint::{ListExpensesState, list_expenses_endpoint};
