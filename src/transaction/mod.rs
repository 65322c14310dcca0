//! Trip transactions: the data model, the split calculator, the dedup gate,
//! and the ingestion/CRUD endpoints.

mod core;
mod create_endpoint;
mod edit_endpoint;
mod ingest_endpoint;
mod list_endpoint;
mod split;

pub use core::{
    Department, NewTransaction, Platform, Transaction, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, get_transaction_by_reference,
    list_transactions, map_transaction_row, update_transaction,
};
pub use create_endpoint::{
    CreateTransactionState, Ingested, TransactionPayload, create_transaction_endpoint,
};
pub use edit_endpoint::{
    EditTransactionState, ReplaceTransactionPayload, delete_transaction_endpoint,
    update_transaction_endpoint,
};
pub use ingest_endpoint::{BridgeIngestState, bridge_ingest_transaction_endpoint};
pub use list_endpoint::{ListTransactionsState, list_transactions_endpoint};
pub use split::TripSplit;
