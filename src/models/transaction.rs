use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of a submitted transfer, built from the confirmation receipt.
/// Held only for the response; nothing is persisted.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: String,
    pub token_address: Option<String>,
    pub explorer_url: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

/// The record is only built once the receipt is in, so there is no pending
/// state to report.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
    Failed,
}
