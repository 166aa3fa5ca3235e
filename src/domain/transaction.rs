use crate::domain::account::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed transfer, as recorded in the transaction log.
///
/// Records are immutable once committed. Both participant payment ids are
/// captured by value at commit time, so history stays stable even if an
/// account handle were ever reassigned.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    /// Monotonically increasing surrogate key, assigned at commit.
    pub id: u64,
    pub sender_payment_id: String,
    pub receiver_payment_id: String,
    pub amount: Amount,
    /// Commit timestamp. Non-decreasing across successive transactions.
    pub created_at: DateTime<Utc>,
}

/// A transfer record as staged by the engine, before the store assigns the
/// surrogate key and commit timestamp.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    pub sender_payment_id: String,
    pub receiver_payment_id: String,
    pub amount: Amount,
}
