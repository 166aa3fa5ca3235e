use super::account::{Account, Balance, NewAccount};
use super::transaction::{NewTransaction, Transaction};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account with the given opening balance, assigning the
    /// surrogate key. Fails with `DuplicateIdentifier` if the payment id is
    /// already registered.
    async fn create(&self, new_account: NewAccount, opening_balance: Balance) -> Result<Account>;
    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Account>>;
    async fn list(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// All transactions in which the account appears as sender or receiver,
    /// ordered by `created_at` descending, ties broken by `id` descending.
    async fn list_for_account(&self, payment_id: &str) -> Result<Vec<Transaction>>;
}

/// Combined storage surface used by the transfer engine.
#[async_trait]
pub trait LedgerStore: AccountStore + TransactionLog {
    /// Persists both updated accounts and appends the log record as one
    /// all-or-nothing unit, assigning the record's id and commit timestamp.
    ///
    /// Implementations must apply the whole commit in a single synchronous
    /// step: concurrent readers and abandoned callers can observe the ledger
    /// before or after the commit, never in between. On error nothing is
    /// persisted and the failure surfaces as `TransferFailed`.
    async fn commit_transfer(
        &self,
        sender: Account,
        receiver: Account,
        record: NewTransaction,
    ) -> Result<Transaction>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
