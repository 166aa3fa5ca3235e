use crate::domain::account::{Account, Balance, NewAccount};
use crate::domain::ports::{AccountStore, LedgerStore, TransactionLog};
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for account records, keyed by payment id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for the transaction log, keyed by big-endian transaction id
/// so that reverse iteration yields newest first.
pub const CF_TRANSACTIONS: &str = "transactions";

#[derive(Default)]
struct MetaState {
    next_account_id: u64,
    next_transaction_id: u64,
    last_commit_at: Option<DateTime<Utc>>,
}

/// A persistent ledger backed by RocksDB.
///
/// Account and transaction records are stored as JSON in separate column
/// families. `commit_transfer` stages both account updates and the log
/// record in a single `WriteBatch`, so a commit is visible either in full or
/// not at all, across process restarts included.
///
/// Surrogate counters and the last commit timestamp are recovered by
/// scanning the column families at open. `Clone` shares the underlying
/// `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    meta: Arc<Mutex<MetaState>>,
}

fn storage<E>(error: E) -> LedgerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    LedgerError::Storage(Box::new(error))
}

fn commit_fault<E>(error: E) -> LedgerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    LedgerError::TransferFailed(Box::new(error))
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// both column families exist and recovering surrogate counters from the
    /// stored records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transactions])
            .map_err(storage)?;

        let mut meta = MetaState::default();
        if let Some(cf) = db.cf_handle(CF_ACCOUNTS) {
            for item in db.iterator_cf(cf, IteratorMode::Start) {
                let (_key, value) = item.map_err(storage)?;
                let account: Account = serde_json::from_slice(&value).map_err(storage)?;
                meta.next_account_id = meta.next_account_id.max(account.id);
            }
        }
        if let Some(cf) = db.cf_handle(CF_TRANSACTIONS) {
            // The highest key holds the latest transaction.
            if let Some(item) = db.iterator_cf(cf, IteratorMode::End).next() {
                let (_key, value) = item.map_err(storage)?;
                let transaction: Transaction = serde_json::from_slice(&value).map_err(storage)?;
                meta.next_transaction_id = transaction.id;
                meta.last_commit_at = Some(transaction.created_at);
            }
        }

        Ok(Self {
            db: Arc::new(db),
            meta: Arc::new(Mutex::new(meta)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            storage(std::io::Error::other(format!(
                "column family `{name}` not found"
            )))
        })
    }
}

#[async_trait]
impl AccountStore for RocksDbLedger {
    async fn create(&self, new_account: NewAccount, opening_balance: Balance) -> Result<Account> {
        let mut meta = self.meta.lock().await;
        let cf = self.cf(CF_ACCOUNTS)?;

        let existing = self
            .db
            .get_pinned_cf(cf, new_account.payment_id.as_bytes())
            .map_err(storage)?;
        if existing.is_some() {
            return Err(LedgerError::DuplicateIdentifier {
                payment_id: new_account.payment_id,
            });
        }

        let account = Account {
            id: meta.next_account_id + 1,
            payment_id: new_account.payment_id,
            display_name: new_account.display_name,
            credential_hash: new_account.credential_hash,
            balance: opening_balance,
        };
        let value = serde_json::to_vec(&account).map_err(storage)?;
        self.db
            .put_cf(cf, account.payment_id.as_bytes(), value)
            .map_err(storage)?;
        meta.next_account_id = account.id;
        Ok(account)
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, payment_id.as_bytes()).map_err(storage)? {
            Some(bytes) => {
                let account = serde_json::from_slice(&bytes).map_err(storage)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(storage)?;
            let account: Account = serde_json::from_slice(&value).map_err(storage)?;
            accounts.push(account);
        }
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionLog for RocksDbLedger {
    async fn list_for_account(&self, payment_id: &str) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_key, value) = item.map_err(storage)?;
            let transaction: Transaction = serde_json::from_slice(&value).map_err(storage)?;
            if transaction.sender_payment_id == payment_id
                || transaction.receiver_payment_id == payment_id
            {
                transactions.push(transaction);
            }
        }
        Ok(transactions)
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedger {
    async fn commit_transfer(
        &self,
        sender: Account,
        receiver: Account,
        record: NewTransaction,
    ) -> Result<Transaction> {
        let mut meta = self.meta.lock().await;

        // Clamp against the previous commit so `created_at` never decreases.
        let now = Utc::now();
        let created_at = match meta.last_commit_at {
            Some(last) if last > now => last,
            _ => now,
        };
        let transaction = Transaction {
            id: meta.next_transaction_id + 1,
            sender_payment_id: record.sender_payment_id,
            receiver_payment_id: record.receiver_payment_id,
            amount: record.amount,
            created_at,
        };

        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let transactions_cf = self.cf(CF_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            accounts_cf,
            sender.payment_id.as_bytes(),
            serde_json::to_vec(&sender).map_err(commit_fault)?,
        );
        batch.put_cf(
            accounts_cf,
            receiver.payment_id.as_bytes(),
            serde_json::to_vec(&receiver).map_err(commit_fault)?,
        );
        batch.put_cf(
            transactions_cf,
            transaction.id.to_be_bytes(),
            serde_json::to_vec(&transaction).map_err(commit_fault)?,
        );
        self.db.write(batch).map_err(commit_fault)?;

        meta.next_transaction_id = transaction.id;
        meta.last_commit_at = Some(created_at);
        Ok(transaction)
    }
}
