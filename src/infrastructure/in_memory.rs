use crate::domain::account::{Account, Balance, NewAccount};
use crate::domain::ports::{AccountStore, LedgerStore, TransactionLog};
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    transactions: Vec<Transaction>,
    next_account_id: u64,
    next_transaction_id: u64,
    last_commit_at: Option<DateTime<Utc>>,
}

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<RwLock<_>>` to allow shared concurrent access: readers see the
/// state before or after a commit's critical section, never in between.
/// Ideal for testing or setups where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryLedger {
    async fn create(&self, new_account: NewAccount, opening_balance: Balance) -> Result<Account> {
        let mut state = self.state.write().await;
        if state.accounts.contains_key(&new_account.payment_id) {
            return Err(LedgerError::DuplicateIdentifier {
                payment_id: new_account.payment_id,
            });
        }
        state.next_account_id += 1;
        let account = Account {
            id: state.next_account_id,
            payment_id: new_account.payment_id,
            display_name: new_account.display_name,
            credential_hash: new_account.credential_hash,
            balance: opening_balance,
        };
        state
            .accounts
            .insert(account.payment_id.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(payment_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }
}

#[async_trait]
impl TransactionLog for InMemoryLedger {
    async fn list_for_account(&self, payment_id: &str) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        // Appended in commit order, so reverse iteration yields newest first.
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.sender_payment_id == payment_id || tx.receiver_payment_id == payment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn commit_transfer(
        &self,
        sender: Account,
        receiver: Account,
        record: NewTransaction,
    ) -> Result<Transaction> {
        let mut state = self.state.write().await;
        state.next_transaction_id += 1;

        // Clamp against the previous commit so `created_at` never decreases,
        // even if the wall clock steps backwards.
        let now = Utc::now();
        let created_at = match state.last_commit_at {
            Some(last) if last > now => last,
            _ => now,
        };
        state.last_commit_at = Some(created_at);

        let transaction = Transaction {
            id: state.next_transaction_id,
            sender_payment_id: record.sender_payment_id,
            receiver_payment_id: record.receiver_payment_id,
            amount: record.amount,
            created_at,
        };

        // Both balance writes and the append land inside one write-lock
        // critical section.
        state
            .accounts
            .insert(sender.payment_id.clone(), sender);
        state
            .accounts
            .insert(receiver.payment_id.clone(), receiver);
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }
}
