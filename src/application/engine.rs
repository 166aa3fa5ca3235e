use crate::application::locks::AccountLocks;
use crate::domain::account::{Account, Amount, Balance, BalanceView, NewAccount};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tunables for the ledger service.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Balance granted to accounts created without an explicit opening
    /// balance.
    pub starting_grant: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_grant: dec!(1000.0),
        }
    }
}

/// The transfer engine: sole writer of balances and of the transaction log.
///
/// Every transfer is validated before any mutation, then applied through a
/// single all-or-nothing storage commit while both accounts' locks are held.
/// Read queries take no engine locks.
pub struct TransferEngine {
    store: LedgerStoreRef,
    locks: AccountLocks,
    config: LedgerConfig,
}

impl TransferEngine {
    pub fn new(store: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            config,
        }
    }

    /// Registers an account on behalf of the signup collaborator.
    ///
    /// The credential hash is stored untouched; verifying it is the
    /// authentication collaborator's job.
    pub async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        if new_account.display_name.trim().is_empty() {
            return Err(LedgerError::InvalidDisplayName);
        }
        let opening = new_account
            .opening_balance
            .unwrap_or(self.config.starting_grant);
        if opening < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.store.create(new_account, Balance::new(opening)).await?;
        tracing::info!(payment_id = %account.payment_id, "account created");
        Ok(account)
    }

    /// Moves `amount` from the sender to the receiver and appends the log
    /// record, atomically.
    ///
    /// On any error, balances and the log are exactly as before the call.
    pub async fn transfer(
        &self,
        sender_payment_id: &str,
        receiver_payment_id: &str,
        amount: Decimal,
    ) -> Result<Transaction> {
        let amount = Amount::new(amount)?;
        let sender = self.resolve(sender_payment_id).await?;
        let receiver = self.resolve(receiver_payment_id).await?;
        if sender.id == receiver.id {
            return Err(LedgerError::SelfTransfer);
        }

        // Both account locks are held for the whole validate-and-commit
        // window, acquired in ascending id order (see `AccountLocks`).
        let _guard = self.locks.lock_pair(sender.id, receiver.id).await;

        // Balances may have moved while we waited for the locks; re-read.
        let mut sender = self.resolve(sender_payment_id).await?;
        let mut receiver = self.resolve(receiver_payment_id).await?;

        sender.apply_delta(-amount.value())?;
        receiver.apply_delta(amount.value())?;

        let record = NewTransaction {
            sender_payment_id: sender.payment_id.clone(),
            receiver_payment_id: receiver.payment_id.clone(),
            amount,
        };
        let transaction = self.store.commit_transfer(sender, receiver, record).await?;
        tracing::info!(
            transaction = transaction.id,
            sender = %transaction.sender_payment_id,
            receiver = %transaction.receiver_payment_id,
            amount = %transaction.amount.value(),
            "transfer committed"
        );
        Ok(transaction)
    }

    pub async fn get_balance(&self, payment_id: &str) -> Result<BalanceView> {
        let account = self.resolve(payment_id).await?;
        Ok(BalanceView {
            payment_id: account.payment_id,
            balance: account.balance,
        })
    }

    /// The account's transaction history, most recent first.
    pub async fn get_history(&self, payment_id: &str) -> Result<Vec<Transaction>> {
        let account = self.resolve(payment_id).await?;
        self.store.list_for_account(&account.payment_id).await
    }

    /// Snapshot of every account, for reporting.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.store.list().await
    }

    async fn resolve(&self, payment_id: &str) -> Result<Account> {
        self.store
            .find_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                payment_id: payment_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{AccountStore, LedgerStore, TransactionLog};
    use crate::infrastructure::in_memory::InMemoryLedger;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn engine() -> TransferEngine {
        TransferEngine::new(Arc::new(InMemoryLedger::new()), LedgerConfig::default())
    }

    fn signup(payment_id: &str, opening_balance: Option<Decimal>) -> NewAccount {
        NewAccount {
            payment_id: payment_id.to_string(),
            display_name: payment_id.to_string(),
            credential_hash: "$2b$12$test".to_string(),
            opening_balance,
        }
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_and_logs() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", Some(dec!(1000.0))))
            .await
            .unwrap();
        engine
            .create_account(signup("bob@upi", Some(dec!(0.0))))
            .await
            .unwrap();

        let tx = engine
            .transfer("alice@upi", "bob@upi", dec!(300.0))
            .await
            .unwrap();
        assert_eq!(tx.sender_payment_id, "alice@upi");
        assert_eq!(tx.receiver_payment_id, "bob@upi");
        assert_eq!(tx.amount.value(), dec!(300.0));

        let alice = engine.get_balance("alice@upi").await.unwrap();
        let bob = engine.get_balance("bob@upi").await.unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(700.0)));
        assert_eq!(bob.balance, Balance::new(dec!(300.0)));

        let history = engine.get_history("alice@upi").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], tx);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_ledger_untouched() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", Some(dec!(1000.0))))
            .await
            .unwrap();
        engine
            .create_account(signup("bob@upi", Some(dec!(0.0))))
            .await
            .unwrap();
        engine
            .transfer("alice@upi", "bob@upi", dec!(300.0))
            .await
            .unwrap();

        let result = engine.transfer("alice@upi", "bob@upi", dec!(800.0)).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                requested,
                available,
            }) if requested == dec!(800.0) && available == dec!(700.0)
        ));

        let alice = engine.get_balance("alice@upi").await.unwrap();
        let bob = engine.get_balance("bob@upi").await.unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(700.0)));
        assert_eq!(bob.balance, Balance::new(dec!(300.0)));
        assert_eq!(engine.get_history("alice@upi").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_self_transfer() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();

        let result = engine.transfer("alice@upi", "alice@upi", dec!(10.0)).await;
        assert!(matches!(result, Err(LedgerError::SelfTransfer)));
        assert_eq!(
            engine.get_balance("alice@upi").await.unwrap().balance,
            Balance::new(dec!(1000.0))
        );
        assert!(engine.get_history("alice@upi").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_accounts() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();

        let result = engine.transfer("ghost@upi", "alice@upi", dec!(10.0)).await;
        assert!(matches!(
            result,
            Err(LedgerError::AccountNotFound { payment_id }) if payment_id == "ghost@upi"
        ));

        let result = engine.transfer("alice@upi", "ghost@upi", dec!(10.0)).await;
        assert!(matches!(
            result,
            Err(LedgerError::AccountNotFound { payment_id }) if payment_id == "ghost@upi"
        ));
        assert_eq!(
            engine.get_balance("alice@upi").await.unwrap().balance,
            Balance::new(dec!(1000.0))
        );
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();
        engine.create_account(signup("bob@upi", None)).await.unwrap();

        for amount in [dec!(0.0), dec!(-25.0)] {
            let result = engine.transfer("alice@upi", "bob@upi", amount).await;
            assert!(matches!(result, Err(LedgerError::InvalidAmount)));
        }
        assert!(engine.get_history("alice@upi").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_starting_grant_applies_when_unspecified() {
        let engine = TransferEngine::new(
            Arc::new(InMemoryLedger::new()),
            LedgerConfig {
                starting_grant: dec!(50.0),
            },
        );
        let granted = engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();
        assert_eq!(granted.balance, Balance::new(dec!(50.0)));

        let explicit = engine
            .create_account(signup("bob@upi", Some(dec!(7.5))))
            .await
            .unwrap();
        assert_eq!(explicit.balance, Balance::new(dec!(7.5)));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_payment_id() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();

        let result = engine.create_account(signup("alice@upi", None)).await;
        assert!(matches!(
            result,
            Err(LedgerError::DuplicateIdentifier { payment_id }) if payment_id == "alice@upi"
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_signup_payloads() {
        let engine = engine();

        let mut nameless = signup("alice@upi", None);
        nameless.display_name = "  ".to_string();
        assert!(matches!(
            engine.create_account(nameless).await,
            Err(LedgerError::InvalidDisplayName)
        ));

        let result = engine
            .create_account(signup("bob@upi", Some(dec!(-1.0))))
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    }

    #[tokio::test]
    async fn test_history_most_recent_first_and_stable() {
        let engine = engine();
        engine
            .create_account(signup("alice@upi", None))
            .await
            .unwrap();
        engine.create_account(signup("bob@upi", None)).await.unwrap();
        engine
            .create_account(signup("carol@upi", None))
            .await
            .unwrap();

        engine
            .transfer("alice@upi", "bob@upi", dec!(10.0))
            .await
            .unwrap();
        engine
            .transfer("bob@upi", "alice@upi", dec!(20.0))
            .await
            .unwrap();
        engine
            .transfer("alice@upi", "carol@upi", dec!(30.0))
            .await
            .unwrap();

        let history = engine.get_history("alice@upi").await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].id > w[1].id));
        assert!(
            history
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );

        // Re-querying with no new writes returns the same sequence.
        assert_eq!(engine.get_history("alice@upi").await.unwrap(), history);

        // Bob only sees the transfers he took part in.
        let bob_history = engine.get_history("bob@upi").await.unwrap();
        assert_eq!(bob_history.len(), 2);
    }

    #[tokio::test]
    async fn test_get_balance_unknown_account() {
        let engine = engine();
        let result = engine.get_balance("ghost@upi").await;
        assert!(matches!(
            result,
            Err(LedgerError::AccountNotFound { payment_id }) if payment_id == "ghost@upi"
        ));
    }

    /// Delegates everything to an in-memory ledger but fails every commit,
    /// simulating a storage fault at the atomic-unit boundary.
    struct FailingStore {
        inner: InMemoryLedger,
    }

    #[async_trait]
    impl AccountStore for FailingStore {
        async fn create(
            &self,
            new_account: NewAccount,
            opening_balance: Balance,
        ) -> Result<Account> {
            self.inner.create(new_account, opening_balance).await
        }

        async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Account>> {
            self.inner.find_by_payment_id(payment_id).await
        }

        async fn list(&self) -> Result<Vec<Account>> {
            self.inner.list().await
        }
    }

    #[async_trait]
    impl TransactionLog for FailingStore {
        async fn list_for_account(&self, payment_id: &str) -> Result<Vec<Transaction>> {
            self.inner.list_for_account(payment_id).await
        }
    }

    #[async_trait]
    impl LedgerStore for FailingStore {
        async fn commit_transfer(
            &self,
            _sender: Account,
            _receiver: Account,
            _record: NewTransaction,
        ) -> Result<Transaction> {
            Err(LedgerError::TransferFailed(Box::new(
                std::io::Error::other("injected commit fault"),
            )))
        }
    }

    #[tokio::test]
    async fn test_commit_failure_has_no_partial_effects() {
        let engine = TransferEngine::new(
            Arc::new(FailingStore {
                inner: InMemoryLedger::new(),
            }),
            LedgerConfig::default(),
        );
        engine
            .create_account(signup("alice@upi", Some(dec!(1000.0))))
            .await
            .unwrap();
        engine
            .create_account(signup("bob@upi", Some(dec!(0.0))))
            .await
            .unwrap();

        let result = engine.transfer("alice@upi", "bob@upi", dec!(300.0)).await;
        assert!(matches!(result, Err(LedgerError::TransferFailed(_))));

        // Validation passed, the commit failed: nothing may have changed.
        let alice = engine.get_balance("alice@upi").await.unwrap();
        let bob = engine.get_balance("bob@upi").await.unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(1000.0)));
        assert_eq!(bob.balance, Balance::new(dec!(0.0)));
        assert!(engine.get_history("alice@upi").await.unwrap().is_empty());
    }
}
