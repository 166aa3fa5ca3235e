use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger.
///
/// Each contract violation is a distinct variant so callers can match on the
/// condition instead of parsing messages.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("amount must be a positive quantity")]
    InvalidAmount,
    #[error("display name must not be empty")]
    InvalidDisplayName,
    #[error("no account with payment id `{payment_id}`")]
    AccountNotFound { payment_id: String },
    #[error("sender and receiver must be different accounts")]
    SelfTransfer,
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
    #[error("payment id `{payment_id}` is already registered")]
    DuplicateIdentifier { payment_id: String },
    #[error("command is missing required field `{0}`")]
    MissingField(&'static str),
    /// The atomic commit could not complete. No balance change and no log
    /// entry became visible; the operation is safe to retry.
    #[error("transfer could not be committed: {0}")]
    TransferFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// True for rejections caused by the request itself rather than by the
    /// storage layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount
                | Self::InvalidDisplayName
                | Self::AccountNotFound { .. }
                | Self::SelfTransfer
                | Self::InsufficientFunds { .. }
                | Self::DuplicateIdentifier { .. }
        )
    }
}
