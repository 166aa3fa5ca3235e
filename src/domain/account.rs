use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Represents a monetary value held by an account.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific
/// rules and provide type safety for financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// Represents a positive monetary amount for transfers.
///
/// Ensures that transfer amounts are always positive. `Decimal` has no
/// non-finite representations, so finiteness holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A ledger account.
///
/// `payment_id` is the globally unique external handle used to address
/// transfers; `id` is the store-assigned surrogate key. `credential_hash` is
/// opaque here: it is written by the authentication collaborator at signup and
/// never inspected by the ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: u64,
    pub payment_id: String,
    pub display_name: String,
    pub credential_hash: String,
    pub balance: Balance,
}

impl Account {
    /// Applies a signed balance change, rejecting any result below zero.
    ///
    /// Only the transfer engine calls this, always on a staged copy and always
    /// in a debit/credit pair that nets to zero within one commit.
    pub fn apply_delta(&mut self, delta: Decimal) -> Result<()> {
        let next = self.balance.0 + delta;
        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                requested: delta.abs(),
                available: self.balance.0,
            });
        }
        self.balance = Balance(next);
        Ok(())
    }
}

/// Payload for account creation, supplied by the signup collaborator.
///
/// `opening_balance` of `None` means "use the configured starting grant".
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub payment_id: String,
    pub display_name: String,
    pub credential_hash: String,
    pub opening_balance: Option<Decimal>,
}

/// Read model returned by balance queries.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct BalanceView {
    pub payment_id: String,
    pub balance: Balance,
}
