//! Value objects for the ledger.

use chrono::{DateTime, Utc};
use common::{AccountId, TransactionId};
use serde::{Deserialize, Serialize};

/// An amount of gold in whole currency units.
///
/// There are no fractional amounts and no negative amounts; a balance can
/// reach zero but never go below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gold(u64);

impl Gold {
    /// Creates an amount from whole units.
    pub fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Returns zero gold.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in whole units.
    pub fn amount(&self) -> u64 {
        self.0
    }

    /// Returns true if the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, returning None on overflow.
    pub fn checked_add(self, other: Gold) -> Option<Gold> {
        self.0.checked_add(other.0).map(Gold)
    }

    /// Adds two amounts, clamping at the maximum.
    pub fn saturating_add(self, other: Gold) -> Gold {
        Gold(self.0.saturating_add(other.0))
    }

    /// Subtracts an amount, returning None if the result would be negative.
    pub fn checked_sub(self, other: Gold) -> Option<Gold> {
        self.0.checked_sub(other.0).map(Gold)
    }
}

impl std::fmt::Display for Gold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} gp", self.0)
    }
}

impl From<u64> for Gold {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

/// What a transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of a balance-affecting action.
///
/// `from` is the account gold left, `to` the account it entered. A deposit
/// has only `to`, a withdrawal only `from`, a transfer both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: Gold,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub memo: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    /// Records gold entering an account from outside the ledger.
    pub fn deposit(account: AccountId, amount: Gold, memo: Option<String>) -> Self {
        Self::record(TransactionKind::Deposit, amount, None, Some(account), memo)
    }

    /// Records gold leaving an account to outside the ledger.
    pub fn withdrawal(account: AccountId, amount: Gold, memo: Option<String>) -> Self {
        Self::record(TransactionKind::Withdrawal, amount, Some(account), None, memo)
    }

    /// Records gold moving between two accounts.
    pub fn transfer(from: AccountId, to: AccountId, amount: Gold, memo: Option<String>) -> Self {
        Self::record(TransactionKind::Transfer, amount, Some(from), Some(to), memo)
    }

    fn record(
        kind: TransactionKind,
        amount: Gold,
        from: Option<AccountId>,
        to: Option<AccountId>,
        memo: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            kind,
            amount,
            from,
            to,
            memo,
            recorded_at: Utc::now(),
        }
    }

    /// Returns the signed effect of this transaction on an account's balance.
    pub fn net_effect_on(&self, account: AccountId) -> i128 {
        let amount = i128::from(self.amount.amount());
        let mut effect = 0;
        if self.to == Some(account) {
            effect += amount;
        }
        if self.from == Some(account) {
            effect -= amount;
        }
        effect
    }

    /// Returns true if the account took part in this transaction.
    pub fn involves(&self, account: AccountId) -> bool {
        self.from == Some(account) || self.to == Some(account)
    }
}
