//! Coinhouse ledger accounts and related types.

mod account;
mod commands;
mod events;
mod queries;
mod service;
mod value_objects;

pub use account::LedgerAccount;
pub use commands::{Deposit, OpenAccount, Transfer, Withdraw};
pub use events::{AccountOpened, GoldDeposited, GoldTransferred, GoldWithdrawn, LedgerEvent};
pub use queries::{FindAccount, GetAccount, GetBalance, GetTransactions};
pub use service::LedgerService;
pub use value_objects::{Gold, Transaction, TransactionKind};

use common::{AccountId, Classify, ErrorKind};
use thiserror::Error;

/// Longest memo accepted on a transaction, in characters.
pub const MAX_MEMO_LENGTH: usize = 256;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount must be greater than zero.
    #[error("Invalid amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: u64 },

    /// The account does not hold enough gold.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Gold, requested: Gold },

    /// An account already exists for this persona at this coinhouse.
    #[error("Account already open: {account}")]
    AccountAlreadyOpen { account: AccountId },

    /// The account has not been opened.
    #[error("Account not open")]
    AccountNotOpen,

    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account: {account}")]
    SelfTransfer { account: AccountId },

    /// The resulting balance would not fit.
    #[error("Balance overflow on account {account}")]
    BalanceOverflow { account: AccountId },

    /// Memo exceeds the maximum length.
    #[error("Memo too long: {length} characters (max {MAX_MEMO_LENGTH})")]
    MemoTooLong { length: usize },
}

impl Classify for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. }
            | LedgerError::SelfTransfer { .. }
            | LedgerError::BalanceOverflow { .. }
            | LedgerError::MemoTooLong { .. } => ErrorKind::Validation,
            LedgerError::InsufficientFunds { .. } | LedgerError::AccountAlreadyOpen { .. } => {
                ErrorKind::Conflict
            }
            LedgerError::AccountNotOpen => ErrorKind::NotFound,
        }
    }
}
