//! Ledger commands.

use common::{AccountId, CoinhouseId, PersonaId};
use dispatch::Command;

use crate::error::DomainError;

use super::Gold;

/// Command to open an account for a persona at a coinhouse.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The persona holding the account.
    pub persona: PersonaId,

    /// The coinhouse holding the gold.
    pub coinhouse: CoinhouseId,
}

impl OpenAccount {
    /// Creates a new OpenAccount command.
    pub fn new(persona: PersonaId, coinhouse: CoinhouseId) -> Self {
        Self { persona, coinhouse }
    }

    /// Returns the id the account will have.
    pub fn account_id(&self) -> AccountId {
        AccountId::for_holder(self.persona, self.coinhouse)
    }
}

impl Command for OpenAccount {
    type Error = DomainError;
}

/// Command to deposit gold into an account.
#[derive(Debug, Clone)]
pub struct Deposit {
    /// The account to deposit into.
    pub account: AccountId,

    /// Amount to deposit.
    pub amount: Gold,

    /// Optional note recorded on the transaction.
    pub memo: Option<String>,
}

impl Deposit {
    /// Creates a new Deposit command.
    pub fn new(account: AccountId, amount: u64) -> Self {
        Self {
            account,
            amount: Gold::new(amount),
            memo: None,
        }
    }

    /// Attaches a memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl Command for Deposit {
    type Error = DomainError;
}

/// Command to withdraw gold from an account.
#[derive(Debug, Clone)]
pub struct Withdraw {
    /// The account to withdraw from.
    pub account: AccountId,

    /// Amount to withdraw.
    pub amount: Gold,

    /// Optional note recorded on the transaction.
    pub memo: Option<String>,
}

impl Withdraw {
    /// Creates a new Withdraw command.
    pub fn new(account: AccountId, amount: u64) -> Self {
        Self {
            account,
            amount: Gold::new(amount),
            memo: None,
        }
    }

    /// Attaches a memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl Command for Withdraw {
    type Error = DomainError;
}

/// Command to move gold between two accounts.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Account the gold leaves.
    pub from: AccountId,

    /// Account the gold enters.
    pub to: AccountId,

    /// Amount to move.
    pub amount: Gold,

    /// Optional note recorded on the transaction.
    pub memo: Option<String>,
}

impl Transfer {
    /// Creates a new Transfer command.
    pub fn new(from: AccountId, to: AccountId, amount: u64) -> Self {
        Self {
            from,
            to,
            amount: Gold::new(amount),
            memo: None,
        }
    }

    /// Attaches a memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl Command for Transfer {
    type Error = DomainError;
}
