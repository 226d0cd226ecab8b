//! Ledger queries.
//!
//! Every query answers `None` for an account that does not exist.

use common::{AccountId, CoinhouseId, PersonaId};
use dispatch::Query;

use crate::error::DomainError;

use super::{Gold, LedgerAccount, Transaction};

/// Query for the balance of an account.
#[derive(Debug, Clone, Copy)]
pub struct GetBalance {
    pub account: AccountId,
}

impl GetBalance {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }
}

impl Query for GetBalance {
    type Output = Option<Gold>;
    type Error = DomainError;
}

/// Query for a full account.
#[derive(Debug, Clone, Copy)]
pub struct GetAccount {
    pub account: AccountId,
}

impl GetAccount {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }
}

impl Query for GetAccount {
    type Output = Option<LedgerAccount>;
    type Error = DomainError;
}

/// Query for an account's transaction history, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct GetTransactions {
    pub account: AccountId,
}

impl GetTransactions {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }
}

impl Query for GetTransactions {
    type Output = Option<Vec<Transaction>>;
    type Error = DomainError;
}

/// Query for the account a persona holds at a coinhouse.
#[derive(Debug, Clone, Copy)]
pub struct FindAccount {
    pub persona: PersonaId,
    pub coinhouse: CoinhouseId,
}

impl FindAccount {
    pub fn new(persona: PersonaId, coinhouse: CoinhouseId) -> Self {
        Self { persona, coinhouse }
    }
}

impl Query for FindAccount {
    type Output = Option<LedgerAccount>;
    type Error = DomainError;
}
