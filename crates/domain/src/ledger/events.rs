//! Ledger domain events.

use common::{AccountId, CoinhouseId, PersonaId};
use dispatch::{DomainEvent, EventMetadata, RaisedEvent};
use serde::{Deserialize, Serialize};

use super::{Gold, Transaction};

/// Events that can occur on a ledger account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    /// An account was opened.
    AccountOpened(AccountOpened),

    /// Gold was deposited.
    GoldDeposited(GoldDeposited),

    /// Gold was withdrawn.
    GoldWithdrawn(GoldWithdrawn),

    /// Gold moved between two accounts.
    GoldTransferred(GoldTransferred),
}

impl LedgerEvent {
    /// Erases the event for publication.
    pub fn into_raised(self) -> RaisedEvent {
        match self {
            LedgerEvent::AccountOpened(event) => RaisedEvent::new(event),
            LedgerEvent::GoldDeposited(event) => RaisedEvent::new(event),
            LedgerEvent::GoldWithdrawn(event) => RaisedEvent::new(event),
            LedgerEvent::GoldTransferred(event) => RaisedEvent::new(event),
        }
    }

    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::AccountOpened(event) => event.event_type(),
            LedgerEvent::GoldDeposited(event) => event.event_type(),
            LedgerEvent::GoldWithdrawn(event) => event.event_type(),
            LedgerEvent::GoldTransferred(event) => event.event_type(),
        }
    }
}

/// An account was opened at a coinhouse with a zero balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOpened {
    pub meta: EventMetadata,
    pub account: AccountId,
    pub owner: PersonaId,
    pub coinhouse: CoinhouseId,
}

/// Gold entered an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldDeposited {
    pub meta: EventMetadata,
    pub account: AccountId,
    pub amount: Gold,
    /// Balance after the deposit.
    pub balance: Gold,
    pub transaction: Transaction,
}

/// Gold left an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldWithdrawn {
    pub meta: EventMetadata,
    pub account: AccountId,
    pub amount: Gold,
    /// Balance after the withdrawal.
    pub balance: Gold,
    pub transaction: Transaction,
}

/// Gold moved from one account to another in a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldTransferred {
    pub meta: EventMetadata,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Gold,
    pub transaction: Transaction,
}

impl DomainEvent for AccountOpened {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

impl DomainEvent for GoldDeposited {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

impl DomainEvent for GoldWithdrawn {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

impl DomainEvent for GoldTransferred {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

// Convenience constructors for events
impl LedgerEvent {
    /// Creates an AccountOpened event.
    pub fn account_opened(account: AccountId, owner: PersonaId, coinhouse: CoinhouseId) -> Self {
        LedgerEvent::AccountOpened(AccountOpened {
            meta: EventMetadata::now(),
            account,
            owner,
            coinhouse,
        })
    }

    /// Creates a GoldDeposited event.
    pub fn gold_deposited(account: AccountId, balance: Gold, transaction: Transaction) -> Self {
        LedgerEvent::GoldDeposited(GoldDeposited {
            meta: EventMetadata::now(),
            account,
            amount: transaction.amount,
            balance,
            transaction,
        })
    }

    /// Creates a GoldWithdrawn event.
    pub fn gold_withdrawn(account: AccountId, balance: Gold, transaction: Transaction) -> Self {
        LedgerEvent::GoldWithdrawn(GoldWithdrawn {
            meta: EventMetadata::now(),
            account,
            amount: transaction.amount,
            balance,
            transaction,
        })
    }

    /// Creates a GoldTransferred event.
    pub fn gold_transferred(from: AccountId, to: AccountId, transaction: Transaction) -> Self {
        LedgerEvent::GoldTransferred(GoldTransferred {
            meta: EventMetadata::now(),
            from,
            to,
            amount: transaction.amount,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        let account = AccountId::new();
        let tx = Transaction::deposit(account, Gold::new(5), None);
        let event = LedgerEvent::gold_deposited(account, Gold::new(5), tx);
        assert_eq!(event.event_type(), "GoldDeposited");

        let event = LedgerEvent::account_opened(account, PersonaId::new(), CoinhouseId::new());
        assert_eq!(event.event_type(), "AccountOpened");
    }

    #[test]
    fn raised_event_keeps_concrete_type() {
        let from = AccountId::new();
        let to = AccountId::new();
        let tx = Transaction::transfer(from, to, Gold::new(9), None);
        let raised = LedgerEvent::gold_transferred(from, to, tx).into_raised();

        let typed = raised.downcast_ref::<GoldTransferred>().unwrap();
        assert_eq!(typed.amount, Gold::new(9));
        assert_eq!(raised.event_type(), "GoldTransferred");
    }

    #[test]
    fn serializes_with_type_tag() {
        let account = AccountId::new();
        let event = LedgerEvent::account_opened(account, PersonaId::new(), CoinhouseId::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AccountOpened");
        assert_eq!(json["data"]["account"], serde_json::json!(account));
    }
}
