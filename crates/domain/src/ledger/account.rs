//! Ledger account aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AccountId, CoinhouseId, PersonaId};
use repository::{Version, Versioned};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    Gold, LedgerError, LedgerEvent, MAX_MEMO_LENGTH, Transaction,
    events::{AccountOpened, GoldDeposited, GoldTransferred, GoldWithdrawn},
};

/// Ledger account aggregate root.
///
/// A persona's gold held at one coinhouse. `debit` is the total that ever
/// entered the account and `credit` the total that ever left it, so the
/// balance is always `debit - credit` and never negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Account identifier, derived from owner and coinhouse.
    id: Option<AccountId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Persona holding the account.
    owner: Option<PersonaId>,

    /// Coinhouse the account is held at.
    coinhouse: Option<CoinhouseId>,

    /// Total gold in.
    debit: Gold,

    /// Total gold out.
    credit: Gold,

    opened_at: Option<DateTime<Utc>>,

    last_accessed_at: Option<DateTime<Utc>>,

    /// Every balance-affecting transaction, oldest first.
    transactions: Vec<Transaction>,
}

impl Versioned for LedgerAccount {
    type Id = AccountId;

    fn aggregate_type() -> &'static str {
        "LedgerAccount"
    }

    fn id(&self) -> Option<AccountId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Aggregate for LedgerAccount {
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: Self::Event) {
        match event {
            LedgerEvent::AccountOpened(data) => self.apply_account_opened(data),
            LedgerEvent::GoldDeposited(data) => self.apply_gold_deposited(data),
            LedgerEvent::GoldWithdrawn(data) => self.apply_gold_withdrawn(data),
            LedgerEvent::GoldTransferred(data) => self.apply_gold_transferred(data),
        }
    }
}

// Query methods
impl LedgerAccount {
    /// Returns the persona holding the account.
    pub fn owner(&self) -> Option<PersonaId> {
        self.owner
    }

    /// Returns the coinhouse the account is held at.
    pub fn coinhouse(&self) -> Option<CoinhouseId> {
        self.coinhouse
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Gold {
        self.debit.checked_sub(self.credit).unwrap_or_default()
    }

    /// Returns the total gold that entered the account.
    pub fn debit(&self) -> Gold {
        self.debit
    }

    /// Returns the total gold that left the account.
    pub fn credit(&self) -> Gold {
        self.credit
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        self.last_accessed_at
    }

    /// Returns the transaction history, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Returns true once the account has been opened.
    pub fn is_open(&self) -> bool {
        self.id.is_some()
    }
}

// Command methods (return events)
impl LedgerAccount {
    /// Opens a zero-balance account.
    pub fn open(
        &self,
        account: AccountId,
        owner: PersonaId,
        coinhouse: CoinhouseId,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        if let Some(existing) = self.id {
            return Err(LedgerError::AccountAlreadyOpen { account: existing });
        }

        Ok(vec![LedgerEvent::account_opened(account, owner, coinhouse)])
    }

    /// Deposits gold into the account.
    pub fn deposit(&self, amount: Gold, memo: Option<String>) -> Result<Vec<LedgerEvent>, LedgerError> {
        let account = self.require_open()?;
        validate_amount(amount)?;
        validate_memo(memo.as_deref())?;

        let debit = self
            .debit
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account })?;
        let balance = debit.checked_sub(self.credit).unwrap_or_default();

        let transaction = Transaction::deposit(account, amount, memo);
        Ok(vec![LedgerEvent::gold_deposited(account, balance, transaction)])
    }

    /// Withdraws gold from the account.
    pub fn withdraw(&self, amount: Gold, memo: Option<String>) -> Result<Vec<LedgerEvent>, LedgerError> {
        let account = self.require_open()?;
        validate_amount(amount)?;
        validate_memo(memo.as_deref())?;

        let balance = self.debit_from(amount)?;

        let transaction = Transaction::withdrawal(account, amount, memo);
        Ok(vec![LedgerEvent::gold_withdrawn(account, balance, transaction)])
    }

    /// Moves gold from one account to another.
    ///
    /// Produces a single `GoldTransferred` event that must be applied to
    /// both accounts.
    pub fn transfer(
        from: &LedgerAccount,
        to: &LedgerAccount,
        amount: Gold,
        memo: Option<String>,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let source = from.require_open()?;
        let destination = to.require_open()?;

        if source == destination {
            return Err(LedgerError::SelfTransfer { account: source });
        }
        validate_amount(amount)?;
        validate_memo(memo.as_deref())?;

        from.debit_from(amount)?;
        if to.debit.checked_add(amount).is_none() {
            return Err(LedgerError::BalanceOverflow {
                account: destination,
            });
        }

        let transaction = Transaction::transfer(source, destination, amount, memo);
        Ok(vec![LedgerEvent::gold_transferred(
            source,
            destination,
            transaction,
        )])
    }

    fn require_open(&self) -> Result<AccountId, LedgerError> {
        self.id.ok_or(LedgerError::AccountNotOpen)
    }

    /// Returns the balance left after taking `amount` out.
    fn debit_from(&self, amount: Gold) -> Result<Gold, LedgerError> {
        let balance = self.balance();
        balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            })
    }
}

fn validate_amount(amount: Gold) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount {
            amount: amount.amount(),
        })
    }
}

fn validate_memo(memo: Option<&str>) -> Result<(), LedgerError> {
    match memo.map(|memo| memo.chars().count()) {
        Some(length) if length > MAX_MEMO_LENGTH => Err(LedgerError::MemoTooLong { length }),
        _ => Ok(()),
    }
}

// Apply event helpers
impl LedgerAccount {
    fn apply_account_opened(&mut self, data: AccountOpened) {
        self.id = Some(data.account);
        self.owner = Some(data.owner);
        self.coinhouse = Some(data.coinhouse);
        self.opened_at = Some(data.meta.occurred_at);
        self.last_accessed_at = Some(data.meta.occurred_at);
    }

    fn apply_gold_deposited(&mut self, data: GoldDeposited) {
        self.debit = self.debit.saturating_add(data.amount);
        self.record(data.transaction);
    }

    fn apply_gold_withdrawn(&mut self, data: GoldWithdrawn) {
        self.credit = self.credit.saturating_add(data.amount);
        self.record(data.transaction);
    }

    fn apply_gold_transferred(&mut self, data: GoldTransferred) {
        // The same event is applied to both sides of the transfer.
        if self.id == Some(data.from) {
            self.credit = self.credit.saturating_add(data.amount);
        }
        if self.id == Some(data.to) {
            self.debit = self.debit.saturating_add(data.amount);
        }
        self.record(data.transaction);
    }

    fn record(&mut self, transaction: Transaction) {
        self.last_accessed_at = Some(transaction.recorded_at);
        self.transactions.push(transaction);
    }
}
