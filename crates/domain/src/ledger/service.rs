//! Ledger service: command and query handlers for coinhouse accounts.

use async_trait::async_trait;
use common::AccountId;
use dispatch::{CommandHandler, DispatcherBuilder, Outcome, QueryHandler, RegistrationError};

use crate::error::DomainError;
use crate::executor::{CommandExecutor, CommandResult, PairResult, SharedRepository};

use super::{
    Deposit, FindAccount, GetAccount, GetBalance, GetTransactions, Gold, LedgerAccount,
    LedgerEvent, OpenAccount, Transaction, Transfer, Withdraw,
};

/// Service for managing ledger accounts.
///
/// Cloning is cheap; clones share the repository and the lock table.
#[derive(Clone)]
pub struct LedgerService {
    accounts: CommandExecutor<LedgerAccount>,
}

impl LedgerService {
    /// Creates a new ledger service over the given account repository.
    pub fn new(repository: SharedRepository<LedgerAccount>) -> Self {
        Self {
            accounts: CommandExecutor::new(repository),
        }
    }

    /// Registers every ledger command and query handler.
    pub fn register(&self, builder: &mut DispatcherBuilder) -> Result<(), RegistrationError> {
        builder
            .command::<OpenAccount, _>(self.clone())?
            .command::<Deposit, _>(self.clone())?
            .command::<Withdraw, _>(self.clone())?
            .command::<Transfer, _>(self.clone())?
            .query::<GetBalance, _>(self.clone())?
            .query::<GetAccount, _>(self.clone())?
            .query::<GetTransactions, _>(self.clone())?
            .query::<FindAccount, _>(self.clone())?;
        Ok(())
    }

    /// Opens an account; the id is derived from persona and coinhouse.
    #[tracing::instrument(skip(self))]
    pub async fn open_account(
        &self,
        cmd: OpenAccount,
    ) -> Result<CommandResult<LedgerAccount>, DomainError> {
        let account_id = cmd.account_id();

        self.accounts
            .upsert(&account_id, |account| {
                account.open(account_id, cmd.persona, cmd.coinhouse)
            })
            .await
    }

    /// Deposits gold into an account.
    #[tracing::instrument(skip(self))]
    pub async fn deposit(&self, cmd: Deposit) -> Result<CommandResult<LedgerAccount>, DomainError> {
        let Deposit {
            account,
            amount,
            memo,
        } = cmd;

        let result = self
            .accounts
            .execute(&account, |ledger| ledger.deposit(amount, memo))
            .await?;

        metrics::counter!("ledger_gold_moved_total", "kind" => "deposit").increment(amount.amount());
        Ok(result)
    }

    /// Withdraws gold from an account.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw(&self, cmd: Withdraw) -> Result<CommandResult<LedgerAccount>, DomainError> {
        let Withdraw {
            account,
            amount,
            memo,
        } = cmd;

        let result = self
            .accounts
            .execute(&account, |ledger| ledger.withdraw(amount, memo))
            .await?;

        metrics::counter!("ledger_gold_moved_total", "kind" => "withdrawal")
            .increment(amount.amount());
        Ok(result)
    }

    /// Moves gold between two accounts atomically.
    #[tracing::instrument(skip(self))]
    pub async fn transfer(&self, cmd: Transfer) -> Result<PairResult<LedgerAccount>, DomainError> {
        let Transfer {
            from,
            to,
            amount,
            memo,
        } = cmd;

        let result = self
            .accounts
            .execute_pair(&from, &to, |source, destination| {
                LedgerAccount::transfer(source, destination, amount, memo)
            })
            .await?;

        metrics::counter!("ledger_gold_moved_total", "kind" => "transfer")
            .increment(amount.amount());
        Ok(result)
    }

    /// Loads an account.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(&self, account: AccountId) -> Result<Option<LedgerAccount>, DomainError> {
        self.accounts.load(&account).await
    }

    /// Returns the balance of an account.
    pub async fn get_balance(&self, account: AccountId) -> Result<Option<Gold>, DomainError> {
        Ok(self
            .get_account(account)
            .await?
            .map(|ledger| ledger.balance()))
    }

    /// Returns the transaction history of an account, oldest first.
    pub async fn get_transactions(
        &self,
        account: AccountId,
    ) -> Result<Option<Vec<Transaction>>, DomainError> {
        Ok(self
            .get_account(account)
            .await?
            .map(|ledger| ledger.transactions().to_vec()))
    }
}

fn raised(events: Vec<LedgerEvent>) -> Outcome {
    Outcome::with_events(events.into_iter().map(LedgerEvent::into_raised).collect())
}

#[async_trait]
impl CommandHandler<OpenAccount> for LedgerService {
    async fn handle(&self, command: OpenAccount) -> Result<Outcome, DomainError> {
        Ok(raised(self.open_account(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<Deposit> for LedgerService {
    async fn handle(&self, command: Deposit) -> Result<Outcome, DomainError> {
        Ok(raised(self.deposit(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<Withdraw> for LedgerService {
    async fn handle(&self, command: Withdraw) -> Result<Outcome, DomainError> {
        Ok(raised(self.withdraw(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<Transfer> for LedgerService {
    async fn handle(&self, command: Transfer) -> Result<Outcome, DomainError> {
        Ok(raised(self.transfer(command).await?.events))
    }
}

#[async_trait]
impl QueryHandler<GetBalance> for LedgerService {
    async fn handle(&self, query: GetBalance) -> Result<Option<Gold>, DomainError> {
        self.get_balance(query.account).await
    }
}

#[async_trait]
impl QueryHandler<GetAccount> for LedgerService {
    async fn handle(&self, query: GetAccount) -> Result<Option<LedgerAccount>, DomainError> {
        self.get_account(query.account).await
    }
}

#[async_trait]
impl QueryHandler<GetTransactions> for LedgerService {
    async fn handle(&self, query: GetTransactions) -> Result<Option<Vec<Transaction>>, DomainError> {
        self.get_transactions(query.account).await
    }
}

#[async_trait]
impl QueryHandler<FindAccount> for LedgerService {
    async fn handle(&self, query: FindAccount) -> Result<Option<LedgerAccount>, DomainError> {
        self.get_account(AccountId::for_holder(query.persona, query.coinhouse))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{CoinhouseId, Classify, ErrorKind, PersonaId};
    use repository::InMemoryRepository;

    use super::*;
    use crate::ledger::LedgerError;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(InMemoryRepository::<LedgerAccount>::new()))
    }

    async fn open(service: &LedgerService) -> AccountId {
        let cmd = OpenAccount::new(PersonaId::new(), CoinhouseId::new());
        let id = cmd.account_id();
        service.open_account(cmd).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_open_account_twice_conflicts() {
        let service = service();
        let cmd = OpenAccount::new(PersonaId::new(), CoinhouseId::new());

        service.open_account(cmd.clone()).await.unwrap();
        let err = service.open_account(cmd).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Ledger(LedgerError::AccountAlreadyOpen { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw_persist() {
        let service = service();
        let account = open(&service).await;

        service.deposit(Deposit::new(account, 100)).await.unwrap();
        let result = service.withdraw(Withdraw::new(account, 25)).await.unwrap();
        assert_eq!(result.aggregate.balance(), Gold::new(75));

        assert_eq!(service.get_balance(account).await.unwrap(), Some(Gold::new(75)));
        assert_eq!(service.get_transactions(account).await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deposit_to_missing_account_is_not_found() {
        let service = service();
        let err = service
            .deposit(Deposit::new(AccountId::new(), 10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rejected_withdraw_leaves_balance() {
        let service = service();
        let account = open(&service).await;
        service.deposit(Deposit::new(account, 10)).await.unwrap();

        let err = service.withdraw(Withdraw::new(account, 11)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(service.get_balance(account).await.unwrap(), Some(Gold::new(10)));
    }

    #[tokio::test]
    async fn test_transfer_updates_both_accounts() {
        let service = service();
        let from = open(&service).await;
        let to = open(&service).await;
        service.deposit(Deposit::new(from, 100)).await.unwrap();

        let result = service.transfer(Transfer::new(from, to, 40)).await.unwrap();
        assert_eq!(result.events.len(), 1);

        assert_eq!(service.get_balance(from).await.unwrap(), Some(Gold::new(60)));
        assert_eq!(service.get_balance(to).await.unwrap(), Some(Gold::new(40)));
    }

    #[tokio::test]
    async fn test_queries_on_missing_account_return_none() {
        let service = service();
        let missing = AccountId::new();
        assert!(service.get_account(missing).await.unwrap().is_none());
        assert!(service.get_balance(missing).await.unwrap().is_none());
        assert!(service.get_transactions(missing).await.unwrap().is_none());
    }
}
