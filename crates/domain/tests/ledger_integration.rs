//! Integration tests for coinhouse ledger accounts.
//!
//! These tests drive the ledger through the dispatcher the way adapters do,
//! and check balances, transaction history and published events.

mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{AccountId, Classify, CoinhouseId, ErrorKind, PersonaId};
use dispatch::{DispatchError, Dispatcher};
use domain::ledger::{
    AccountOpened, Deposit, FindAccount, GetBalance, GetTransactions, GoldDeposited,
    GoldTransferred, GoldWithdrawn, OpenAccount, Transfer, TransactionKind, Withdraw,
};
use domain::{DomainError, Gold, LedgerAccount, LedgerError, LedgerService};
use repository::InMemoryRepository;
use support::{FlakyRepository, Recorder, ShortBatchRepository};

/// Helper to build a dispatcher with the ledger and a recorder for every
/// ledger event.
fn create_dispatcher() -> (Dispatcher, Recorder) {
    let service = LedgerService::new(Arc::new(InMemoryRepository::<LedgerAccount>::new()));
    dispatcher_for(service)
}

fn dispatcher_for(service: LedgerService) -> (Dispatcher, Recorder) {
    let recorder = Recorder::default();
    let mut builder = Dispatcher::builder();
    service.register(&mut builder).unwrap();
    builder
        .event::<AccountOpened, _>(recorder.clone())
        .event::<GoldDeposited, _>(recorder.clone())
        .event::<GoldWithdrawn, _>(recorder.clone())
        .event::<GoldTransferred, _>(recorder.clone());
    (builder.build(), recorder)
}

async fn open(dispatcher: &Dispatcher, persona: PersonaId, coinhouse: CoinhouseId) -> AccountId {
    let cmd = OpenAccount::new(persona, coinhouse);
    let account = cmd.account_id();
    dispatcher.dispatch(cmd).await.unwrap();
    account
}

async fn balance(dispatcher: &Dispatcher, account: AccountId) -> Gold {
    dispatcher
        .query(GetBalance::new(account))
        .await
        .unwrap()
        .expect("account exists")
}

mod ledger_scenario {
    use super::*;

    #[tokio::test]
    async fn open_deposit_transfer() {
        let (dispatcher, recorder) = create_dispatcher();
        let coinhouse = CoinhouseId::new();
        let p1 = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let p2 = open(&dispatcher, PersonaId::new(), coinhouse).await;

        dispatcher.dispatch(Deposit::new(p1, 100)).await.unwrap();
        dispatcher.dispatch(Transfer::new(p1, p2, 40)).await.unwrap();

        assert_eq!(balance(&dispatcher, p1).await, Gold::new(60));
        assert_eq!(balance(&dispatcher, p2).await, Gold::new(40));

        let history = dispatcher
            .query(GetTransactions::new(p1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Deposit);
        assert_eq!(history[1].kind, TransactionKind::Transfer);

        dispatcher.drain().await;
        assert_eq!(recorder.count("AccountOpened"), 2);
        assert_eq!(recorder.count("GoldDeposited"), 1);
        assert_eq!(recorder.count("GoldTransferred"), 1);
    }

    #[tokio::test]
    async fn find_account_by_holder() {
        let (dispatcher, _) = create_dispatcher();
        let persona = PersonaId::new();
        let coinhouse = CoinhouseId::new();
        let account = open(&dispatcher, persona, coinhouse).await;

        let found = dispatcher
            .query(FindAccount::new(persona, coinhouse))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.balance(), Gold::zero());
        assert_eq!(found.owner(), Some(persona));

        let elsewhere = dispatcher
            .query(FindAccount::new(persona, CoinhouseId::new()))
            .await
            .unwrap();
        assert!(elsewhere.is_none());
        assert_eq!(account, AccountId::for_holder(persona, coinhouse));
    }

    #[tokio::test]
    async fn opening_twice_is_a_conflict() {
        let (dispatcher, _) = create_dispatcher();
        let persona = PersonaId::new();
        let coinhouse = CoinhouseId::new();
        open(&dispatcher, persona, coinhouse).await;

        let err = dispatcher
            .dispatch(OpenAccount::new(persona, coinhouse))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn balance_of_missing_account_is_none() {
        let (dispatcher, _) = create_dispatcher();
        let result = dispatcher.query(GetBalance::new(AccountId::new())).await;
        assert!(matches!(result, Ok(None)));
    }
}

mod money_rules {
    use super::*;

    #[tokio::test]
    async fn zero_deposit_is_a_validation_error() {
        let (dispatcher, _) = create_dispatcher();
        let account = open(&dispatcher, PersonaId::new(), CoinhouseId::new()).await;

        let err = dispatcher.dispatch(Deposit::new(account, 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn overdraw_leaves_balance_unchanged() {
        let (dispatcher, recorder) = create_dispatcher();
        let account = open(&dispatcher, PersonaId::new(), CoinhouseId::new()).await;
        dispatcher.dispatch(Deposit::new(account, 30)).await.unwrap();

        let err = dispatcher
            .dispatch(Withdraw::new(account, 31))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Rejected(DomainError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(balance(&dispatcher, account).await, Gold::new(30));

        dispatcher.drain().await;
        assert_eq!(recorder.count("GoldWithdrawn"), 0);
    }

    #[tokio::test]
    async fn balance_matches_history() {
        let (dispatcher, _) = create_dispatcher();
        let coinhouse = CoinhouseId::new();
        let a = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let b = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let c = open(&dispatcher, PersonaId::new(), coinhouse).await;

        dispatcher.dispatch(Deposit::new(a, 500)).await.unwrap();
        dispatcher.dispatch(Deposit::new(b, 80)).await.unwrap();
        dispatcher.dispatch(Transfer::new(a, b, 120)).await.unwrap();
        dispatcher.dispatch(Withdraw::new(b, 50)).await.unwrap();
        dispatcher.dispatch(Transfer::new(b, c, 75)).await.unwrap();
        dispatcher.dispatch(Transfer::new(c, a, 5)).await.unwrap();
        dispatcher.dispatch(Withdraw::new(a, 200)).await.unwrap();
        // Rejected operations must not leave a trace.
        assert!(dispatcher.dispatch(Transfer::new(c, b, 1_000)).await.is_err());
        assert!(dispatcher.dispatch(Withdraw::new(b, 1_000)).await.is_err());

        let mut total = 0;
        for account in [a, b, c] {
            let history = dispatcher
                .query(GetTransactions::new(account))
                .await
                .unwrap()
                .unwrap();
            let from_history: i128 = history.iter().map(|tx| tx.net_effect_on(account)).sum();
            let current = balance(&dispatcher, account).await;

            assert_eq!(from_history, i128::from(current.amount()));
            total += current.amount();
        }

        // Deposits minus withdrawals; transfers move gold without creating it.
        assert_eq!(total, 500 + 80 - 50 - 200);
    }
}

mod transfers {
    use super::*;

    #[tokio::test]
    async fn failed_transfer_changes_neither_account() {
        let (dispatcher, recorder) = create_dispatcher();
        let coinhouse = CoinhouseId::new();
        let from = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let to = open(&dispatcher, PersonaId::new(), coinhouse).await;
        dispatcher.dispatch(Deposit::new(from, 10)).await.unwrap();

        let err = dispatcher
            .dispatch(Transfer::new(from, to, 11))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(balance(&dispatcher, from).await, Gold::new(10));
        assert_eq!(balance(&dispatcher, to).await, Gold::zero());
        dispatcher.drain().await;
        assert_eq!(recorder.count("GoldTransferred"), 0);
    }

    #[tokio::test]
    async fn transfer_to_missing_account_is_not_found() {
        let (dispatcher, _) = create_dispatcher();
        let from = open(&dispatcher, PersonaId::new(), CoinhouseId::new()).await;
        dispatcher.dispatch(Deposit::new(from, 10)).await.unwrap();

        let err = dispatcher
            .dispatch(Transfer::new(from, AccountId::new(), 5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(balance(&dispatcher, from).await, Gold::new(10));
    }

    #[tokio::test]
    async fn transfer_to_self_is_rejected() {
        let (dispatcher, _) = create_dispatcher();
        let account = open(&dispatcher, PersonaId::new(), CoinhouseId::new()).await;
        dispatcher.dispatch(Deposit::new(account, 10)).await.unwrap();

        let err = dispatcher
            .dispatch(Transfer::new(account, account, 5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(balance(&dispatcher, account).await, Gold::new(10));
    }

    #[tokio::test]
    async fn storage_failure_commits_nothing() {
        let (repository, failing) = FlakyRepository::<LedgerAccount>::new();
        let (dispatcher, recorder) = dispatcher_for(LedgerService::new(Arc::new(repository)));
        let coinhouse = CoinhouseId::new();
        let from = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let to = open(&dispatcher, PersonaId::new(), coinhouse).await;
        dispatcher.dispatch(Deposit::new(from, 100)).await.unwrap();

        failing.store(true, Ordering::SeqCst);
        let err = dispatcher
            .dispatch(Transfer::new(from, to, 40))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        failing.store(false, Ordering::SeqCst);

        assert_eq!(balance(&dispatcher, from).await, Gold::new(100));
        assert_eq!(balance(&dispatcher, to).await, Gold::zero());

        // The same transfer succeeds once the store is back.
        dispatcher.dispatch(Transfer::new(from, to, 40)).await.unwrap();
        assert_eq!(balance(&dispatcher, to).await, Gold::new(40));

        dispatcher.drain().await;
        assert_eq!(recorder.count("GoldTransferred"), 1);
    }

    #[tokio::test]
    async fn short_batch_save_is_an_infrastructure_error() {
        let repository = ShortBatchRepository::<LedgerAccount>::new();
        let (dispatcher, recorder) = dispatcher_for(LedgerService::new(Arc::new(repository)));
        let coinhouse = CoinhouseId::new();
        let from = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let to = open(&dispatcher, PersonaId::new(), coinhouse).await;
        dispatcher.dispatch(Deposit::new(from, 100)).await.unwrap();

        let err = dispatcher
            .dispatch(Transfer::new(from, to, 40))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);

        dispatcher.drain().await;
        assert_eq!(recorder.count("GoldTransferred"), 0);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deposits_are_serialized() {
        let (dispatcher, _) = create_dispatcher();
        let account = open(&dispatcher, PersonaId::new(), CoinhouseId::new()).await;

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.dispatch(Deposit::new(account, 1)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(balance(&dispatcher, account).await, Gold::new(100));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reverse_transfers_do_not_deadlock() {
        let (dispatcher, _) = create_dispatcher();
        let coinhouse = CoinhouseId::new();
        let a = open(&dispatcher, PersonaId::new(), coinhouse).await;
        let b = open(&dispatcher, PersonaId::new(), coinhouse).await;
        dispatcher.dispatch(Deposit::new(a, 100)).await.unwrap();
        dispatcher.dispatch(Deposit::new(b, 100)).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .flat_map(|_| [(a, b), (b, a)])
            .map(|(from, to)| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.dispatch(Transfer::new(from, to, 1)).await })
            })
            .collect();

        let all = async {
            for task in tasks {
                task.await.unwrap().unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(10), all)
            .await
            .expect("transfers finished");

        assert_eq!(balance(&dispatcher, a).await, Gold::new(100));
        assert_eq!(balance(&dispatcher, b).await, Gold::new(100));
    }
}
