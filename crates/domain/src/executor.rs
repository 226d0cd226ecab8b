//! Load-lock-mutate-save execution of commands against aggregates.

use std::sync::Arc;

use repository::{Repository, RepositoryError, Version, Versioned};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::locks::InstanceLocks;

/// Shared handle to the repository of one aggregate type.
pub type SharedRepository<A> = Arc<dyn Repository<A>>;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and applied.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Result of a command applied to two aggregates at once.
#[derive(Debug)]
pub struct PairResult<A: Aggregate> {
    /// The first aggregate, as passed to the command.
    pub first: A,

    /// The second aggregate, as passed to the command.
    pub second: A,

    /// The events applied to both aggregates.
    pub events: Vec<A::Event>,
}

/// Result of a command that ended an aggregate's life.
///
/// The aggregate has been deleted, so it has no stored version; `aggregate`
/// is its final state with the events applied.
#[derive(Debug)]
pub struct Removal<A: Aggregate> {
    /// The aggregate as it was when deleted.
    pub aggregate: A,

    /// The events that were generated and applied before deletion.
    pub events: Vec<A::Event>,
}

/// Executes commands against aggregates of one type.
///
/// Each execution holds the instance lock for the whole load-mutate-save
/// cycle, and the repository re-checks the version on save. Events are
/// applied to the loaded copy only; if the save fails the copy is dropped
/// and nothing is committed.
pub struct CommandExecutor<A: Aggregate> {
    repository: SharedRepository<A>,
    locks: InstanceLocks<A::Id>,
}

impl<A: Aggregate> Clone for CommandExecutor<A> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            locks: self.locks.clone(),
        }
    }
}

impl<A: Aggregate> CommandExecutor<A> {
    /// Creates a new executor over the given repository.
    pub fn new(repository: SharedRepository<A>) -> Self {
        Self {
            repository,
            locks: InstanceLocks::new(),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &SharedRepository<A> {
        &self.repository
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load(&self, id: &A::Id) -> Result<Option<A>, DomainError> {
        Ok(self.repository.load(id).await?)
    }

    /// Loads an aggregate, failing with `AggregateNotFound` if it doesn't exist.
    pub async fn load_existing(&self, id: &A::Id) -> Result<A, DomainError> {
        self.load(id).await?.ok_or_else(|| not_found::<A>(id))
    }

    /// Executes a command against an existing aggregate.
    ///
    /// Fails with `AggregateNotFound` if the aggregate doesn't exist.
    pub async fn execute<F>(&self, id: &A::Id, command_fn: F) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.lock(id).await;
        let aggregate = self.load_existing(id).await?;
        self.commit(aggregate, command_fn).await
    }

    /// Executes a command against an aggregate that may not exist yet.
    ///
    /// A missing aggregate is passed to the command as `A::default()`; the
    /// command decides whether that is acceptable.
    pub async fn upsert<F>(&self, id: &A::Id, command_fn: F) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.lock(id).await;
        let aggregate = self.load(id).await?.unwrap_or_default();
        self.commit(aggregate, command_fn).await
    }

    /// Executes one command against two existing aggregates atomically.
    ///
    /// Both instance locks are taken in ascending id order. The events are
    /// applied to both aggregates and both are persisted in one atomic
    /// save: either both change or neither does.
    pub async fn execute_pair<F>(
        &self,
        first: &A::Id,
        second: &A::Id,
        command_fn: F,
    ) -> Result<PairResult<A>, DomainError>
    where
        F: FnOnce(&A, &A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.lock_pair(first, second).await;
        let mut first = self.load_existing(first).await?;
        let mut second = self.load_existing(second).await?;

        let events = command_fn(&first, &second)?;
        if events.is_empty() {
            return Ok(PairResult {
                first,
                second,
                events,
            });
        }

        first.apply_events(events.iter().cloned());
        second.apply_events(events.iter().cloned());

        let versions = self
            .repository
            .save_all(&[first.clone(), second.clone()])
            .await?;
        let &[first_version, second_version] = versions.as_slice() else {
            return Err(RepositoryError::Infrastructure(format!(
                "batch save of 2 {} returned {} versions",
                A::aggregate_type(),
                versions.len()
            ))
            .into());
        };
        first.set_version(first_version);
        second.set_version(second_version);

        Ok(PairResult {
            first,
            second,
            events,
        })
    }

    /// Executes a command that ends the aggregate's life, then deletes it.
    ///
    /// Returns `Ok(None)` if the aggregate is already gone. If the delete
    /// fails the aggregate stays stored and no events are returned.
    pub async fn remove<F>(&self, id: &A::Id, command_fn: F) -> Result<Option<Removal<A>>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.lock(id).await;
        let Some(mut aggregate) = self.load(id).await? else {
            return Ok(None);
        };

        let events = command_fn(&aggregate)?;
        aggregate.apply_events(events.iter().cloned());

        match self.repository.delete(id).await {
            Ok(()) | Err(RepositoryError::NotFound { .. }) => {}
            Err(error) => return Err(error.into()),
        }

        Ok(Some(Removal { aggregate, events }))
    }

    /// Executes a life-ending command against several aggregates and
    /// deletes them in one atomic call.
    ///
    /// Every instance lock is taken in ascending id order. Ids that are
    /// already gone are skipped. The command runs against every aggregate
    /// before anything is deleted, so a rejection or a failed delete leaves
    /// all of them stored.
    pub async fn remove_all<F>(&self, ids: &[A::Id], command_fn: F) -> Result<Vec<Removal<A>>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guards = self.locks.lock_all(ids).await;

        let mut removals = Vec::with_capacity(ids.len());
        let mut present = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(mut aggregate) = self.load(id).await? else {
                continue;
            };
            let events = command_fn(&aggregate)?;
            aggregate.apply_events(events.iter().cloned());
            present.push(id.clone());
            removals.push(Removal { aggregate, events });
        }

        if !present.is_empty() {
            self.repository.delete_all(&present).await?;
        }
        Ok(removals)
    }

    /// Returns every aggregate matching the predicate.
    pub async fn find_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a A) -> bool + Send + Sync),
    ) -> Result<Vec<A>, DomainError> {
        Ok(self.repository.find_where(predicate).await?)
    }

    async fn commit<F>(&self, mut aggregate: A, command_fn: F) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let current_version = aggregate.version();

        // Execute command to get events
        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        aggregate.apply_events(events.iter().cloned());
        let new_version = self.repository.save(&aggregate).await?;
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }
}

fn not_found<A: Versioned>(id: &A::Id) -> DomainError {
    DomainError::AggregateNotFound {
        aggregate_type: A::aggregate_type(),
        aggregate_id: id.to_string(),
    }
}
