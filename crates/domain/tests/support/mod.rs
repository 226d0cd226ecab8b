//! Shared fixtures for the domain integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dispatch::{DomainEvent, EventHandler, EventHandlerError};
use repository::{InMemoryRepository, Repository, RepositoryError, Version, Versioned};

/// Records the type of every event it receives, in arrival order.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<&'static str> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.seen().iter().filter(|seen| **seen == event_type).count()
    }
}

#[async_trait]
impl<E: DomainEvent> EventHandler<E> for Recorder {
    async fn handle(&self, event: &E) -> Result<(), EventHandlerError> {
        self.seen.lock().unwrap().push(event.event_type());
        Ok(())
    }
}

/// In-memory repository whose writes can be switched to fail, or fail once
/// a number of writes has succeeded.
pub struct FlakyRepository<A: Versioned> {
    inner: InMemoryRepository<A>,
    failing: Arc<AtomicBool>,
    writes_left: Arc<AtomicUsize>,
}

impl<A: Versioned> FlakyRepository<A> {
    /// Returns the repository and the switch controlling its writes.
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let repository = Self {
            inner: InMemoryRepository::new(),
            failing: Arc::clone(&failing),
            writes_left: Arc::new(AtomicUsize::new(usize::MAX)),
        };
        (repository, failing)
    }

    /// Returns a repository that accepts `writes` writes (saves and
    /// deletes, batches counting once) and fails every one after that.
    pub fn failing_after(writes: usize) -> Self {
        let (repository, _) = Self::new();
        repository.writes_left.store(writes, Ordering::SeqCst);
        repository
    }

    /// Returns a handle on the records, bypassing the failure switch.
    pub fn records(&self) -> InMemoryRepository<A> {
        self.inner.clone()
    }

    fn check(&self) -> repository::Result<()> {
        let unavailable = || Err(RepositoryError::Infrastructure("store unavailable".into()));
        if self.failing.load(Ordering::SeqCst) {
            return unavailable();
        }
        match self
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        {
            Ok(_) => Ok(()),
            Err(_) => unavailable(),
        }
    }
}

#[async_trait]
impl<A: Versioned> Repository<A> for FlakyRepository<A> {
    async fn load(&self, id: &A::Id) -> repository::Result<Option<A>> {
        self.inner.load(id).await
    }

    async fn save(&self, aggregate: &A) -> repository::Result<Version> {
        self.check()?;
        self.inner.save(aggregate).await
    }

    async fn save_all(&self, aggregates: &[A]) -> repository::Result<Vec<Version>> {
        self.check()?;
        self.inner.save_all(aggregates).await
    }

    async fn delete(&self, id: &A::Id) -> repository::Result<()> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn delete_all(&self, ids: &[A::Id]) -> repository::Result<()> {
        self.check()?;
        self.inner.delete_all(ids).await
    }

    async fn find_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a A) -> bool + Send + Sync),
    ) -> repository::Result<Vec<A>> {
        self.inner.find_where(predicate).await
    }
}

/// In-memory repository whose batch saves report fewer versions than
/// aggregates were stored.
pub struct ShortBatchRepository<A: Versioned> {
    inner: InMemoryRepository<A>,
}

impl<A: Versioned> ShortBatchRepository<A> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
        }
    }
}

#[async_trait]
impl<A: Versioned> Repository<A> for ShortBatchRepository<A> {
    async fn load(&self, id: &A::Id) -> repository::Result<Option<A>> {
        self.inner.load(id).await
    }

    async fn save(&self, aggregate: &A) -> repository::Result<Version> {
        self.inner.save(aggregate).await
    }

    async fn save_all(&self, aggregates: &[A]) -> repository::Result<Vec<Version>> {
        let mut versions = self.inner.save_all(aggregates).await?;
        versions.truncate(1);
        Ok(versions)
    }

    async fn delete(&self, id: &A::Id) -> repository::Result<()> {
        self.inner.delete(id).await
    }

    async fn delete_all(&self, ids: &[A::Id]) -> repository::Result<()> {
        self.inner.delete_all(ids).await
    }

    async fn find_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a A) -> bool + Send + Sync),
    ) -> repository::Result<Vec<A>> {
        self.inner.find_where(predicate).await
    }
}
