use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;

use crate::{RepositoryError, Result, Version};

/// An aggregate that can be stored by a [`Repository`].
///
/// The version is the one the aggregate was loaded at; a save succeeds only
/// if the stored version still matches it.
pub trait Versioned: Clone + Send + Sync + 'static {
    /// Identity type of the aggregate.
    type Id: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static;

    /// Returns the aggregate type name, used in errors and metrics.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<Self::Id>;

    /// Returns the version the aggregate was loaded or last saved at.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    fn set_version(&mut self, version: Version);
}

/// Persistence boundary for one aggregate type.
///
/// Implementations must be thread-safe. Every save is version-checked:
/// a mismatch fails with [`RepositoryError::ConcurrencyConflict`] and
/// leaves the stored state untouched.
#[async_trait]
pub trait Repository<A: Versioned>: Send + Sync {
    /// Loads an aggregate by id, returning None if it doesn't exist.
    async fn load(&self, id: &A::Id) -> Result<Option<A>>;

    /// Saves an aggregate and returns its new version.
    async fn save(&self, aggregate: &A) -> Result<Version>;

    /// Saves several aggregates atomically: either every one is stored or
    /// none is. Versions are returned in input order.
    async fn save_all(&self, aggregates: &[A]) -> Result<Vec<Version>>;

    /// Deletes an aggregate. Fails with `NotFound` if it doesn't exist.
    async fn delete(&self, id: &A::Id) -> Result<()>;

    /// Deletes several aggregates atomically: either every one is removed or
    /// none is. Fails with `NotFound` if any of them doesn't exist.
    async fn delete_all(&self, ids: &[A::Id]) -> Result<()>;

    /// Returns every stored aggregate matching the predicate, ordered by id.
    async fn find_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a A) -> bool + Send + Sync),
    ) -> Result<Vec<A>>;

    /// Flushes buffered writes to durable storage. Called once at shutdown.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Extension trait providing convenience methods for repositories.
#[async_trait]
pub trait RepositoryExt<A: Versioned>: Repository<A> {
    /// Checks if an aggregate exists.
    async fn exists(&self, id: &A::Id) -> Result<bool> {
        Ok(self.load(id).await?.is_some())
    }

    /// Loads an aggregate, failing with `NotFound` if it doesn't exist.
    async fn load_required(&self, id: &A::Id) -> Result<A> {
        self.load(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                aggregate_type: A::aggregate_type(),
                id: id.to_string(),
            })
    }
}

// Blanket implementation for all Repository implementations
impl<A: Versioned, T: Repository<A> + ?Sized> RepositoryExt<A> for T {}

/// Returns the identity of an aggregate about to be stored.
pub fn identity_of<A: Versioned>(aggregate: &A) -> Result<A::Id> {
    aggregate.id().ok_or(RepositoryError::MissingIdentity {
        aggregate_type: A::aggregate_type(),
    })
}

/// Validates a batch before an atomic save.
///
/// Each aggregate may appear once; saving the same id twice in one batch
/// would make the second version check meaningless.
pub fn validate_batch<A: Versioned>(aggregates: &[A]) -> Result<Vec<A::Id>> {
    let mut ids = Vec::with_capacity(aggregates.len());
    for aggregate in aggregates {
        let id = identity_of(aggregate)?;
        if ids.contains(&id) {
            return Err(RepositoryError::Infrastructure(format!(
                "{} {} appears more than once in a batch save",
                A::aggregate_type(),
                id
            )));
        }
        ids.push(id);
    }
    Ok(ids)
}
