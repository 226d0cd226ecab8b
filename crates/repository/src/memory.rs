use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    RepositoryError, Result, Version,
    store::{Repository, Versioned, identity_of, validate_batch},
};

/// In-memory repository.
///
/// Constructed explicitly at start-up and shared by cloning; clones see the
/// same records. Used by the server and by tests.
pub struct InMemoryRepository<A: Versioned> {
    records: Arc<RwLock<HashMap<A::Id, A>>>,
}

impl<A: Versioned> Clone for InMemoryRepository<A> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<A: Versioned> Default for InMemoryRepository<A> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<A: Versioned> InMemoryRepository<A> {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored aggregates.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Removes every stored aggregate.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn check_version<A: Versioned>(
    records: &HashMap<A::Id, A>,
    id: &A::Id,
    aggregate: &A,
) -> Result<()> {
    let actual = records
        .get(id)
        .map(|stored| stored.version())
        .unwrap_or(Version::initial());

    if actual != aggregate.version() {
        return Err(RepositoryError::ConcurrencyConflict {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
            expected: aggregate.version(),
            actual,
        });
    }
    Ok(())
}

fn stored_copy<A: Versioned>(aggregate: &A) -> (A, Version) {
    let next = aggregate.version().next();
    let mut stored = aggregate.clone();
    stored.set_version(next);
    (stored, next)
}

#[async_trait]
impl<A: Versioned> Repository<A> for InMemoryRepository<A> {
    async fn load(&self, id: &A::Id) -> Result<Option<A>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn save(&self, aggregate: &A) -> Result<Version> {
        let id = identity_of(aggregate)?;
        let mut records = self.records.write().await;

        check_version(&records, &id, aggregate)?;

        let (stored, next) = stored_copy(aggregate);
        records.insert(id, stored);
        Ok(next)
    }

    async fn save_all(&self, aggregates: &[A]) -> Result<Vec<Version>> {
        let ids = validate_batch(aggregates)?;
        let mut records = self.records.write().await;

        // Check every version before touching anything
        for (id, aggregate) in ids.iter().zip(aggregates) {
            check_version(&records, id, aggregate)?;
        }

        let mut versions = Vec::with_capacity(aggregates.len());
        for (id, aggregate) in ids.into_iter().zip(aggregates) {
            let (stored, next) = stored_copy(aggregate);
            records.insert(id, stored);
            versions.push(next);
        }
        Ok(versions)
    }

    async fn delete(&self, id: &A::Id) -> Result<()> {
        match self.records.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound {
                aggregate_type: A::aggregate_type(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete_all(&self, ids: &[A::Id]) -> Result<()> {
        let mut records = self.records.write().await;

        if let Some(missing) = ids.iter().find(|id| !records.contains_key(*id)) {
            return Err(RepositoryError::NotFound {
                aggregate_type: A::aggregate_type(),
                id: missing.to_string(),
            });
        }

        for id in ids {
            records.remove(id);
        }
        Ok(())
    }

    async fn find_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a A) -> bool + Send + Sync),
    ) -> Result<Vec<A>> {
        let records = self.records.read().await;
        let mut found: Vec<(A::Id, A)> = records
            .iter()
            .filter(|(_, aggregate)| predicate(aggregate))
            .map(|(id, aggregate)| (id.clone(), aggregate.clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found.into_iter().map(|(_, aggregate)| aggregate).collect())
    }

    async fn flush(&self) -> Result<()> {
        let count = self.records.read().await.len();
        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            records = count,
            "in-memory repository flushed"
        );
        Ok(())
    }
}
