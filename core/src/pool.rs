use std::sync::Arc;

use tokio::sync::{Semaphore, TryAcquireError};

/// Thin wrapper over a `tokio::sync::Semaphore` exposing only the
/// non-blocking operations the Coordinator needs: try-acquire a slot, and
/// release it when the task finishes. Holding a permit guard keeps the slot
/// reserved for the lifetime of the execution.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

pub struct PoolPermit {
    #[allow(dead_code)]
    permit: tokio::sync::OwnedSemaphorePermit,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Non-blocking: returns `None` immediately if the pool is at capacity,
    /// rather than waiting - the Coordinator's scheduling loop polls instead
    /// of blocking a worker on pool exhaustion.
    pub fn try_acquire(&self) -> Option<PoolPermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(PoolPermit { permit }),
            Err(TryAcquireError::NoPermits) => None,
            Err(TryAcquireError::Closed) => None,
        }
    }

    /// Waits for a slot instead of failing immediately - used by roles
    /// (Reviewer, Fixer) that must eventually run rather than be skipped
    /// when the pool is momentarily full.
    pub async fn acquire(&self) -> PoolPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore is never closed");
        PoolPermit { permit }
    }
}

/// One bounded pool per role (§5), matching the spec's three worker pools.
#[derive(Clone)]
pub struct PoolSet {
    pub executors: WorkerPool,
    pub reviewers: WorkerPool,
    pub fixers: WorkerPool,
}

impl PoolSet {
    pub fn new(config: &forgelet_config::PoolsConfig) -> Self {
        Self {
            executors: WorkerPool::new(config.executors),
            reviewers: WorkerPool::new(config.reviewers),
            fixers: WorkerPool::new(config.fixers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_capacity() {
        let pool = WorkerPool::new(2);
        let first = pool.try_acquire();
        let second = pool.try_acquire();
        let third = pool.try_acquire();
        assert!(first.is_some());
        assert!(second.is_some());
        assert!(third.is_none());
    }

    #[test]
    fn releasing_a_permit_frees_a_slot() {
        let pool = WorkerPool::new(1);
        let permit = pool.try_acquire().unwrap();
        assert!(pool.try_acquire().is_none());
        drop(permit);
        assert!(pool.try_acquire().is_some());
    }
}
