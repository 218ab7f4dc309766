//! The cache-aside coordinator.
//!
//! `TaskService` owns the consistency policy between the durable store and
//! the side cache. The asymmetry is deliberate and load-bearing: store
//! failures fail the request, cache failures are logged and recovered
//! locally wherever they occur on a non-critical path (populate-after-miss,
//! invalidate-after-mutate). Store mutation always precedes cache
//! invalidation, which bounds staleness to the TTL plus a sub-request race
//! window.

use std::sync::Arc;

use tracing::warn;

use crate::application::error::TaskError;
use crate::application::repos::{CacheError, TaskCache, TaskStore};
use crate::domain::task::Task;

const TARGET: &str = "compito::tasks";

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    cache: Arc<dyn TaskCache>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, cache: Arc<dyn TaskCache>) -> Self {
        Self { store, cache }
    }

    /// Create writes the store only. The cache is never pre-populated: a
    /// concurrent duplicate create could be rejected after we cached, and a
    /// fresh id cannot have a live entry anyway.
    pub async fn create(&self, task: Task) -> Result<Task, TaskError> {
        self.store.add_task(&task).await?;
        Ok(task)
    }

    /// Read-through with degrade-to-miss: any cache error, connection
    /// failures included, is logged and treated as if the entry expired.
    /// Read availability wins over cache correctness here.
    pub async fn get(&self, id: i64) -> Result<Task, TaskError> {
        match self.cache.get(id).await {
            Ok(task) => return Ok(task),
            Err(CacheError::NotFound) => {}
            Err(err) => {
                warn!(target: TARGET, task_id = id, error = %err, "cache read failed, treating as miss");
            }
        }

        let task = self.store.get_task(id).await?;

        // Best-effort populate. A lost race with a concurrent populate shows
        // up as AlreadyCached and is swallowed like any other cache fault.
        if let Err(err) = self.cache.set(&task).await {
            warn!(target: TARGET, task_id = id, error = %err, "cache populate failed");
        }

        Ok(task)
    }

    /// The collection read bypasses the cache entirely: a collection-valued
    /// key would need invalidation fan-out from every single-record mutation.
    pub async fn get_all(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.get_all_tasks().await?)
    }

    /// Store first, then evict. The caller gets the row as persisted, not
    /// the payload it sent.
    pub async fn update(&self, task: Task) -> Result<Task, TaskError> {
        let updated = self.store.update_task(&task).await?;
        self.evict(task.id).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TaskError> {
        self.store.delete_task(id).await?;
        self.evict(id).await;
        Ok(())
    }

    /// Best-effort cache invalidation after a store mutation succeeded.
    /// NotFound just means nothing was cached; either way the mutation
    /// response is already decided.
    async fn evict(&self, id: i64) {
        match self.cache.delete(id).await {
            Ok(()) | Err(CacheError::NotFound) => {}
            Err(err) => {
                warn!(target: TARGET, task_id = id, error = %err, "cache eviction failed");
            }
        }
    }
}
