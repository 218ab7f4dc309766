//! Backend traits describing the durable store and the side cache.
//!
//! Every failure a backend can report falls into one of exactly two classes:
//! a business-rule outcome (`AlreadyExists`, `NotFound`, `AlreadyCached`) or
//! an infrastructure fault (`Unavailable`). Callers branch only on the
//! former; the coordinator decides per call site whether the latter is fatal.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::task::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task already exists")]
    AlreadyExists,
    #[error("task not found")]
    NotFound,
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("task not cached")]
    NotFound,
    #[error("task already cached")]
    AlreadyCached,
    #[error("cache unavailable: {message}")]
    Unavailable { message: String },
}

impl CacheError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}

/// Authoritative task storage.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task, failing with `AlreadyExists` if the id is taken. The
    /// duplicate check must be atomic with the insert.
    async fn add_task(&self, task: &Task) -> Result<(), StoreError>;

    async fn get_task(&self, id: i64) -> Result<Task, StoreError>;

    /// All tasks in store-native order. Callers must not depend on ordering.
    async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Full replace of name and description. Returns the row as persisted,
    /// not an echo of the input.
    async fn update_task(&self, task: &Task) -> Result<Task, StoreError>;

    async fn delete_task(&self, id: i64) -> Result<(), StoreError>;
}

/// Volatile task cache with a fixed entry TTL. Strictly derived state: its
/// whole contents can be lost without affecting correctness.
#[async_trait]
pub trait TaskCache: Send + Sync {
    async fn get(&self, id: i64) -> Result<Task, CacheError>;

    /// Atomic set-if-absent; `AlreadyCached` when an entry for the id is
    /// still live. Entries expire unconditionally after the configured TTL.
    async fn set(&self, task: &Task) -> Result<(), CacheError>;

    async fn delete(&self, id: i64) -> Result<(), CacheError>;
}
