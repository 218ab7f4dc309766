//! Redis-backed side cache.
//!
//! Entries are whole tasks serialized as JSON and written with `SET NX EX`,
//! so a populate is atomic, conflicts with a live entry, and carries the
//! fixed TTL in the same command. Reads never renew the TTL.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use crate::application::repos::{CacheError, TaskCache};
use crate::config::CacheSettings;
use crate::domain::task::Task;

fn task_key(id: i64) -> String {
    format!("task:{id}")
}

#[derive(Clone)]
pub struct RedisTaskCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisTaskCache {
    pub fn new(conn: ConnectionManager, ttl_seconds: u64) -> Self {
        Self { conn, ttl_seconds }
    }

    /// Connect eagerly; the manager reconnects on its own afterwards, so a
    /// later outage degrades reads instead of wedging the process.
    pub async fn connect(settings: &CacheSettings) -> Result<Self, redis::RedisError> {
        let client = Client::open(settings.url())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, settings.ttl.as_secs()))
    }
}

#[async_trait]
impl TaskCache for RedisTaskCache {
    async fn get(&self, id: i64) -> Result<Task, CacheError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(task_key(id))
            .await
            .map_err(CacheError::unavailable)?;

        let payload = payload.ok_or(CacheError::NotFound)?;
        serde_json::from_str(&payload).map_err(CacheError::unavailable)
    }

    async fn set(&self, task: &Task) -> Result<(), CacheError> {
        let payload = serde_json::to_string(task).map_err(CacheError::unavailable)?;

        let mut conn = self.conn.clone();
        // SET NX EX replies OK on success and nil when the key is live.
        let reply: Option<String> = redis::cmd("SET")
            .arg(task_key(task.id))
            .arg(payload)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(CacheError::unavailable)?;

        match reply {
            Some(_) => Ok(()),
            None => Err(CacheError::AlreadyCached),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(task_key(id))
            .await
            .map_err(CacheError::unavailable)?;

        if removed == 0 {
            return Err(CacheError::NotFound);
        }
        Ok(())
    }
}
