//! Postgres-backed task store.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::application::repos::{StoreError, TaskStore};
use crate::config::DatabaseSettings;
use crate::domain::task::Task;

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    name: String,
    description: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        PgPoolOptions::new()
            .max_connections(settings.max_connections.get())
            .connect_with(options)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn add_task(&self, task: &Task) -> Result<(), StoreError> {
        // Duplicate detection rides on the primary key, so the check and the
        // insert are one atomic statement even under concurrent creates.
        sqlx::query("INSERT INTO tasks (id, name, description) VALUES ($1, $2, $3)")
            .bind(task.id)
            .bind(&task.name)
            .bind(&task.description)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT id, name, description FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Task::from).ok_or(StoreError::NotFound)
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>("SELECT id, name, description FROM tasks")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, task: &Task) -> Result<Task, StoreError> {
        // RETURNING gives back the row as persisted, so the caller sees what
        // storage actually holds rather than an echo of the input.
        let row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET name = $1, description = $2 WHERE id = $3 \
             RETURNING id, name, description",
        )
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Task::from).ok_or(StoreError::NotFound)
    }

    async fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.message().contains("duplicate key") => {
            StoreError::AlreadyExists
        }
        other => StoreError::unavailable(other),
    }
}
