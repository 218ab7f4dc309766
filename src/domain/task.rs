//! The task record and its validation invariants.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// A stored task. Identity is the caller-assigned `id`; the database row is
/// the single source of truth for `name` and `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Task {
    /// Build a task from boundary input, enforcing the record invariants:
    /// positive id, non-empty name and description.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::validation("task id must be greater than zero"));
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("task name must not be empty"));
        }

        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation(
                "task description must not be empty",
            ));
        }

        Ok(Self {
            id,
            name,
            description,
        })
    }
}
