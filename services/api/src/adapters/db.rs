//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `TaskStore` and `IdentityStore` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use task_tracker_core::domain::{Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
use task_tracker_core::domain::{User, UserCredentials};
use task_tracker_core::ports::{AuthError, FetchError, IdentityStore, TaskStore, WriteError};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `TaskStore` and `IdentityStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Resolves a task's owner, distinguishing a missing document from one
    /// owned by someone else so the caller gets an explicit verdict.
    async fn check_owner(&self, id: Uuid, owner_id: Uuid) -> Result<(), WriteError> {
        let row: Option<Uuid> = sqlx::query_scalar("SELECT owner_id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WriteError::Unexpected(e.to_string()))?;
        match row {
            None => Err(WriteError::NotFound(id)),
            Some(actual) if actual != owner_id => Err(WriteError::NotOwner(id)),
            Some(_) => Ok(()),
        }
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TaskRecord {
    fn to_domain(self) -> Result<Task, String> {
        let priority = TaskPriority::parse(&self.priority)
            .ok_or_else(|| format!("Unknown priority '{}' in task {}", self.priority, self.id))?;
        let status = TaskStatus::parse(&self.status)
            .ok_or_else(|| format!("Unknown status '{}' in task {}", self.status, self.id))?;
        Ok(Task {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            priority,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

const TASK_COLUMNS: &str = "id, owner_id, title, priority, status, created_at";

//=========================================================================================
// `TaskStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TaskStore for DbAdapter {
    async fn list_tasks(&self, owner_id: Uuid) -> Result<Vec<Task>, FetchError> {
        let records = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FetchError::Unexpected(e.to_string()))?;

        records
            .into_iter()
            .map(|r| r.to_domain().map_err(FetchError::Unexpected))
            .collect()
    }

    async fn create_task(&self, owner_id: Uuid, draft: TaskDraft) -> Result<Task, WriteError> {
        let record = sqlx::query_as::<_, TaskRecord>(&format!(
            "INSERT INTO tasks (id, owner_id, title, priority, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&draft.title)
        .bind(draft.priority.as_str())
        .bind(draft.status.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WriteError::Unexpected(e.to_string()))?;

        record.to_domain().map_err(WriteError::Unexpected)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, WriteError> {
        self.check_owner(id, owner_id).await?;

        let record = sqlx::query_as::<_, TaskRecord>(&format!(
            "UPDATE tasks SET \
                 title = COALESCE($3, title), \
                 priority = COALESCE($4, priority), \
                 status = COALESCE($5, status) \
             WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WriteError::Unexpected(e.to_string()))?
        .ok_or(WriteError::NotFound(id))?;

        record.to_domain().map_err(WriteError::Unexpected)
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> Result<(), WriteError> {
        self.check_owner(id, owner_id).await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| WriteError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for DbAdapter {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AuthError> {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(email)
            .bind(hashed_password)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AuthError::EmailTaken(email.to_string())
                }
                _ => AuthError::Unexpected(e.to_string()),
            })?;

        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn credentials_by_email(&self, email: &str) -> Result<UserCredentials, AuthError> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Unexpected(e.to_string()))?
        // Unknown emails look exactly like bad passwords to the caller.
        .ok_or(AuthError::InvalidCredentials)?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> Result<Uuid, AuthError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Unexpected(e.to_string()))?;

        user_id.ok_or(AuthError::NoSession)
    }

    async fn delete_auth_session(&self, session_id: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
