//! crates/task_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Task, TaskDraft, TaskPatch, User, UserCredentials};

//=========================================================================================
// Port Error Types
//=========================================================================================

/// Failures in the sign-in / sign-up / sign-out path, including auth-session
/// validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account already exists for {0}")]
    EmailTaken(String),
    #[error("No active session")]
    NoSession,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Failure while listing tasks. The caller logs it and falls back to an
/// empty list.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Permission denied")]
    Denied,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Failure while creating, updating or deleting a task. The caller leaves
/// its in-memory state untouched.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Task {0} not found")]
    NotFound(Uuid),
    #[error("Task {0} belongs to another user")]
    NotOwner(Uuid),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The boundary between the view-model and the backing task documents.
///
/// Every operation is scoped by the owning user, and ownership is enforced
/// here rather than assumed of the backing store: touching another user's
/// task yields `WriteError::NotOwner`. Each call is a single round trip with
/// no caching and no retries.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `owner_id`, newest first (`created_at` descending).
    async fn list_tasks(&self, owner_id: Uuid) -> Result<Vec<Task>, FetchError>;

    /// Persists a new task for `owner_id`, assigning its id and creation
    /// timestamp. Title validation is the caller's responsibility.
    async fn create_task(&self, owner_id: Uuid, draft: TaskDraft) -> Result<Task, WriteError>;

    /// Merge-patches the mutable fields of one task and returns the updated
    /// document.
    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, WriteError>;

    /// Removes one task document.
    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> Result<(), WriteError>;
}

/// Account and auth-session storage for the identity layer.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AuthError>;

    async fn credentials_by_email(&self, email: &str) -> Result<UserCredentials, AuthError>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Resolves a session id to its user, rejecting unknown or expired
    /// sessions with `AuthError::NoSession`.
    async fn validate_auth_session(&self, session_id: &str) -> Result<Uuid, AuthError>;

    async fn delete_auth_session(&self, session_id: &str) -> Result<(), AuthError>;
}

//=========================================================================================
// Notifier Port
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The user-visible notification channel. Failures that the view-model
/// recovers from in place are still reported here so they do not stay
/// silent to the end user.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}
