//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of the `TaskStore` and `IdentityStore` ports.
//! Selected through `STORE_BACKEND=memory`; it backs local development runs
//! and the integration test suite, with the same ownership and ordering
//! contract as the database adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use task_tracker_core::domain::{AuthSession, Task, TaskDraft, TaskPatch};
use task_tracker_core::domain::{User, UserCredentials};
use task_tracker_core::ports::{AuthError, FetchError, IdentityStore, TaskStore, WriteError};

#[derive(Default)]
struct MemoryState {
    tasks: Vec<Task>,
    users: Vec<UserCredentials>,
    auth_sessions: Vec<AuthSession>,
}

/// A process-local store. All state lives behind one async mutex; every
/// operation is a short critical section.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

//=========================================================================================
// `TaskStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, owner_id: Uuid) -> Result<Vec<Task>, FetchError> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn create_task(&self, owner_id: Uuid, draft: TaskDraft) -> Result<Task, WriteError> {
        let task = Task {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            priority: draft.priority,
            status: draft.status,
            created_at: Utc::now(),
        };
        self.state.lock().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, WriteError> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(WriteError::NotFound(id))?;
        if task.owner_id != owner_id {
            return Err(WriteError::NotOwner(id));
        }
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> Result<(), WriteError> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(WriteError::NotFound(id))?;
        if task.owner_id != owner_id {
            return Err(WriteError::NotOwner(id));
        }
        state.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AuthError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken(email.to_string()));
        }
        let user_id = Uuid::new_v4();
        state.users.push(UserCredentials {
            user_id,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn credentials_by_email(&self, email: &str) -> Result<UserCredentials, AuthError> {
        self.state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            // Unknown emails look exactly like bad passwords to the caller.
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.state.lock().await.auth_sessions.push(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        });
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> Result<Uuid, AuthError> {
        self.state
            .lock()
            .await
            .auth_sessions
            .iter()
            .find(|s| s.id == session_id && s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or(AuthError::NoSession)
    }

    async fn delete_auth_session(&self, session_id: &str) -> Result<(), AuthError> {
        self.state
            .lock()
            .await
            .auth_sessions
            .retain(|s| s.id != session_id);
        Ok(())
    }
}
