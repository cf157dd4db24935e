//! crates/task_tracker_core/src/view_model.rs
//!
//! The task-list view-model: the in-memory state behind the task page and
//! the state machine that keeps it consistent with the task store. Local
//! state is only ever mutated after the corresponding store call succeeds,
//! so the list and the store cannot diverge on the happy path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Session, Task, TaskDraft, TaskPatch};
use crate::ports::{Notifier, Severity, TaskStore, WriteError};
use crate::session::SessionObserver;

//=========================================================================================
// Page State Types
//=========================================================================================

/// Whether the task list reflects the last successful fetch or a fetch is
/// still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Ready,
}

/// The status filter selector of the task page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    fn admits(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => task.status == crate::domain::TaskStatus::Pending,
            StatusFilter::Completed => task.status == crate::domain::TaskStatus::Completed,
        }
    }
}

/// The dashboard counters derived from the full (unfiltered) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Local rejections and store failures surfaced by page operations.
/// Fetch failures never appear here; the view-model recovers from them in
/// place by falling back to an empty list.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("A task title is required")]
    EmptyTitle,
    #[error("Task {0} is not in the current list")]
    UnknownTask(Uuid),
    #[error("No edit in progress")]
    NotEditing,
    #[error("No delete awaiting confirmation")]
    NoPendingDelete,
    #[error("Not signed in")]
    SignedOut,
    #[error(transparent)]
    Write(#[from] WriteError),
}

//=========================================================================================
// TaskListViewModel
//=========================================================================================

/// The state behind one user's task page.
///
/// Holds the in-memory task sequence (newest first), the creation form, the
/// editing snapshot, the pending-delete id and the search/filter selectors,
/// and issues store calls on the owner's behalf. Reacts to session
/// transitions: a sign-in triggers a fetch, a sign-out clears everything so
/// no stale data survives it.
pub struct TaskListViewModel {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    session: Option<Session>,
    phase: Phase,
    tasks: Vec<Task>,
    form: TaskDraft,
    editing: Option<Task>,
    pending_delete: Option<Uuid>,
    search: String,
    filter: StatusFilter,
}

impl TaskListViewModel {
    pub fn new(store: Arc<dyn TaskStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            session: None,
            phase: Phase::Loading,
            tasks: Vec::new(),
            form: TaskDraft::default(),
            editing: None,
            pending_delete: None,
            search: String::new(),
            filter: StatusFilter::All,
        }
    }

    //-------------------------------------------------------------------------------------
    // Session transitions
    //-------------------------------------------------------------------------------------

    /// Applies an observed session transition.
    ///
    /// A present session enters `Loading`, fetches the owner's tasks and
    /// enters `Ready` with the result; a fetch failure is logged, reported
    /// through the notifier and degrades to an empty list. An absent session
    /// clears the whole page immediately.
    pub async fn handle_session(&mut self, session: Option<Session>) {
        match session {
            Some(session) => {
                self.phase = Phase::Loading;
                let owner_id = session.user_id;
                self.session = Some(session);
                match self.store.list_tasks(owner_id).await {
                    Ok(tasks) => self.tasks = tasks,
                    Err(e) => {
                        error!("Error fetching tasks: {:?}", e);
                        self.notifier
                            .notify(Severity::Error, "Could not load your tasks");
                        self.tasks = Vec::new();
                    }
                }
                self.phase = Phase::Ready;
            }
            None => {
                // Clear everything so no stale data survives a sign-out.
                self.session = None;
                self.tasks.clear();
                self.form = TaskDraft::default();
                self.editing = None;
                self.pending_delete = None;
                self.phase = Phase::Ready;
            }
        }
    }

    fn owner_id(&self) -> Result<Uuid, PageError> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(PageError::SignedOut)
    }

    //-------------------------------------------------------------------------------------
    // Create
    //-------------------------------------------------------------------------------------

    /// Replaces the creation form wholesale.
    pub fn set_form(&mut self, form: TaskDraft) {
        self.form = form;
    }

    /// Submits the creation form. An empty or whitespace-only title is
    /// rejected before any store call. On success the new task is prepended
    /// (the sequence is newest-first) and the form resets to its defaults.
    pub async fn submit_new(&mut self) -> Result<Task, PageError> {
        let owner_id = self.owner_id()?;
        if self.form.title.trim().is_empty() {
            self.notifier
                .notify(Severity::Warning, "A task title is required");
            return Err(PageError::EmptyTitle);
        }

        match self.store.create_task(owner_id, self.form.clone()).await {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                self.form = TaskDraft::default();
                Ok(task)
            }
            Err(e) => {
                error!("Error adding task: {:?}", e);
                self.notifier
                    .notify(Severity::Error, "Could not add the task");
                Err(e.into())
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Edit
    //-------------------------------------------------------------------------------------

    /// Enters editing mode with a snapshot of the target task.
    pub fn begin_edit(&mut self, id: Uuid) -> Result<Task, PageError> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(PageError::UnknownTask(id))?;
        self.editing = Some(task.clone());
        Ok(task)
    }

    /// Discards the editing snapshot without a store call.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Submits the edit form for the task currently being edited: patches
    /// only the mutable fields remotely, then replaces the matching
    /// in-memory entry and leaves editing mode. A failed patch keeps both
    /// the entry and the editing snapshot unchanged.
    pub async fn submit_edit(&mut self, fields: TaskDraft) -> Result<Task, PageError> {
        let owner_id = self.owner_id()?;
        let id = self.editing.as_ref().ok_or(PageError::NotEditing)?.id;
        if fields.title.trim().is_empty() {
            self.notifier
                .notify(Severity::Warning, "A task title is required");
            return Err(PageError::EmptyTitle);
        }

        let patch = TaskPatch {
            title: Some(fields.title),
            priority: Some(fields.priority),
            status: Some(fields.status),
        };
        match self.store.update_task(id, owner_id, patch).await {
            Ok(updated) => {
                self.replace_entry(updated.clone());
                self.editing = None;
                Ok(updated)
            }
            Err(e) => {
                error!("Error updating task: {:?}", e);
                self.notifier
                    .notify(Severity::Error, "Could not update the task");
                Err(e.into())
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Toggle
    //-------------------------------------------------------------------------------------

    /// Flips one task between pending and completed. The local entry is only
    /// updated after the remote patch succeeds; on failure it is left at its
    /// last known-good value.
    pub async fn toggle_status(&mut self, id: Uuid) -> Result<Task, PageError> {
        let owner_id = self.owner_id()?;
        let current = self
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(PageError::UnknownTask(id))?;
        let next = current.status.toggled();

        let patch = TaskPatch {
            status: Some(next),
            ..TaskPatch::default()
        };
        match self.store.update_task(id, owner_id, patch).await {
            Ok(updated) => {
                self.replace_entry(updated.clone());
                Ok(updated)
            }
            Err(e) => {
                error!("Error toggling task status: {:?}", e);
                self.notifier
                    .notify(Severity::Error, "Could not update the task");
                Err(e.into())
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Delete
    //-------------------------------------------------------------------------------------

    /// Records a delete awaiting explicit confirmation.
    pub fn request_delete(&mut self, id: Uuid) -> Result<(), PageError> {
        if !self.tasks.iter().any(|t| t.id == id) {
            return Err(PageError::UnknownTask(id));
        }
        self.pending_delete = Some(id);
        Ok(())
    }

    /// Performs the pending delete: removes the document remotely, then
    /// removes exactly the matching entry locally. The confirmation is
    /// consumed either way.
    pub async fn confirm_delete(&mut self) -> Result<Uuid, PageError> {
        let owner_id = self.owner_id()?;
        let id = self.pending_delete.take().ok_or(PageError::NoPendingDelete)?;

        match self.store.delete_task(id, owner_id).await {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                Ok(id)
            }
            Err(e) => {
                error!("Error deleting task: {:?}", e);
                self.notifier
                    .notify(Severity::Error, "Could not delete the task");
                Err(e.into())
            }
        }
    }

    /// Abandons the pending delete without a store call.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    //-------------------------------------------------------------------------------------
    // Derived views
    //-------------------------------------------------------------------------------------

    pub fn set_search(&mut self, term: String) {
        self.search = term;
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// The visible list: the task sequence filtered by a case-insensitive
    /// substring match of the search term against titles, intersected with
    /// the status filter. Pure; the underlying sequence is untouched.
    pub fn visible(&self) -> Vec<Task> {
        let needle = self.search.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .filter(|t| self.filter.admits(t))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self
            .tasks
            .iter()
            .filter(|t| t.status == crate::domain::TaskStatus::Completed)
            .count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    //-------------------------------------------------------------------------------------
    // Accessors for the page surface
    //-------------------------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn form(&self) -> &TaskDraft {
        &self.form
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn pending_delete(&self) -> Option<Uuid> {
        self.pending_delete
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    fn replace_entry(&mut self, updated: Task) {
        if let Some(entry) = self.tasks.iter_mut().find(|t| t.id == updated.id) {
            *entry = updated;
        }
    }
}

//=========================================================================================
// Observer Drive Loop
//=========================================================================================

/// Connects a session observer to a view-model: every observed transition is
/// applied to the page. Ends when the publisher goes away or the shutdown
/// token fires, so teardown is tied to the application lifetime.
pub async fn drive(
    page: Arc<Mutex<TaskListViewModel>>,
    mut observer: SessionObserver,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Session drive loop shutting down.");
                break;
            }
            changed = observer.changed() => {
                if changed.is_err() {
                    // Publisher dropped; the page is being torn down.
                    break;
                }
                let session = observer.current();
                page.lock().await.handle_session(session).await;
            }
        }
    }
}
