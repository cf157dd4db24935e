//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-auth-session page state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use task_tracker_core::domain::Session;
use task_tracker_core::ports::{IdentityStore, TaskStore};
use task_tracker_core::session::{session_channel, SessionPublisher};
use task_tracker_core::view_model::{drive, TaskListViewModel};

use crate::adapters::NoticeBuffer;
use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub identity: Arc<dyn IdentityStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub config: Arc<Config>,
    /// Cancelled at shutdown; every page drive loop listens on it.
    pub shutdown: CancellationToken,
    // TODO: evict pages whose auth session has expired.
    pages: RwLock<HashMap<String, Arc<PageHandle>>>,
}

//=========================================================================================
// PageHandle (Specific to One Auth Session)
//=========================================================================================

/// The live state behind one signed-in browser session: the task-page
/// view-model, its notice buffer, and the publisher feeding its session
/// observer. Dropping the handle drops the publisher, which ends the
/// drive loop.
pub struct PageHandle {
    pub page: Arc<Mutex<TaskListViewModel>>,
    pub notices: Arc<NoticeBuffer>,
    publisher: SessionPublisher,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        tasks: Arc<dyn TaskStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            identity,
            tasks,
            config,
            shutdown: CancellationToken::new(),
            pages: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the page for an auth session, creating it on first use.
    ///
    /// Creation applies the session's arrival to a fresh view-model (which
    /// performs the initial task fetch before this returns) and spawns a
    /// drive loop for later transitions such as sign-out. A valid cookie
    /// that outlived a server restart lands here too and simply gets a
    /// fresh page.
    pub async fn open_page(&self, session_id: &str, user_id: Uuid) -> Arc<PageHandle> {
        if let Some(handle) = self.pages.read().await.get(session_id) {
            return handle.clone();
        }

        let mut pages = self.pages.write().await;
        // A concurrent request may have created the page while we waited.
        if let Some(handle) = pages.get(session_id) {
            return handle.clone();
        }

        let notices = Arc::new(NoticeBuffer::new());
        let page = Arc::new(Mutex::new(TaskListViewModel::new(
            self.tasks.clone(),
            notices.clone(),
        )));
        page.lock()
            .await
            .handle_session(Some(Session {
                user_id,
                token: session_id.to_string(),
            }))
            .await;
        let (publisher, observer) = session_channel();
        tokio::spawn(drive(page.clone(), observer, self.shutdown.clone()));

        let handle = Arc::new(PageHandle {
            page,
            notices,
            publisher,
        });
        pages.insert(session_id.to_string(), handle.clone());
        handle
    }

    /// Tears a page down at sign-out: publishes the session's absence so the
    /// view-model clears itself, then forgets the handle.
    pub async fn close_page(&self, session_id: &str) {
        if let Some(handle) = self.pages.write().await.remove(session_id) {
            handle.publisher.publish(None);
        }
    }
}
