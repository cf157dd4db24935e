//! services/api/src/web/tasks.rs
//!
//! Contains the Axum handlers for the task operations and the master
//! definition for the OpenAPI specification. Every handler runs behind the
//! auth middleware and drives the caller's page view-model.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use task_tracker_core::domain::{Task, TaskDraft, TaskPriority, TaskStatus};
use task_tracker_core::ports::WriteError;
use task_tracker_core::view_model::PageError;

use crate::web::middleware::AuthContext;
use crate::web::state::{AppState, PageHandle};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        create_task_handler,
        begin_edit_handler,
        cancel_edit_handler,
        update_task_handler,
        toggle_task_handler,
        delete_task_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            TaskFormPayload,
            TaskView,
            DeletedResponse,
        )
    ),
    tags(
        (name = "Task Tracker API", description = "API endpoints for the task-tracking application.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One task as the page surface renders it.
#[derive(Serialize, ToSchema)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority.as_str().to_string(),
            status: task.status.as_str().to_string(),
            created_at: task.created_at,
        }
    }
}

/// The creation/edit form as submitted by the client.
#[derive(Deserialize, ToSchema)]
pub struct TaskFormPayload {
    pub title: String,
    #[schema(value_type = String, example = "medium")]
    pub priority: TaskPriority,
    #[schema(value_type = String, example = "pending")]
    pub status: TaskStatus,
}

impl TaskFormPayload {
    fn into_draft(self) -> TaskDraft {
        TaskDraft {
            title: self.title,
            priority: self.priority,
            status: self.status,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct DeleteParams {
    /// Deletion only proceeds when this is true; otherwise it stays pending.
    pub confirm: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: Uuid,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn page_for(state: &AppState, ctx: &AuthContext) -> Arc<PageHandle> {
    state.open_page(&ctx.session_id, ctx.user_id).await
}

fn page_error_response(e: PageError) -> (StatusCode, String) {
    let status = match &e {
        PageError::EmptyTitle => StatusCode::UNPROCESSABLE_ENTITY,
        PageError::UnknownTask(_) => StatusCode::NOT_FOUND,
        PageError::NotEditing | PageError::NoPendingDelete => StatusCode::CONFLICT,
        PageError::SignedOut => StatusCode::UNAUTHORIZED,
        PageError::Write(WriteError::NotFound(_)) => StatusCode::NOT_FOUND,
        PageError::Write(WriteError::NotOwner(_)) => StatusCode::FORBIDDEN,
        PageError::Write(WriteError::Unexpected(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a task from the submitted form.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = TaskFormPayload,
    responses(
        (status = 201, description = "Task created", body = TaskView),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Empty title")
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<TaskFormPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let handle = page_for(&state, &ctx).await;
    let mut page = handle.page.lock().await;
    page.set_form(payload.into_draft());
    let task = page.submit_new().await.map_err(page_error_response)?;
    Ok((StatusCode::CREATED, Json(TaskView::from(&task))))
}

/// Enter editing mode with a snapshot of one task.
#[utoipa::path(
    post,
    path = "/tasks/{id}/edit",
    responses(
        (status = 200, description = "Editing snapshot taken", body = TaskView),
        (status = 404, description = "No such task in the current list")
    ),
    params(("id" = Uuid, Path, description = "The task to edit"))
)]
pub async fn begin_edit_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let handle = page_for(&state, &ctx).await;
    let snapshot = handle
        .page
        .lock()
        .await
        .begin_edit(id)
        .map_err(page_error_response)?;
    Ok(Json(TaskView::from(&snapshot)))
}

/// Discard the editing snapshot without touching the store.
#[utoipa::path(
    post,
    path = "/tasks/edit/cancel",
    responses((status = 204, description = "Editing mode left"))
)]
pub async fn cancel_edit_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> impl IntoResponse {
    let handle = page_for(&state, &ctx).await;
    handle.page.lock().await.cancel_edit();
    StatusCode::NO_CONTENT
}

/// Submit the edit form for the task currently being edited.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    request_body = TaskFormPayload,
    responses(
        (status = 200, description = "Task updated", body = TaskView),
        (status = 409, description = "No edit in progress for this task"),
        (status = 422, description = "Empty title")
    ),
    params(("id" = Uuid, Path, description = "The task being edited"))
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskFormPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let handle = page_for(&state, &ctx).await;
    let mut page = handle.page.lock().await;
    if page.editing().map(|t| t.id) != Some(id) {
        return Err((
            StatusCode::CONFLICT,
            "No edit in progress for this task".to_string(),
        ));
    }
    let task = page
        .submit_edit(payload.into_draft())
        .await
        .map_err(page_error_response)?;
    Ok(Json(TaskView::from(&task)))
}

/// Flip one task between pending and completed.
#[utoipa::path(
    post,
    path = "/tasks/{id}/toggle",
    responses(
        (status = 200, description = "Status flipped", body = TaskView),
        (status = 404, description = "No such task in the current list")
    ),
    params(("id" = Uuid, Path, description = "The task to toggle"))
)]
pub async fn toggle_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let handle = page_for(&state, &ctx).await;
    let task = handle
        .page
        .lock()
        .await
        .toggle_status(id)
        .await
        .map_err(page_error_response)?;
    Ok(Json(TaskView::from(&task)))
}

/// Delete one task. Without `confirm=true` the delete only becomes pending,
/// mirroring the confirmation dialog of the page surface.
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    responses(
        (status = 200, description = "Task deleted", body = DeletedResponse),
        (status = 409, description = "Confirmation required"),
        (status = 404, description = "No such task in the current list")
    ),
    params(
        ("id" = Uuid, Path, description = "The task to delete"),
        DeleteParams
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let handle = page_for(&state, &ctx).await;
    let mut page = handle.page.lock().await;
    page.request_delete(id).map_err(page_error_response)?;

    if !params.confirm.unwrap_or(false) {
        return Err((
            StatusCode::CONFLICT,
            "Deletion requires confirmation; repeat the request with ?confirm=true".to_string(),
        ));
    }

    let deleted = page.confirm_delete().await.map_err(page_error_response)?;
    Ok(Json(DeletedResponse { deleted }))
}
