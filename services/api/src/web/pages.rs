//! services/api/src/web/pages.rs
//!
//! The page routes. Responses are JSON page descriptors rather than markup;
//! the router gate from the core crate decides between rendering and
//! redirecting, and `/app` renders the caller's full view-model state.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use task_tracker_core::domain::TaskDraft;
use task_tracker_core::routes::{resolve, PageDecision, Route};
use task_tracker_core::view_model::{Phase, StatusFilter, TaskStats};

use crate::adapters::Notice;
use crate::web::middleware::resolve_session;
use crate::web::state::AppState;
use crate::web::tasks::TaskView;

//=========================================================================================
// Page Payloads
//=========================================================================================

/// A public page: what it is, and where its call-to-action points.
#[derive(Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub signed_in: bool,
    pub call_to_action: &'static str,
}

/// The rendered task page.
#[derive(Serialize)]
pub struct AppView {
    pub phase: Phase,
    pub tasks: Vec<TaskView>,
    pub stats: TaskStats,
    pub form: TaskDraft,
    pub editing: Option<TaskView>,
    pub pending_delete: Option<Uuid>,
    pub search: String,
    pub filter: StatusFilter,
    pub notices: Vec<Notice>,
}

#[derive(Deserialize)]
pub struct AppQuery {
    pub search: Option<String>,
    pub filter: Option<StatusFilter>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - the landing page, rendered for everyone. Signed-in visitors get
/// pointed at the app, everyone else at signup.
pub async fn landing_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let signed_in = resolve_session(&state, &headers).await.is_some();
    match resolve(Route::Landing, signed_in) {
        PageDecision::Redirect(route) => Redirect::to(route.path()).into_response(),
        PageDecision::Render(_) => Json(PageView {
            page: "landing",
            signed_in,
            call_to_action: if signed_in { "/app" } else { "/signup" },
        })
        .into_response(),
    }
}

/// GET /login - the login form, or a redirect to the app when already
/// signed in.
pub async fn login_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let signed_in = resolve_session(&state, &headers).await.is_some();
    match resolve(Route::Login, signed_in) {
        PageDecision::Redirect(route) => Redirect::to(route.path()).into_response(),
        PageDecision::Render(_) => Json(PageView {
            page: "login",
            signed_in,
            call_to_action: "/auth/login",
        })
        .into_response(),
    }
}

/// GET /signup - the signup form, or a redirect to the app when already
/// signed in.
pub async fn signup_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let signed_in = resolve_session(&state, &headers).await.is_some();
    match resolve(Route::Signup, signed_in) {
        PageDecision::Redirect(route) => Redirect::to(route.path()).into_response(),
        PageDecision::Render(_) => Json(PageView {
            page: "signup",
            signed_in,
            call_to_action: "/auth/signup",
        })
        .into_response(),
    }
}

/// GET /app - the task page, or a redirect to login without a session.
///
/// Optional `search` and `filter` query parameters update the view-model
/// before the page is derived.
pub async fn app_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppQuery>,
) -> impl IntoResponse {
    let ctx = resolve_session(&state, &headers).await;
    if let PageDecision::Redirect(route) = resolve(Route::TaskPage, ctx.is_some()) {
        return Redirect::to(route.path()).into_response();
    }
    let ctx = match ctx {
        Some(ctx) => ctx,
        // The gate only renders for a present session.
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };

    let handle = state.open_page(&ctx.session_id, ctx.user_id).await;
    let mut page = handle.page.lock().await;
    if let Some(term) = query.search {
        page.set_search(term);
    }
    if let Some(filter) = query.filter {
        page.set_filter(filter);
    }

    let view = AppView {
        phase: page.phase(),
        tasks: page.visible().iter().map(TaskView::from).collect(),
        stats: page.stats(),
        form: page.form().clone(),
        editing: page.editing().map(TaskView::from),
        pending_delete: page.pending_delete(),
        search: page.search().to_string(),
        filter: page.filter(),
        notices: handle.notices.drain(),
    };
    Json(view).into_response()
}
