//! services/api/src/web/middleware.rs
//!
//! Authentication middleware and session resolution for the page routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

/// Who a validated request is acting for.
#[derive(Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: String,
}

/// Pulls the auth-session id out of the cookie header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix("session=")
    })
}

/// Resolves the request's session against the identity store. `None` covers
/// both a missing cookie and an invalid or expired session; page routes use
/// this to decide between rendering and redirecting.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<AuthContext> {
    let session_id = session_id_from_headers(headers)?;
    match state.identity.validate_auth_session(session_id).await {
        Ok(user_id) => Some(AuthContext {
            user_id,
            session_id: session_id.to_string(),
        }),
        Err(_) => None,
    }
}

/// Middleware that validates the auth session cookie and extracts the caller.
///
/// If valid, inserts an `AuthContext` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = session_id_from_headers(req.headers())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .identity
        .validate_auth_session(&session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(AuthContext {
        user_id,
        session_id,
    });

    Ok(next.run(req).await)
}
