pub mod auth;
pub mod middleware;
pub mod pages;
pub mod state;
pub mod tasks;

pub use middleware::require_auth;
pub use tasks::ApiDoc;

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use state::AppState;

/// Builds the complete application router: public page and auth routes, the
/// auth-gated task routes, CORS, and the Swagger UI. Shared between the
/// binary and the integration tests.
pub fn app_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let cors_origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required); the page handlers resolve the
    // session themselves and redirect through the gate.
    let public_routes = Router::new()
        .route("/", get(pages::landing_handler))
        .route("/login", get(pages::login_page_handler))
        .route("/signup", get(pages::signup_page_handler))
        .route("/app", get(pages::app_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/tasks", post(tasks::create_task_handler))
        .route("/tasks/edit/cancel", post(tasks::cancel_edit_handler))
        .route("/tasks/{id}/edit", post(tasks::begin_edit_handler))
        .route("/tasks/{id}/toggle", post(tasks::toggle_task_handler))
        .route(
            "/tasks/{id}",
            put(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
