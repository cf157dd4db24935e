//! crates/task_tracker_core/src/routes.rs
//!
//! The router gate: a pure function from (route, session presence) to the
//! page to render or the route to redirect to. It holds no state of its own.

/// The four page routes of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    TaskPage,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::TaskPage => "/app",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Route::Landing),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/app" => Some(Route::TaskPage),
            _ => None,
        }
    }
}

/// The gate's verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    Render(Route),
    Redirect(Route),
}

/// Decides what a route shows for a given session state.
///
/// The landing page renders for everyone. The login and signup forms only
/// make sense signed out; a signed-in user is sent to the task page. The
/// task page requires a session; without one the user is sent to login.
pub fn resolve(route: Route, signed_in: bool) -> PageDecision {
    match (route, signed_in) {
        (Route::Landing, _) => PageDecision::Render(Route::Landing),
        (Route::Login, false) => PageDecision::Render(Route::Login),
        (Route::Login, true) => PageDecision::Redirect(Route::TaskPage),
        (Route::Signup, false) => PageDecision::Render(Route::Signup),
        (Route::Signup, true) => PageDecision::Redirect(Route::TaskPage),
        (Route::TaskPage, true) => PageDecision::Render(Route::TaskPage),
        (Route::TaskPage, false) => PageDecision::Redirect(Route::Login),
    }
}
