pub mod domain;
pub mod ports;
pub mod routes;
pub mod session;
pub mod view_model;

pub use domain::{
    AuthSession, Session, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus, User,
    UserCredentials,
};
pub use ports::{
    AuthError, FetchError, IdentityStore, Notifier, Severity, TaskStore, WriteError,
};
pub use routes::{resolve, PageDecision, Route};
pub use session::{session_channel, SessionObserver, SessionPublisher};
pub use view_model::{drive, PageError, Phase, StatusFilter, TaskListViewModel, TaskStats};
