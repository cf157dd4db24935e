//! crates/task_tracker_core/src/session.rs
//!
//! The auth-session observer: a watch channel carrying the current session
//! (or its absence) from the identity layer to whoever needs to react to
//! sign-ins and sign-outs. Purely event-driven; no polling.

use tokio::sync::watch;

use crate::domain::Session;

/// What the channel carries. The initial value is `Resolving` until the
/// identity layer publishes for the first time, mirroring the "still
/// resolving initial state" flag of the page surface.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionSignal {
    Resolving,
    Settled(Option<Session>),
}

/// The identity layer's end of the channel. Dropping it closes the channel,
/// which ends any observer loop cleanly.
pub struct SessionPublisher {
    tx: watch::Sender<SessionSignal>,
}

impl SessionPublisher {
    /// Publishes a session transition. Observers see the new value
    /// synchronously on their next read.
    pub fn publish(&self, session: Option<Session>) {
        // send only fails when every observer is gone, which is fine.
        let _ = self.tx.send(SessionSignal::Settled(session));
    }
}

/// The read end. `Clone` so it can be handed to several consumers.
#[derive(Clone)]
pub struct SessionObserver {
    rx: watch::Receiver<SessionSignal>,
}

impl SessionObserver {
    /// True until the first publish settles the initial state.
    pub fn is_resolving(&self) -> bool {
        matches!(*self.rx.borrow(), SessionSignal::Resolving)
    }

    /// The current session, or `None` when signed out or still resolving.
    pub fn current(&self) -> Option<Session> {
        match &*self.rx.borrow() {
            SessionSignal::Resolving => None,
            SessionSignal::Settled(session) => session.clone(),
        }
    }

    /// Waits for the next published transition. Returns `Err` once the
    /// publisher is gone, which observers treat as teardown.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

/// Creates a connected publisher/observer pair in the resolving state.
pub fn session_channel() -> (SessionPublisher, SessionObserver) {
    let (tx, rx) = watch::channel(SessionSignal::Resolving);
    (SessionPublisher { tx }, SessionObserver { rx })
}
