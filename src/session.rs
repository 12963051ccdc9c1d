//! Authenticated-session capability.
//!
//! The sync engine never talks to an identity service directly; it asks a
//! [`SessionProvider`] who is signed in and can follow sign-in / sign-out
//! as a stream of [`SessionEvent`]s.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::model::UserId;

pub trait SessionProvider: Send + Sync + 'static {
    fn current_user(&self) -> Option<UserId>;

    /// Receiver that observes every change of the signed-in user.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

impl<T: SessionProvider> SessionProvider for Arc<T> {
    fn current_user(&self) -> Option<UserId> {
        (**self).current_user()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        (**self).subscribe()
    }
}

/// Session provider backed by a watch channel. Clones share the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<UserId>>>,
}

impl SessionHandle {
    fn with_user(user: Option<UserId>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::with_user(None)
    }

    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self::with_user(Some(user))
    }

    pub fn sign_in(&self, user: UserId) {
        self.set(Some(user));
    }

    pub fn sign_out(&self) {
        self.set(None);
    }

    fn set(&self, next: Option<UserId>) {
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = ?current, to = ?next, "session changed");
            *current = next;
            true
        });
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionProvider for SessionHandle {
    fn current_user(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(UserId),
    Ended,
}

/// Stream of session transitions after the moment of subscription.
#[derive(Debug)]
pub struct SessionEvents {
    rx: watch::Receiver<Option<UserId>>,
}

impl SessionEvents {
    pub fn new(mut rx: watch::Receiver<Option<UserId>>) -> Self {
        rx.mark_unchanged();
        Self { rx }
    }

    /// Next transition, or `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.changed().await.ok()?;
        let current = self.rx.borrow_and_update().clone();
        Some(match current {
            Some(user) => SessionEvent::Started(user),
            None => SessionEvent::Ended,
        })
    }
}

/// Run `callback` on every session transition until the provider drops.
pub fn on_session_change<P, F>(provider: &P, mut callback: F) -> JoinHandle<()>
where
    P: SessionProvider + ?Sized,
    F: FnMut(SessionEvent) + Send + 'static,
{
    let mut events = SessionEvents::new(provider.subscribe());
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            callback(event);
        }
    })
}
