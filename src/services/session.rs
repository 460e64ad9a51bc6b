//! Session store: the single holder of the current identity.
//!
//! Every mutation goes through [`SessionStore::set_session`] or
//! [`SessionStore::clear`], persists to durable storage, and is broadcast to all
//! current subscribers before the call returns.

use crate::domain::models::{Role, Session};
use crate::services::storage::{SessionStorage, StoredSession};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

type Observer = Arc<dyn Fn(&Session) + Send + Sync>;

struct Inner {
    storage: Box<dyn SessionStorage>,
    current: RwLock<Session>,
    observers: Mutex<Observers>,
    /// Held from persist through fan-out; re-entrant so observers may mutate.
    changes: ReentrantMutex<()>,
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
}

/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Loads the persisted token/role. Unreadable storage yields an anonymous
    /// session.
    pub fn initialize(storage: Box<dyn SessionStorage>) -> Self {
        let session = match storage.read() {
            Ok(stored) => session_from_stored(stored),
            Err(err) => {
                warn!(error = %err, "stored session unreadable; starting anonymous");
                Session::anonymous()
            }
        };
        Self {
            inner: Arc::new(Inner {
                storage,
                current: RwLock::new(session),
                observers: Mutex::new(Observers::default()),
                changes: ReentrantMutex::new(()),
            }),
        }
    }

    pub fn current(&self) -> Session {
        self.inner.current.read().clone()
    }

    /// Returns `false` (and changes nothing) for an empty token.
    pub fn set_session(&self, token: impl Into<String>, role: Role) -> bool {
        let token = token.into();
        if token.is_empty() {
            warn!("refusing to store an empty session token");
            return false;
        }
        let session = Session::authenticated(token, role);
        let _serial = self.inner.changes.lock();
        let entry = StoredSession {
            token: session.token().map(str::to_string),
            role: Some(role.as_str().to_string()),
        };
        if let Err(err) = self.inner.storage.write(&entry) {
            warn!(error = %err, "failed to persist session");
        }
        *self.inner.current.write() = session.clone();
        info!(role = %role, "session established");
        self.notify(&session);
        true
    }

    pub fn clear(&self) {
        let session = Session::anonymous();
        let _serial = self.inner.changes.lock();
        if let Err(err) = self.inner.storage.clear() {
            warn!(error = %err, "failed to remove persisted session");
        }
        *self.inner.current.write() = session.clone();
        info!("session cleared");
        self.notify(&session);
    }

    /// Registers `observer` for every later `set_session`/`clear`. Dropping the
    /// returned handle unsubscribes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, observer: impl Fn(&Session) + Send + Sync + 'static) -> Subscription {
        let mut observers = self.inner.observers.lock();
        observers.next_id += 1;
        let id = observers.next_id;
        observers.entries.push((id, Arc::new(observer)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.lock().entries.len()
    }

    fn notify(&self, session: &Session) {
        // snapshot the list so observers may subscribe/unsubscribe re-entrantly
        let targets: Vec<Observer> = self
            .inner
            .observers
            .lock()
            .entries
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in targets {
            observer(session);
        }
    }
}

fn session_from_stored(stored: StoredSession) -> Session {
    let role = match stored.role.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(err) => {
                warn!(error = %err, "ignoring stored role");
                None
            }
        },
    };
    Session::from_parts(stored.token, role)
}

pub struct Subscription {
    store: Weak<Inner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.observers.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}
