//! State shared by every client a library creates.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use deferkv_callback::Value;

use crate::keyspace::Keyspace;
use crate::session::Session;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Databases, live sessions, and library-level command extensions.
#[derive(Default)]
pub struct Dataspace {
    databases: Mutex<HashMap<u32, Keyspace>>,
    sessions: Mutex<Vec<Weak<Session>>>,
    added_commands: RwLock<BTreeSet<String>>,
}

impl Dataspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against database `db`, creating it on first use.
    pub(crate) fn with_db<R>(&self, db: u32, f: impl FnOnce(&mut Keyspace) -> R) -> R {
        let mut databases = lock(&self.databases);
        f(databases.entry(db).or_default())
    }

    /// Number of keys in database `db`.
    pub fn key_count(&self, db: u32) -> usize {
        lock(&self.databases).get(&db).map_or(0, Keyspace::len)
    }

    pub(crate) fn register(&self, session: &Arc<Session>) {
        let mut sessions = lock(&self.sessions);
        sessions.retain(|s| s.strong_count() > 0);
        sessions.push(Arc::downgrade(session));
    }

    /// Deliver `message` to every session subscribed to `channel`.
    ///
    /// Returns the number of receivers. Listeners run after the session
    /// registry lock is released.
    pub(crate) fn publish(&self, channel: &str, message: &str) -> usize {
        let receivers: Vec<Arc<Session>> = lock(&self.sessions)
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|s| s.is_subscribed(channel))
            .collect();
        let payload = [Value::from(channel), Value::from(message)];
        for session in &receivers {
            session.emit("message", &payload);
        }
        receivers.len()
    }

    pub(crate) fn add_command(&self, name: &str) {
        self.added_commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_ascii_lowercase());
    }

    pub(crate) fn is_added_command(&self, name: &str) -> bool {
        self.added_commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    pub(crate) fn added_commands(&self) -> Vec<String> {
        self.added_commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}
