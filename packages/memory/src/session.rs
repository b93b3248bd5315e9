//! Per-connection state: selected database, subscriptions, event listeners.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use deferkv_callback::{Listener, Value};

use crate::dataspace::lock;

pub(crate) struct Session {
    db: AtomicU32,
    closed: AtomicBool,
    subscriptions: Mutex<BTreeSet<String>>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl Session {
    pub(crate) fn new(db: u32) -> Self {
        Self {
            db: AtomicU32::new(db),
            closed: AtomicBool::new(false),
            subscriptions: Mutex::new(BTreeSet::new()),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn db(&self) -> u32 {
        self.db.load(Ordering::SeqCst)
    }

    pub(crate) fn select(&self, db: u32) {
        self.db.store(db, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Subscribe to a channel, returning the new subscription count.
    pub(crate) fn subscribe(&self, channel: &str) -> usize {
        let mut subscriptions = lock(&self.subscriptions);
        subscriptions.insert(channel.to_string());
        subscriptions.len()
    }

    /// Unsubscribe from a channel, returning the remaining subscription count.
    pub(crate) fn unsubscribe(&self, channel: &str) -> usize {
        let mut subscriptions = lock(&self.subscriptions);
        subscriptions.remove(channel);
        subscriptions.len()
    }

    pub(crate) fn subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).iter().cloned().collect()
    }

    pub(crate) fn is_subscribed(&self, channel: &str) -> bool {
        lock(&self.subscriptions).contains(channel)
    }

    pub(crate) fn listen(&self, event: &str, listener: Listener) {
        lock(&self.listeners)
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Call every listener registered for `event`.
    pub(crate) fn emit(&self, event: &str, payload: &[Value]) {
        let listeners = lock(&self.listeners)
            .get(event)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener.notify(payload);
        }
    }
}
