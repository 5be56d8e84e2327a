//! Session tunables with explicit change subscriptions.
//!
//! Replaces an ambient "settings changed" broadcast: interested parties
//! either read the current value on demand or subscribe a callback that
//! runs after each update. Nothing observes a change it did not ask for.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use pfl_store::DEFAULT_QUIET_WINDOW;

/// Tunables shared across the facade and its background workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Cadence of the periodic generation pass.
    pub generation_interval: Duration,
    /// Quiet window for the debounced draft writer.
    pub persist_debounce: Duration,
    /// Master switch for the scheduled generation worker. Direct
    /// `generate_now` calls ignore it.
    pub auto_generate: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            generation_interval: Duration::from_secs(60 * 60),
            persist_debounce: DEFAULT_QUIET_WINDOW,
            auto_generate: true,
        }
    }
}

/// Handle returned by [`SharedSettings::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&LedgerSettings) + Send + Sync>;

/// A shared settings cell. Clones refer to the same cell.
#[derive(Clone, Default)]
pub struct SharedSettings {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    value: RwLock<LedgerSettings>,
    observers: Mutex<BTreeMap<u64, Observer>>,
    next_id: AtomicU64,
}

impl SharedSettings {
    pub fn new(settings: LedgerSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(settings),
                observers: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// A copy of the current settings.
    pub fn get(&self) -> LedgerSettings {
        self.inner
            .value
            .read()
            .expect("settings lock poisoned")
            .clone()
    }

    /// Mutate the settings, then notify every subscriber with the
    /// updated value.
    ///
    /// Callbacks run on the updating thread, in subscription order.
    /// They may `get`, but must not subscribe or unsubscribe.
    pub fn update(&self, mutate: impl FnOnce(&mut LedgerSettings)) {
        let updated = {
            let mut value = self.inner.value.write().expect("settings lock poisoned");
            mutate(&mut value);
            value.clone()
        };
        let observers = self.inner.observers.lock().expect("observer table poisoned");
        for observer in observers.values() {
            observer(&updated);
        }
    }

    /// Register `observer` to run after every update.
    pub fn subscribe(
        &self,
        observer: impl Fn(&LedgerSettings) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .lock()
            .expect("observer table poisoned")
            .insert(id, Box::new(observer));
        SubscriptionId(id)
    }

    /// Remove a subscription. Returns `false` when the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner
            .observers
            .lock()
            .expect("observer table poisoned")
            .remove(&id.0)
            .is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .lock()
            .expect("observer table poisoned")
            .len()
    }
}

impl fmt::Debug for SharedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSettings")
            .field("value", &self.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}
