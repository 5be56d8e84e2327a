//! Debounced draft persistence.
//!
//! State-change events arrive much faster than they are worth writing:
//! the writer coalesces them over a quiet window and persists only the
//! most recent state. A write failure keeps the state pending, so the
//! next window retries it. Dropping the writer flushes, which is what
//! carries the draft across session termination.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use pfl_state::{hash_state, FinancialState};
use pfl_types::UserId;

use crate::traits::PersistentStore;

/// Quiet window used by [`DebouncedWriter::new`].
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_secs(1);

enum Msg {
    Submit(FinancialState),
    Flush(Sender<()>),
    Shutdown,
}

/// Coalesces draft writes on a worker thread; most recent state wins.
///
/// Unchanged states (by hash) are skipped entirely, so callers may
/// submit on every mutation without thinking about write volume.
pub struct DebouncedWriter {
    tx: Sender<Msg>,
    worker: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    pub fn new(store: Arc<dyn PersistentStore>, user: UserId) -> Self {
        Self::with_window(store, user, DEFAULT_QUIET_WINDOW)
    }

    pub fn with_window(store: Arc<dyn PersistentStore>, user: UserId, window: Duration) -> Self {
        let (tx, rx) = unbounded::<Msg>();
        let worker = thread::Builder::new()
            .name("pfl-draft-writer".to_string())
            .spawn(move || {
                let mut pending: Option<FinancialState> = None;
                let mut last_hash: Option<[u8; 32]> = None;
                loop {
                    let msg = if pending.is_some() {
                        match rx.recv_timeout(window) {
                            Ok(msg) => Some(msg),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    } else {
                        match rx.recv() {
                            Ok(msg) => Some(msg),
                            Err(_) => break,
                        }
                    };
                    match msg {
                        Some(Msg::Submit(state)) => pending = Some(state),
                        Some(Msg::Flush(ack)) => {
                            write_pending(store.as_ref(), &user, &mut pending, &mut last_hash);
                            let _ = ack.send(());
                        }
                        Some(Msg::Shutdown) => break,
                        // quiet window elapsed
                        None => {
                            write_pending(store.as_ref(), &user, &mut pending, &mut last_hash)
                        }
                    }
                }
                // termination flush
                write_pending(store.as_ref(), &user, &mut pending, &mut last_hash);
            })
            .expect("failed to spawn draft writer");
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Queue `state` for persistence, superseding anything pending.
    pub fn submit(&self, state: FinancialState) {
        let _ = self.tx.send(Msg::Submit(state));
    }

    /// Force the pending state through and wait for the attempt to
    /// finish. A no-op when nothing is pending.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(Msg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn write_pending(
    store: &dyn PersistentStore,
    user: &UserId,
    pending: &mut Option<FinancialState>,
    last_hash: &mut Option<[u8; 32]>,
) {
    let Some(state) = pending.as_ref() else {
        return;
    };
    let hash = match hash_state(state) {
        Ok(hash) => Some(hash),
        // write anyway; only the skip optimization is lost
        Err(err) => {
            warn!(error = %err, "draft state did not hash");
            None
        }
    };
    if hash.is_some() && hash == *last_hash {
        debug!(user = %user, "draft unchanged; write skipped");
        *pending = None;
        return;
    }
    match store.set_draft(user, state) {
        Ok(()) => {
            debug!(user = %user, "draft persisted");
            *last_hash = hash;
            *pending = None;
        }
        // keep pending so the next window retries
        Err(err) => warn!(user = %user, error = %err, "draft write failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use pfl_state::Snapshot;
    use pfl_types::CanonicalDate;

    use crate::error::{StoreError, StoreResult};
    use crate::memory::InMemoryStore;

    use super::*;

    fn state(value: serde_json::Value) -> FinancialState {
        FinancialState::from_value(value).unwrap()
    }

    fn user() -> UserId {
        UserId::new("u-1")
    }

    /// Delegating store that counts and optionally fails draft writes.
    struct CountingStore {
        inner: InMemoryStore,
        draft_writes: AtomicUsize,
        fail_first: usize,
    }

    impl CountingStore {
        fn new(fail_first: usize) -> Self {
            Self {
                inner: InMemoryStore::new(),
                draft_writes: AtomicUsize::new(0),
                fail_first,
            }
        }

        fn writes(&self) -> usize {
            self.draft_writes.load(Ordering::SeqCst)
        }
    }

    impl PersistentStore for CountingStore {
        fn get(&self, user: &UserId) -> StoreResult<Option<FinancialState>> {
            self.inner.get(user)
        }
        fn set(&self, user: &UserId, state: &FinancialState) -> StoreResult<()> {
            self.inner.set(user, state)
        }
        fn get_draft(&self, user: &UserId) -> StoreResult<Option<FinancialState>> {
            self.inner.get_draft(user)
        }
        fn set_draft(&self, user: &UserId, state: &FinancialState) -> StoreResult<()> {
            let attempt = self.draft_writes.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(StoreError::Persistence("backend offline".to_string()));
            }
            self.inner.set_draft(user, state)
        }
        fn clear_draft(&self, user: &UserId) -> StoreResult<()> {
            self.inner.clear_draft(user)
        }
        fn get_history(&self, user: &UserId) -> StoreResult<Vec<Snapshot>> {
            self.inner.get_history(user)
        }
        fn append_or_replace_snapshot(
            &self,
            user: &UserId,
            snapshot: &Snapshot,
        ) -> StoreResult<()> {
            self.inner.append_or_replace_snapshot(user, snapshot)
        }
        fn clear_history(&self, user: &UserId) -> StoreResult<()> {
            self.inner.clear_history(user)
        }
    }

    #[test]
    fn flush_persists_the_most_recent_submission() {
        let store = Arc::new(InMemoryStore::new());
        let writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_secs(60),
        );
        writer.submit(state(json!({ "entrate": { "v": 1 } })));
        writer.submit(state(json!({ "entrate": { "v": 2 } })));
        writer.flush();

        assert_eq!(
            store.get_draft(&user()).unwrap(),
            Some(state(json!({ "entrate": { "v": 2 } })))
        );
    }

    #[test]
    fn quiet_window_writes_without_a_flush() {
        let store = Arc::new(InMemoryStore::new());
        let _writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_millis(10),
        );
        _writer.submit(state(json!({ "entrate": { "v": 1 } })));

        let mut seen = None;
        for _ in 0..200 {
            seen = store.get_draft(&user()).unwrap();
            if seen.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(seen, Some(state(json!({ "entrate": { "v": 1 } }))));
    }

    #[test]
    fn unchanged_state_is_not_rewritten() {
        let store = Arc::new(CountingStore::new(0));
        let writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_secs(60),
        );
        let s = state(json!({ "entrate": { "v": 1 } }));
        writer.submit(s.clone());
        writer.flush();
        assert_eq!(store.writes(), 1);

        writer.submit(s.clone());
        writer.flush();
        assert_eq!(store.writes(), 1);

        writer.submit(state(json!({ "entrate": { "v": 2 } })));
        writer.flush();
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn drop_flushes_the_pending_state() {
        let store = Arc::new(InMemoryStore::new());
        let writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_secs(60),
        );
        writer.submit(state(json!({ "entrate": { "v": 9 } })));
        drop(writer);

        assert_eq!(
            store.get_draft(&user()).unwrap(),
            Some(state(json!({ "entrate": { "v": 9 } })))
        );
    }

    #[test]
    fn failed_write_is_retried_on_the_next_window() {
        let store = Arc::new(CountingStore::new(1));
        let _writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_millis(10),
        );
        _writer.submit(state(json!({ "entrate": { "v": 1 } })));

        let mut seen = None;
        for _ in 0..200 {
            seen = store.get_draft(&user()).unwrap();
            if seen.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(seen.is_some());
        assert!(store.writes() >= 2);
    }

    #[test]
    fn flush_with_nothing_pending_returns() {
        let store = Arc::new(InMemoryStore::new());
        let writer = DebouncedWriter::with_window(
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            user(),
            Duration::from_secs(60),
        );
        writer.flush();
        assert_eq!(store.get_draft(&user()).unwrap(), None);
    }
}
