//! Per-user entry point over a storage backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use pfl_schedule::{generate, GenerationRun, GenerationScheduler};
use pfl_state::{ensure_valid, FinancialState, Snapshot};
use pfl_store::{DebouncedWriter, PersistentStore};
use pfl_sync::{propagate, EntryEdit, PropagateOutcome};
use pfl_types::{CanonicalDate, UserId};

use crate::error::{SdkError, SdkResult};
use crate::session::ReconcileSession;
use crate::settings::SharedSettings;

/// High-level handle to one user's ledger.
///
/// Wraps a storage backend with the reconciliation, generation, and
/// edit-propagation flows. Cloning is cheap; clones share the backend
/// and the settings cell.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn PersistentStore>,
    user: UserId,
    settings: SharedSettings,
}

impl Ledger {
    pub fn new(store: Arc<dyn PersistentStore>, user: UserId) -> Self {
        Self::with_settings(store, user, SharedSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn PersistentStore>,
        user: UserId,
        settings: SharedSettings,
    ) -> Self {
        Self {
            store,
            user,
            settings,
        }
    }

    // ---- Accessors ----

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    // ---- Current state and draft ----

    /// The persisted current state, or `None` for a fresh user.
    pub fn load(&self) -> SdkResult<Option<FinancialState>> {
        Ok(self.store.get(&self.user)?)
    }

    /// Persist `state` as the current state.
    pub fn save(&self, state: &FinancialState) -> SdkResult<()> {
        Ok(self.store.set(&self.user, state)?)
    }

    /// Persist the work-in-progress draft.
    pub fn save_draft(&self, state: &FinancialState) -> SdkResult<()> {
        Ok(self.store.set_draft(&self.user, state)?)
    }

    /// Remove and return the draft, if one exists.
    pub fn take_draft(&self) -> SdkResult<Option<FinancialState>> {
        let draft = self.store.get_draft(&self.user)?;
        if draft.is_some() {
            self.store.clear_draft(&self.user)?;
        }
        Ok(draft)
    }

    /// A debounced writer for this user's draft slot, using the
    /// configured quiet window. Drop it to flush and stop.
    pub fn draft_writer(&self) -> DebouncedWriter {
        let window = self.settings.get().persist_debounce;
        DebouncedWriter::with_window(Arc::clone(&self.store), self.user.clone(), window)
    }

    // ---- Snapshot history ----

    /// Full snapshot history, date ascending.
    pub fn history(&self) -> SdkResult<Vec<Snapshot>> {
        Ok(self.store.get_history(&self.user)?)
    }

    pub fn snapshot_on(&self, date: CanonicalDate) -> SdkResult<Option<Snapshot>> {
        Ok(self.store.snapshot_on(&self.user, date)?)
    }

    /// Validate `state` and file it as the snapshot on `date`,
    /// replacing any snapshot already there.
    pub fn save_snapshot(&self, date: CanonicalDate, state: FinancialState) -> SdkResult<Snapshot> {
        ensure_valid(&state)?;
        let snapshot = Snapshot::new(date, state);
        self.store.append_or_replace_snapshot(&self.user, &snapshot)?;
        debug!(user = %self.user, date = %date, "snapshot saved");
        Ok(snapshot)
    }

    pub fn clear_history(&self) -> SdkResult<()> {
        Ok(self.store.clear_history(&self.user)?)
    }

    // ---- Reconciliation ----

    /// Open a reconciliation of `proposed` against the snapshot stored
    /// on `baseline_date`. Fails when no such snapshot exists.
    pub fn reconcile(
        &self,
        baseline_date: CanonicalDate,
        proposed: &FinancialState,
    ) -> SdkResult<ReconcileSession> {
        let snapshot = self
            .snapshot_on(baseline_date)?
            .ok_or(SdkError::NoSnapshot(baseline_date))?;
        Ok(ReconcileSession::new(
            Arc::clone(&self.store),
            self.user.clone(),
            baseline_date,
            snapshot.state,
            proposed,
        ))
    }

    /// Reconcile against an explicit baseline instead of a stored
    /// snapshot. A commit still files the result under `date`.
    pub fn reconcile_with(
        &self,
        date: CanonicalDate,
        baseline: FinancialState,
        proposed: &FinancialState,
    ) -> ReconcileSession {
        ReconcileSession::new(
            Arc::clone(&self.store),
            self.user.clone(),
            date,
            baseline,
            proposed,
        )
    }

    // ---- Generation ----

    /// Run one generation pass over the current state as of `now` and
    /// persist the advanced state. A fresh user yields an empty run.
    pub fn generate_now(&self, now: DateTime<Utc>) -> SdkResult<GenerationRun> {
        let Some(state) = self.store.get(&self.user)? else {
            debug!(user = %self.user, "no persisted state; nothing to generate");
            return Ok(GenerationRun {
                state: FinancialState::new(),
                entries: Vec::new(),
                skipped: Vec::new(),
            });
        };

        let run = generate(&state, now);
        if run.entries.is_empty() {
            debug!(user = %self.user, skipped = run.skipped.len(), "generation pass realized nothing");
        } else {
            self.store.set(&self.user, &run.state)?;
            info!(
                user = %self.user,
                entries = run.entries.len(),
                skipped = run.skipped.len(),
                "generation pass persisted"
            );
        }
        Ok(run)
    }

    /// Spawn a scheduler driving [`Self::generate_now`]: one run right
    /// away, then one per configured interval. The `auto_generate`
    /// setting is re-read on every tick and gates the whole worker;
    /// direct `generate_now` calls ignore it. Interval changes apply on
    /// the next `start`. Drop the scheduler to stop.
    pub fn start_generation(&self) -> GenerationScheduler {
        let ledger = self.clone();
        let scheduler = GenerationScheduler::new(move |now| {
            if !ledger.settings.get().auto_generate {
                debug!(user = %ledger.user, "auto-generation is off; tick ignored");
                return;
            }
            if let Err(error) = ledger.generate_now(now) {
                warn!(user = %ledger.user, error = %error, "scheduled generation failed");
            }
        });
        scheduler.start(self.settings.get().generation_interval);
        scheduler
    }

    // ---- Edit propagation ----

    /// Route an edit on a generated entry back to its source schedule
    /// and persist the result. A missing schedule is not an error; the
    /// outcome carries the orphan warning.
    pub fn propagate_entry_edit(&self, edit: &EntryEdit) -> SdkResult<PropagateOutcome> {
        let Some(state) = self.store.get(&self.user)? else {
            return Err(SdkError::NoState);
        };

        let outcome = propagate(&state, edit);
        if outcome.schedule_patched || outcome.entry_patched {
            self.store.set(&self.user, &outcome.state)?;
        }
        Ok(outcome)
    }
}
