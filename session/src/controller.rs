use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use errors::{StorageError, ValidationError};
use export::{ExportFormat, ExportInput};
use sync::{
    CachePersister, ConnectivityTracker, MergeConflictNotice, PersistReport, ReconcileOutcome,
    SaveDebouncer, SessionPersister, SessionReconciler, SyncState, SyncStatePersister, Transition
};
use timecode::{Timecode, TimecodeEngine};
use tn_core::{
    Clock, Connectivity, EntitlementProvider, FrameRate, IdGenerator, LocalCache, MetadataField,
    MicAssignment, MicChannel, Note, NoteKind, RemoteSessionStore, Session, Tier, UserId,
    Visibility
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::settings::ControllerSettings;
use crate::tier;

/// Fields the merge takes whole from one side.
fn same_settings(a: &Session, b: &Session) -> bool {
    a.mics == b.mics && a.metadata == b.metadata && a.fps == b.fps && a.tc_offset == b.tc_offset
}

fn note_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyNoteText.into())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Single owner of the current session.
///
/// All state changes go through `&mut self` in event order. Mutations of
/// notes, mics, metadata and frame rate schedule a debounced save; the
/// result comes back through [`SessionController::poll_persist_reports`].
/// A hidden view or an explicit [`SessionController::flush`] writes at once.
pub struct SessionController<Tz: TimeZone = Local> {
    user_id: UserId,
    store: Arc<dyn RemoteSessionStore>,
    entitlements: Arc<dyn EntitlementProvider>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
    zone: Tz,
    settings: ControllerSettings,
    engine: TimecodeEngine<Tz>,
    debouncer: SaveDebouncer,
    reports: mpsc::UnboundedReceiver<PersistReport>,
    reconciler: SessionReconciler,
    state_store: Option<Arc<dyn SyncStatePersister>>,
    connectivity: ConnectivityTracker,
    current: Option<Session>,
    sync_state: SyncState,
    /// In point of the long note being recorded.
    open_long_note: Option<String>,
    session_count: usize,
    dirty: bool
}

impl SessionController<Local> {
    pub fn new(
        user_id: UserId,
        store: Arc<dyn RemoteSessionStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings
    ) -> Self {
        Self::with_zone(user_id, store, entitlements, clock, settings, Local)
    }
}

impl<Tz> SessionController<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync
{
    pub fn with_zone(
        user_id: UserId,
        store: Arc<dyn RemoteSessionStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings,
        zone: Tz
    ) -> Self {
        let persister = Arc::new(SessionPersister::new(
            Arc::clone(&store),
            user_id.clone(),
            Arc::clone(&clock)
        ));
        let (debouncer, reports) = SaveDebouncer::new(Arc::clone(&persister), settings.debounce);
        let reconciler = SessionReconciler::new(persister, Arc::clone(&clock));
        let engine = TimecodeEngine::with_zone(Arc::clone(&clock), settings.default_fps, zone.clone());

        Self {
            user_id,
            store,
            entitlements,
            clock,
            ids: IdGenerator::new(),
            zone,
            settings,
            engine,
            debouncer,
            reports,
            reconciler,
            state_store: None,
            connectivity: ConnectivityTracker::default(),
            current: None,
            sync_state: SyncState::default(),
            open_long_note: None,
            session_count: 0,
            dirty: false
        }
    }

    /// Keeps the timecode offset and per-session sync state in `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn LocalCache>) -> Self {
        self.engine.attach_cache(Arc::clone(&cache));
        self.state_store = Some(Arc::new(CachePersister::new(cache)));
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn tier(&self) -> Tier {
        self.entitlements.tier(&self.user_id)
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync_state
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity.current()
    }

    /// Sessions owned by the user as of the last list, create or delete.
    pub fn session_count(&self) -> usize {
        self.session_count
    }

    pub fn timecode(&self) -> &TimecodeEngine<Tz> {
        &self.engine
    }

    pub fn open_long_note(&self) -> Option<&str> {
        self.open_long_note.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn session_ref(&self) -> Result<&Session> {
        self.current
            .as_ref()
            .ok_or_else(|| ValidationError::NoCurrentSession.into())
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.current
            .as_mut()
            .ok_or_else(|| ValidationError::NoCurrentSession.into())
    }

    // ----- sessions -----

    /// Loads the newest session, or creates the first one for a new user.
    #[tracing::instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn bootstrap(&mut self) -> Result<&Session> {
        let sessions = self.list_sessions().await?;
        match sessions.into_iter().next() {
            Some(newest) => {
                info!(session_id = %newest.id, "Loaded most recent session");
                self.activate(newest);
                self.session_ref()
            }
            None => self.create_session(None).await
        }
    }

    /// Newest first.
    pub async fn list_sessions(&mut self) -> Result<Vec<Session>> {
        let sessions = self.store.list(&self.user_id).await?;
        self.session_count = sessions.len();
        Ok(sessions)
    }

    /// Creates, stores and switches to a new session. A blank name gets
    /// `Session <n> - <YYYY-MM-DD>`.
    #[tracing::instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn create_session(&mut self, name: Option<&str>) -> Result<&Session> {
        if !tier::can_create_session(self.tier(), self.session_count, &self.settings.tiers) {
            info!(count = self.session_count, "Session limit reached");
            return Err(tier::session_limit(&self.settings.tiers));
        }

        let now = self.clock.now();
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| self.default_session_name(now), str::to_string);

        self.flush().await;

        let mut session = Session::new(
            self.ids.session_id(now.timestamp_millis()),
            name,
            now,
            self.engine.frame_rate()
        );
        session.tc_offset = self.engine.offset_millis();
        session.user_id = Some(self.user_id.clone());

        let report = self.debouncer.persister().persist(session.clone()).await;
        let saved_at = report.result?;
        session.updated_at = Some(saved_at);

        self.session_count += 1;
        metrics::counter!("takenote_sessions_created_total").increment(1);
        info!(session_id = %session.id, name = %session.name, "Session created");

        self.activate(session);
        self.sync_state.record_persisted(saved_at);
        self.save_sync_state();
        self.session_ref()
    }

    fn default_session_name(&self, now: DateTime<Utc>) -> String {
        let day = now.with_timezone(&self.zone).date_naive();
        format!(
            "Session {} - {}",
            self.session_count + 1,
            day.format("%Y-%m-%d")
        )
    }

    /// Persists the outgoing session, then switches. An unknown id, or a
    /// session owned by someone else, leaves no session loaded.
    #[tracing::instrument(skip(self))]
    pub async fn load_session(&mut self, session_id: &str) -> Result<Option<&Session>> {
        self.flush().await;

        let fetched = match self.store.get(session_id).await {
            Ok(fetched) => fetched,
            Err(StorageError::NotFound { .. }) => None,
            Err(e) => return Err(e.into())
        };
        let found = fetched.filter(|s| s.user_id.as_ref().is_none_or(|owner| *owner == self.user_id));

        match found {
            Some(session) => {
                self.activate(session);
                Ok(self.current.as_ref())
            }
            None => {
                warn!(session_id, "Session not found");
                self.deactivate();
                Ok(None)
            }
        }
    }

    /// Deletes a stored session. Deleting the loaded one switches to the
    /// newest remaining session, if any.
    #[tracing::instrument(skip(self))]
    pub async fn delete_session(&mut self, session_id: &str) -> Result<()> {
        self.store.delete(session_id).await?;
        self.session_count = self.session_count.saturating_sub(1);
        info!("Session deleted");

        if self.current.as_ref().is_some_and(|s| s.id == session_id) {
            self.deactivate();
            let remaining = self.list_sessions().await?;
            if let Some(next) = remaining.into_iter().next() {
                self.activate(next);
            }
        }
        Ok(())
    }

    pub fn rename_session(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySessionName.into());
        }
        self.session_mut()?.name = name.to_string();
        self.schedule_save();
        Ok(())
    }

    fn activate(&mut self, session: Session) {
        self.debouncer.cancel();
        self.engine.restore(session.fps, session.tc_offset);

        let mut state = self.load_sync_state(&session.id);
        state.deleted_ids.extend(
            session
                .notes
                .iter()
                .filter(|n| n.deleted)
                .map(|n| n.id.clone())
        );

        debug!(session_id = %session.id, notes = session.notes.len(), "Session activated");
        self.sync_state = state;
        self.open_long_note = None;
        self.dirty = false;
        self.current = Some(session);
    }

    fn deactivate(&mut self) {
        self.debouncer.cancel();
        self.current = None;
        self.sync_state = SyncState::default();
        self.open_long_note = None;
        self.dirty = false;
    }

    // ----- notes -----

    fn ensure_note_allowed(&self) -> Result<()> {
        let live = self.session_ref()?.live_note_count();
        if tier::can_create_note(self.tier(), live, &self.settings.tiers) {
            Ok(())
        } else {
            info!(live, "Note limit reached");
            Err(tier::note_limit(&self.settings.tiers))
        }
    }

    fn push_note(&mut self, note: Note, resort: bool) -> Result<Note> {
        let session = self.session_mut()?;
        session.notes.push(note.clone());
        if resort {
            session.sort_notes_by_timecode();
        }
        metrics::counter!("takenote_notes_created_total", "kind" => note.kind.to_string())
            .increment(1);
        debug!(note_id = %note.id, timecode = %note.timecode_in, "Note added");
        self.schedule_save();
        Ok(note)
    }

    /// Appends a note at the displayed timecode.
    pub fn add_quick_note(&mut self, text: &str) -> Result<Note> {
        self.ensure_note_allowed()?;
        let text = note_text(text)?;
        let now = self.clock.now();
        let note = Note::instant(
            self.ids.note_id(now.timestamp_millis()),
            self.engine.formatted(),
            text,
            NoteKind::Quick,
            now
        );
        self.push_note(note, false)
    }

    /// Marks the in point of a long note. Restarting moves the in point.
    pub fn start_long_note(&mut self) -> Result<String> {
        self.ensure_note_allowed()?;
        let timecode_in = self.engine.formatted();
        self.open_long_note = Some(timecode_in.clone());
        Ok(timecode_in)
    }

    /// Closes the open long note at the displayed timecode.
    pub fn finish_long_note(&mut self, text: &str) -> Result<Note> {
        let Some(timecode_in) = self.open_long_note.clone() else {
            return Err(ValidationError::NoOpenLongNote.into());
        };
        self.ensure_note_allowed()?;
        let text = note_text(text)?;

        let now = self.clock.now();
        let note = Note {
            timecode_out: self.engine.formatted(),
            ..Note::instant(
                self.ids.note_id(now.timestamp_millis()),
                timecode_in,
                text,
                NoteKind::Long,
                now
            )
        };
        self.open_long_note = None;
        self.push_note(note, false)
    }

    /// Returns whether a long note was open.
    pub fn cancel_long_note(&mut self) -> bool {
        self.open_long_note.take().is_some()
    }

    /// Inserts a note at an arbitrary timecode and re-sorts.
    pub fn add_custom_note(&mut self, timecode: &str, text: &str) -> Result<Note> {
        self.ensure_note_allowed()?;
        let text = note_text(text)?;
        let fps = self.session_ref()?.fps;
        let at = Timecode::parse(timecode, fps)?.format(fps);

        let now = self.clock.now();
        let note = Note::instant(
            self.ids.note_id(now.timestamp_millis()),
            at,
            text,
            NoteKind::Custom,
            now
        );
        self.push_note(note, true)
    }

    /// Replaces the text of a live note.
    pub fn edit_note(&mut self, note_id: &str, text: &str) -> Result<()> {
        let text = note_text(text)?;
        let note = self
            .session_mut()?
            .note_mut(note_id)
            .ok_or_else(|| ValidationError::NoteNotFound {
                id: note_id.to_string()
            })?;
        if note.deleted {
            return Err(ValidationError::NoteDeleted {
                id: note_id.to_string()
            }
            .into());
        }
        note.text = text;
        self.schedule_save();
        Ok(())
    }

    /// Tombstones a note. The id stays in the deleted set for as long as the
    /// session is known, so no later merge brings it back.
    pub fn delete_note(&mut self, note_id: &str) -> Result<()> {
        let note = self
            .session_mut()?
            .note_mut(note_id)
            .ok_or_else(|| ValidationError::NoteNotFound {
                id: note_id.to_string()
            })?;
        note.deleted = true;

        if self.sync_state.record_deletion(note_id) {
            debug!(note_id, "Note tombstoned");
        }
        self.save_sync_state();
        self.schedule_save();
        Ok(())
    }

    // ----- mics -----

    /// Adds a channel numbered after the last one.
    pub fn add_mic(&mut self, frequency: &str) -> Result<u32> {
        let session = self.session_mut()?;
        let number = session.mics.len() as u32 + 1;
        session
            .mics
            .push(MicChannel::new(number, frequency.trim().to_string()));
        self.schedule_save();
        Ok(number)
    }

    /// Removes a channel and renumbers the rest `1..n`.
    pub fn remove_mic(&mut self, number: u32) -> Result<()> {
        let session = self.session_mut()?;
        let index = session
            .mics
            .iter()
            .position(|m| m.number == number)
            .ok_or(ValidationError::MicNotFound { number })?;
        session.mics.remove(index);
        for (i, mic) in session.mics.iter_mut().enumerate() {
            mic.number = i as u32 + 1;
        }
        self.schedule_save();
        Ok(())
    }

    /// Hands a channel to `person`. The first assignment carries no
    /// timecode; later ones record when the swap happened.
    pub fn assign_mic(&mut self, number: u32, person: &str, photo_ref: Option<String>) -> Result<()> {
        let now = self.engine.formatted();
        let mic = self
            .session_mut()?
            .mic_mut(number)
            .ok_or(ValidationError::MicNotFound { number })?;
        let timecode = (!mic.assignments.is_empty()).then_some(now);
        mic.assignments.push(MicAssignment {
            person_name: person.trim().to_string(),
            timecode,
            photo_ref
        });
        self.schedule_save();
        Ok(())
    }

    pub fn set_mic_frequency(&mut self, number: u32, frequency: &str) -> Result<()> {
        self.session_mut()?
            .mic_mut(number)
            .ok_or(ValidationError::MicNotFound { number })?
            .frequency = frequency.trim().to_string();
        self.schedule_save();
        Ok(())
    }

    // ----- metadata -----

    /// Appends an empty field and returns its id.
    pub fn add_metadata_field(&mut self, label: &str) -> Result<String> {
        let id = self.ids.field_id();
        self.session_mut()?
            .metadata
            .push(MetadataField::new(&id, label.trim(), ""));
        self.schedule_save();
        Ok(id)
    }

    pub fn remove_metadata_field(&mut self, field_id: &str) -> Result<()> {
        let session = self.session_mut()?;
        let before = session.metadata.len();
        session.metadata.retain(|f| f.id != field_id);
        if session.metadata.len() == before {
            return Err(ValidationError::FieldNotFound {
                id: field_id.to_string()
            }
            .into());
        }
        self.schedule_save();
        Ok(())
    }

    pub fn relabel_metadata_field(&mut self, field_id: &str, label: &str) -> Result<()> {
        self.field_mut(field_id)?.label = label.trim().to_string();
        self.schedule_save();
        Ok(())
    }

    pub fn set_metadata_value(&mut self, field_id: &str, value: &str) -> Result<()> {
        self.field_mut(field_id)?.value = value.to_string();
        self.schedule_save();
        Ok(())
    }

    fn field_mut(&mut self, field_id: &str) -> Result<&mut MetadataField> {
        self.session_mut()?
            .field_mut(field_id)
            .ok_or_else(|| {
                ValidationError::FieldNotFound {
                    id: field_id.to_string()
                }
                .into()
            })
    }

    // ----- timecode -----

    pub fn begin_timecode_edit(&mut self) {
        self.engine.begin_edit();
    }

    pub fn set_timecode_fields(&mut self, fields: Timecode) -> Result<()> {
        self.engine.set_fields(fields)?;
        Ok(())
    }

    /// Only while editing. The session is saved with the new rate.
    pub fn set_frame_rate(&mut self, fps: FrameRate) -> Result<()> {
        self.engine.set_frame_rate(fps)?;
        if let Some(session) = self.current.as_mut() {
            session.fps = fps;
        }
        self.schedule_save();
        Ok(())
    }

    /// Starts the clock at the entered fields and returns the new offset.
    pub fn commit_timecode(&mut self) -> i64 {
        let offset = self.engine.commit_edit();
        self.record_offset(offset);
        offset
    }

    /// Runs the clock from the session's stored offset as is.
    pub fn resume_timecode(&mut self) {
        let offset = self.engine.offset_millis();
        self.engine.start_at_offset(offset);
    }

    pub fn sync_timecode_to_now(&mut self) {
        self.engine.sync_to_now();
        self.record_offset(0);
    }

    /// Play/pause. Leaving edit mode commits the entered fields.
    pub fn toggle_timecode(&mut self) {
        let was_editing = self.engine.is_editing();
        self.engine.toggle();
        if was_editing {
            self.record_offset(self.engine.offset_millis());
        }
    }

    fn record_offset(&mut self, offset: i64) {
        if let Some(session) = self.current.as_mut() {
            if session.tc_offset != offset {
                session.tc_offset = offset;
                self.schedule_save();
            }
        }
    }

    // ----- events -----

    /// Reconciles on an offline-to-online edge. Returns the notice when the
    /// merge brought in notes from elsewhere.
    #[tracing::instrument(skip(self))]
    pub async fn on_connectivity(&mut self, connectivity: Connectivity) -> Option<MergeConflictNotice> {
        match self.connectivity.observe(connectivity) {
            Transition::Reconnected if self.settings.reconcile_on_reconnect => self.reconcile().await,
            Transition::Reconnected => {
                self.flush().await;
                None
            }
            Transition::WentOffline | Transition::Unchanged => None
        }
    }

    /// Fetches the remote copy, merges, adopts the merge locally when it
    /// introduces notes, and writes the result back.
    pub async fn reconcile(&mut self) -> Option<MergeConflictNotice> {
        self.poll_persist_reports();
        let local = self.current.clone()?;
        let had_pending = self.dirty;
        self.debouncer.cancel();

        let outcome = self
            .reconciler
            .reconcile_on_reconnect(&local, &self.sync_state.deleted_ids)
            .await;

        match outcome {
            ReconcileOutcome::FetchFailed(_) => {
                self.sync_state.record_fetch_failure();
                self.save_sync_state();
                if self.dirty {
                    self.schedule_save();
                }
                None
            }
            ReconcileOutcome::Reconciled(result) => {
                let introduced = result
                    .notice
                    .as_ref()
                    .map_or(0, |n| n.introduced_note_ids.len());
                let adopted = result.introduces_notes();
                let overwritten = !adopted && had_pending && !same_settings(&local, &result.merged);
                if adopted {
                    self.adopt_merged(result.merged);
                }
                self.apply_report(&result.persisted);
                self.sync_state
                    .record_reconciled(self.clock.now(), introduced);
                self.save_sync_state();
                if overwritten {
                    warn!("Remote settings replaced pending local edits, saving local copy again");
                    self.schedule_save();
                }
                result.notice
            }
        }
    }

    fn adopt_merged(&mut self, merged: Session) {
        if merged.fps != self.engine.frame_rate() || merged.tc_offset != self.engine.offset_millis() {
            self.engine.restore(merged.fps, merged.tc_offset);
        }
        for note in merged.notes.iter().filter(|n| n.deleted) {
            self.sync_state.record_deletion(&note.id);
        }
        info!(notes = merged.live_note_count(), "Adopted merged session");
        self.current = Some(merged);
    }

    /// A hidden view writes pending changes immediately.
    pub async fn on_visibility(&mut self, visibility: Visibility) {
        self.engine.on_visibility(visibility);
        if visibility == Visibility::Hidden {
            self.flush().await;
        }
    }

    /// Applies the results of background saves. Returns how many arrived.
    pub fn poll_persist_reports(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(report) = self.reports.try_recv() {
            self.apply_report(&report);
            applied += 1;
        }
        applied
    }

    /// Writes the current session now if it has unsaved changes.
    pub async fn flush(&mut self) -> Option<PersistReport> {
        self.poll_persist_reports();
        if !self.dirty && !self.debouncer.is_pending() {
            return None;
        }
        let snapshot = self.current.clone()?;
        let report = self.debouncer.flush(snapshot).await;
        self.apply_report(&report);
        Some(report)
    }

    /// Flushes, then releases the ticker and the save timer.
    pub async fn close(&mut self) -> Option<PersistReport> {
        let report = self.flush().await;
        self.dispose();
        report
    }

    pub fn dispose(&mut self) {
        self.debouncer.cancel();
        self.engine.dispose();
        debug!("Session controller disposed");
    }

    fn schedule_save(&mut self) {
        if let Some(session) = &self.current {
            self.dirty = true;
            self.debouncer.schedule(session.clone());
        }
    }

    fn apply_report(&mut self, report: &PersistReport) {
        let Some(session) = self
            .current
            .as_mut()
            .filter(|s| s.id == report.session_id)
        else {
            debug!(session_id = %report.session_id, "Persist report for a session no longer loaded");
            return;
        };

        match &report.result {
            Ok(at) => {
                session.updated_at = Some(*at);
                session.user_id = Some(self.user_id.clone());
                self.sync_state.record_persisted(*at);
                if !self.debouncer.is_pending() {
                    self.dirty = false;
                }
            }
            Err(e) => self
                .sync_state
                .record_persist_failure(&e.to_string(), self.clock.now())
        }
        self.save_sync_state();
    }

    fn load_sync_state(&self, session_id: &str) -> SyncState {
        let Some(store) = &self.state_store else {
            return SyncState::new(session_id);
        };
        store.load(session_id).unwrap_or_else(|e| {
            warn!(session_id, error = %e, "Unreadable sync state, starting fresh");
            SyncState::new(session_id)
        })
    }

    fn save_sync_state(&self) {
        if let Some(store) = &self.state_store {
            if let Err(e) = store.save(&self.sync_state) {
                debug!(error = %e, "Sync state cache write failed");
            }
        }
    }

    // ----- export -----

    /// Serializes the live notes of the current session.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let session = self.session_ref()?;
        if !tier::can_export(self.tier(), format) {
            return Err(tier::export_locked(format));
        }
        Ok(export::render(format, &ExportInput::from_session(session)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::SessionError;
    use std::time::Duration;
    use testing::{FlakyStore, ManualClock, RecordingCache, note, session, shoot_day, tombstone, user};

    type Controller = SessionController<Utc>;

    fn controller(store: Arc<FlakyStore>, tier: Tier) -> (Controller, Arc<ManualClock>) {
        let clock = ManualClock::at(shoot_day());
        let settings = ControllerSettings::default().with_debounce(Duration::from_millis(20));
        let controller = SessionController::with_zone(
            user("u1"),
            store,
            Arc::new(tier),
            clock.clone(),
            settings,
            Utc
        );
        (controller, clock)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    #[tokio::test]
    async fn test_bootstrap_creates_first_session() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Free);

        let created = c.bootstrap().await.unwrap();
        assert_eq!(created.name, "Session 1 - 2025-06-01");
        assert_eq!(created.fps, FrameRate::Fps25);
        assert_eq!(created.updated_at, Some(shoot_day()));
        assert_eq!(store.put_count(), 1);
        assert_eq!(c.session_count(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_loads_newest() {
        let store = FlakyStore::in_memory();
        let mut older = session("session_1", vec![]);
        older.created_at = shoot_day() - chrono::Duration::days(1);
        store.seed(&user("u1"), &older).await.unwrap();
        store
            .seed(&user("u1"), &session("session_2", vec![note("note_a", "10:00:00:00")]))
            .await
            .unwrap();

        let (mut c, _) = controller(store.clone(), Tier::Pro);
        assert_eq!(c.bootstrap().await.unwrap().id, "session_2");
        assert_eq!(c.session_count(), 2);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_quick_note_uses_displayed_timecode() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store, Tier::Free);
        c.bootstrap().await.unwrap();

        let added = c.add_quick_note("  Slate  ").unwrap();
        assert_eq!(added.text, "Slate");
        assert_eq!(added.timecode_in, "09:00:00:00");
        assert_eq!(added.timecode_out, added.timecode_in);
        assert_eq!(added.kind, NoteKind::Quick);
        assert!(c.has_unsaved_changes());

        let err = c.add_quick_note("   ").unwrap_err();
        assert_eq!(err, SessionError::Validation(ValidationError::EmptyNoteText));
        assert_eq!(c.current().unwrap().notes.len(), 1);
    }

    #[tokio::test]
    async fn test_note_ids_increase_within_one_millisecond() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();
        let a = c.add_quick_note("a").unwrap();
        let b = c.add_quick_note("b").unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id < b.id);
    }

    #[tokio::test]
    async fn test_note_gate_does_not_mutate() {
        let store = FlakyStore::in_memory();
        let notes = (0..20)
            .map(|i| note(&format!("note_{i:02}"), "10:00:00:00"))
            .collect();
        store
            .seed(&user("u1"), &session("session_1", notes))
            .await
            .unwrap();

        let (mut c, _) = controller(store.clone(), Tier::Free);
        c.bootstrap().await.unwrap();

        for result in [
            c.add_quick_note("one more"),
            c.add_quick_note(""),
            c.add_custom_note("10:00:00:00", "late"),
        ] {
            assert!(result.unwrap_err().is_upgrade_required());
        }
        assert!(c.start_long_note().unwrap_err().is_upgrade_required());
        assert_eq!(c.current().unwrap().notes.len(), 20);
        assert!(!c.has_unsaved_changes());

        settle().await;
        assert_eq!(c.poll_persist_reports(), 0);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_tombstones_do_not_count_against_note_limit() {
        let store = FlakyStore::in_memory();
        let mut notes: Vec<Note> = (0..19)
            .map(|i| note(&format!("note_{i:02}"), "10:00:00:00"))
            .collect();
        notes.push(tombstone("note_gone", "10:00:00:00"));
        store
            .seed(&user("u1"), &session("session_1", notes))
            .await
            .unwrap();

        let (mut c, _) = controller(store, Tier::Free);
        c.bootstrap().await.unwrap();
        assert!(c.add_quick_note("twentieth").is_ok());
        assert!(c.add_quick_note("twenty-first").unwrap_err().is_upgrade_required());
    }

    #[tokio::test]
    async fn test_session_gate() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Free);
        c.bootstrap().await.unwrap();

        let err = c.create_session(Some("Second")).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::UpgradeRequired {
                resource: "sessions".to_string(),
                limit: 1
            }
        );
        assert_eq!(store.put_count(), 1);
        assert_eq!(c.session_count(), 1);
    }

    #[tokio::test]
    async fn test_pro_creates_named_session_and_switches() {
        let store = FlakyStore::in_memory();
        let (mut c, clock) = controller(store.clone(), Tier::Pro);
        let first = c.bootstrap().await.unwrap().id.clone();
        c.add_quick_note("on the first").unwrap();

        clock.advance(chrono::Duration::minutes(5));
        let second = c.create_session(Some("  Day 2 ")).await.unwrap();
        assert_eq!(second.name, "Day 2");
        assert!(second.notes.is_empty());
        assert_ne!(second.id, first);

        // Outgoing session was flushed before the switch.
        let stored = store.inner().get(&first).await.unwrap().unwrap();
        assert_eq!(stored.live_note_count(), 1);
        assert_eq!(c.session_count(), 2);
    }

    #[tokio::test]
    async fn test_create_session_surfaces_storage_error() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        store.set_fail_puts(true);

        let err = c.create_session(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(c.session_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_note_is_sorted() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.add_quick_note("now").unwrap();
        let custom = c.add_custom_note("08:30:00:12", "earlier").unwrap();
        assert_eq!(custom.kind, NoteKind::Custom);

        let order: Vec<&str> = c
            .current()
            .unwrap()
            .notes
            .iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(order, vec!["earlier", "now"]);

        assert!(matches!(
            c.add_custom_note("25:00:00:00", "bad"),
            Err(SessionError::Timecode(_))
        ));
        assert!(matches!(
            c.add_custom_note("08:30:00:25", "bad frame"),
            Err(SessionError::Timecode(_))
        ));
    }

    #[tokio::test]
    async fn test_long_note_spans_interval() {
        let (mut c, clock) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.commit_timecode();

        assert_eq!(c.start_long_note().unwrap(), "09:00:00:00");
        clock.advance(chrono::Duration::milliseconds(2_080));
        let long = c.finish_long_note("Plane overhead").unwrap();
        assert_eq!(long.timecode_in, "09:00:00:00");
        assert_eq!(long.timecode_out, "09:00:02:02");
        assert_eq!(long.kind, NoteKind::Long);
        assert!(c.open_long_note().is_none());

        assert_eq!(
            c.finish_long_note("again").unwrap_err(),
            SessionError::Validation(ValidationError::NoOpenLongNote)
        );
        c.start_long_note().unwrap();
        assert!(c.cancel_long_note());
        assert!(!c.cancel_long_note());
    }

    #[tokio::test]
    async fn test_delete_and_edit_notes() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();
        let keep = c.add_quick_note("keep").unwrap();
        let gone = c.add_quick_note("gone").unwrap();

        c.edit_note(&keep.id, "kept").unwrap();
        c.delete_note(&gone.id).unwrap();

        let current = c.current().unwrap();
        assert_eq!(current.notes.len(), 2);
        assert_eq!(current.live_note_count(), 1);
        assert_eq!(current.note(&keep.id).unwrap().text, "kept");
        assert!(c.sync_state().is_deleted(&gone.id));

        assert_eq!(
            c.edit_note(&gone.id, "revive").unwrap_err(),
            SessionError::Validation(ValidationError::NoteDeleted { id: gone.id.clone() })
        );
        assert!(matches!(
            c.delete_note("note_missing"),
            Err(SessionError::Validation(ValidationError::NoteNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_mic_lifecycle() {
        let (mut c, clock) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.commit_timecode();

        for freq in ["518.200", "522.400", "530.000"] {
            c.add_mic(freq).unwrap();
        }
        c.assign_mic(3, "Ana", None).unwrap();
        clock.advance(chrono::Duration::seconds(10));
        c.assign_mic(3, "Ben", Some("photos/ben.jpg".to_string()))
            .unwrap();
        c.remove_mic(2).unwrap();

        let mics = &c.current().unwrap().mics;
        let numbers: Vec<u32> = mics.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(mics[1].frequency, "530.000");
        assert_eq!(mics[1].assignments[0].timecode, None);
        assert_eq!(mics[1].assignments[1].timecode.as_deref(), Some("09:00:10:00"));
        assert_eq!(mics[1].current_person(), Some("Ben"));

        c.set_mic_frequency(1, " 600.125 ").unwrap();
        assert_eq!(c.current().unwrap().mics[0].frequency, "600.125");
        assert!(matches!(
            c.remove_mic(9),
            Err(SessionError::Validation(ValidationError::MicNotFound { number: 9 }))
        ));
    }

    #[tokio::test]
    async fn test_metadata_lifecycle() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();

        let id = c.add_metadata_field("Lens").unwrap();
        assert!(id.starts_with("field_"));
        c.set_metadata_value(&id, "35mm").unwrap();
        c.relabel_metadata_field("scene", "Scene / Slate").unwrap();
        c.remove_metadata_field("cameraName").unwrap();

        let fields = &c.current().unwrap().metadata;
        let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["production", "scene", "take", id.as_str()]);
        assert_eq!(fields[1].label, "Scene / Slate");
        assert_eq!(fields[3].value, "35mm");

        assert!(matches!(
            c.remove_metadata_field("cameraName"),
            Err(SessionError::Validation(ValidationError::FieldNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_frame_rate_change_only_while_editing() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();

        c.set_frame_rate(FrameRate::Fps29_97).unwrap();
        assert_eq!(c.current().unwrap().fps, FrameRate::Fps29_97);

        c.commit_timecode();
        assert_eq!(
            c.set_frame_rate(FrameRate::Fps24).unwrap_err(),
            SessionError::Timecode(errors::TimecodeError::FrameRateLocked)
        );
        assert_eq!(c.current().unwrap().fps, FrameRate::Fps29_97);
        assert_eq!(c.add_quick_note("df").unwrap().timecode_in, "09:00:00;00");
    }

    #[tokio::test]
    async fn test_commit_stores_offset_on_session() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Pro);
        c.bootstrap().await.unwrap();

        c.set_timecode_fields(Timecode {
            hours: 10,
            minutes: 0,
            seconds: 0,
            frames: 0
        })
        .unwrap();
        let offset = c.commit_timecode();
        assert_eq!(offset, 3_600_000);
        assert_eq!(c.current().unwrap().tc_offset, 3_600_000);

        c.sync_timecode_to_now();
        assert_eq!(c.current().unwrap().tc_offset, 0);
        assert!(c.timecode().is_running());
    }

    #[tokio::test]
    async fn test_debounced_save_coalesces() {
        let store = FlakyStore::in_memory();
        let (mut c, clock) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        clock.advance(chrono::Duration::seconds(30));

        c.add_quick_note("a").unwrap();
        c.add_quick_note("b").unwrap();
        c.rename_session("Renamed").unwrap();
        settle().await;

        assert_eq!(c.poll_persist_reports(), 1);
        assert_eq!(store.put_count(), 2);
        assert_eq!(store.last_put().unwrap().name, "Renamed");
        let current = c.current().unwrap();
        assert_eq!(current.updated_at, Some(clock.now()));
        assert!(!c.has_unsaved_changes());
        assert_eq!(c.sync_state().stats.total_persists, 2);
    }

    #[tokio::test]
    async fn test_hidden_view_flushes_immediately() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.add_quick_note("before hide").unwrap();

        c.on_visibility(Visibility::Hidden).await;
        assert_eq!(store.put_count(), 2);
        assert!(!c.has_unsaved_changes());

        // Nothing left to write.
        c.on_visibility(Visibility::Hidden).await;
        assert_eq!(store.put_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_background_save_is_recorded() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        store.set_online(false);

        c.add_quick_note("offline").unwrap();
        settle().await;
        assert_eq!(c.poll_persist_reports(), 1);
        assert!(c.sync_state().has_unsaved_changes());
        assert!(c.has_unsaved_changes());
        assert_eq!(c.current().unwrap().live_note_count(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_session_clears_current() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.add_quick_note("pending").unwrap();

        assert!(c.load_session("session_missing").await.unwrap().is_none());
        assert!(c.current().is_none());
        assert_eq!(store.put_count(), 2);
        assert_eq!(
            c.add_quick_note("x").unwrap_err(),
            SessionError::Validation(ValidationError::NoCurrentSession)
        );
    }

    #[tokio::test]
    async fn test_load_refuses_foreign_session() {
        let store = FlakyStore::in_memory();
        store
            .seed(&user("someone_else"), &session("session_9", vec![]))
            .await
            .unwrap();
        let (mut c, _) = controller(store, Tier::Pro);
        assert!(c.load_session("session_9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_current_session_switches_to_newest_remaining() {
        let store = FlakyStore::in_memory();
        let (mut c, clock) = controller(store.clone(), Tier::Pro);
        let first = c.bootstrap().await.unwrap().id.clone();
        clock.advance(chrono::Duration::minutes(1));
        let second = c.create_session(None).await.unwrap().id.clone();
        assert_eq!(c.current().unwrap().name, "Session 2 - 2025-06-01");

        c.delete_session(&second).await.unwrap();
        assert_eq!(c.current().unwrap().id, first);
        assert_eq!(c.session_count(), 1);

        c.delete_session(&first).await.unwrap();
        assert!(c.current().is_none());
        assert_eq!(c.session_count(), 0);
    }

    #[tokio::test]
    async fn test_deleted_ids_survive_reload_with_cache() {
        let store = FlakyStore::in_memory();
        let cache = RecordingCache::new();
        let (c, _) = controller(store.clone(), Tier::Pro);
        let mut c = c.with_cache(cache.clone());

        let id = c.bootstrap().await.unwrap().id.clone();
        let doomed = c.add_quick_note("doomed").unwrap();
        c.delete_note(&doomed.id).unwrap();
        c.flush().await;

        assert!(c.load_session("session_missing").await.unwrap().is_none());
        c.load_session(&id).await.unwrap();
        assert!(c.sync_state().is_deleted(&doomed.id));
        assert!(cache.writes() > 0);
    }

    #[tokio::test]
    async fn test_export_gate_and_output() {
        let (mut c, _) = controller(FlakyStore::in_memory(), Tier::Free);
        assert_eq!(
            c.export(ExportFormat::Csv).unwrap_err(),
            SessionError::Validation(ValidationError::NoCurrentSession)
        );

        c.bootstrap().await.unwrap();
        c.add_quick_note("Slate").unwrap();
        let doomed = c.add_quick_note("Scratch").unwrap();
        c.delete_note(&doomed.id).unwrap();

        let csv = c.export(ExportFormat::Csv).unwrap();
        assert!(csv.contains("09:00:00:00"));
        assert!(csv.contains("Slate"));
        assert!(!csv.contains("Scratch"));

        assert!(c.export(ExportFormat::Edl).unwrap_err().is_upgrade_required());
    }

    #[tokio::test]
    async fn test_close_flushes_and_stops_clock() {
        let store = FlakyStore::in_memory();
        let (mut c, _) = controller(store.clone(), Tier::Pro);
        c.bootstrap().await.unwrap();
        c.commit_timecode();
        c.add_quick_note("last").unwrap();

        let report = c.close().await.unwrap();
        assert!(report.is_saved());
        assert!(!c.timecode().is_running());
        assert_eq!(store.last_put().unwrap().live_note_count(), 1);
    }
}
