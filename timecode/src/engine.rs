use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use errors::TimecodeError;
use parking_lot::Mutex;
use tn_core::{Clock, FrameRate, LocalCache, Visibility};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::derive::{derive_timecode, offset_for};
use crate::format::Timecode;

/// Local cache key holding the last committed offset.
pub const OFFSET_CACHE_KEY: &str = "tc_offset";

#[derive(Debug, Clone, Copy)]
struct EngineState {
    frame_rate: FrameRate,
    offset_millis: i64,
    running: bool,
    editing: bool,
    edit_fields: Timecode,
    /// Display while paused.
    frozen: Option<Timecode>
}

/// Owned timecode clock with an explicit `start`/`stop`/`dispose` lifecycle.
///
/// While running, a ticker task republishes the derived timecode every
/// `1000 / fps` ms on a watch channel. The published value is only a cache:
/// [`TimecodeEngine::current`] always derives from the clock, and a
/// visibility-regain event republishes immediately in case the host
/// suspended the ticker.
pub struct TimecodeEngine<Tz: TimeZone = Local> {
    clock: Arc<dyn Clock>,
    zone: Tz,
    state: Arc<Mutex<EngineState>>,
    display: Arc<watch::Sender<Timecode>>,
    ticker: Option<JoinHandle<()>>,
    cache: Option<Arc<dyn LocalCache>>,
    disposed: bool
}

impl TimecodeEngine<Local> {
    /// Engine in the host's local time zone.
    pub fn new(clock: Arc<dyn Clock>, frame_rate: FrameRate) -> Self {
        Self::with_zone(clock, frame_rate, Local)
    }
}

impl<Tz> TimecodeEngine<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync
{
    /// Starts in editing mode with the fields preset to the current time.
    pub fn with_zone(clock: Arc<dyn Clock>, frame_rate: FrameRate, zone: Tz) -> Self {
        let now = derive_timecode(clock.now_millis(), 0, frame_rate, &zone);
        let edit_fields = Timecode { frames: 0, ..now };
        let (display, _) = watch::channel(edit_fields);

        Self {
            clock,
            zone,
            state: Arc::new(Mutex::new(EngineState {
                frame_rate,
                offset_millis: 0,
                running: false,
                editing: true,
                edit_fields,
                frozen: None
            })),
            display: Arc::new(display),
            ticker: None,
            cache: None,
            disposed: false
        }
    }

    /// Attaches a best-effort offset store and restores a previously
    /// committed offset from it.
    pub fn with_cache(mut self, cache: Arc<dyn LocalCache>) -> Self {
        self.attach_cache(cache);
        self
    }

    /// In-place form of [`TimecodeEngine::with_cache`].
    pub fn attach_cache(&mut self, cache: Arc<dyn LocalCache>) {
        if let Some(raw) = cache.get(OFFSET_CACHE_KEY) {
            match raw.parse::<i64>() {
                Ok(offset) => {
                    let now = self.clock.now_millis();
                    let mut state = self.state.lock();
                    state.offset_millis = offset;
                    let restored = derive_timecode(now, offset, state.frame_rate, &self.zone);
                    state.edit_fields = Timecode { frames: 0, ..restored };
                    debug!(offset, "Restored timecode offset from cache");
                }
                Err(e) => warn!("Ignoring unreadable cached offset {:?}: {}", raw, e)
            }
        }
        self.cache = Some(cache);
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.state.lock().frame_rate
    }

    pub fn offset_millis(&self) -> i64 {
        self.state.lock().offset_millis
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn is_editing(&self) -> bool {
        self.state.lock().editing
    }

    pub fn subscribe(&self) -> watch::Receiver<Timecode> {
        self.display.subscribe()
    }

    /// The value the display should show right now.
    pub fn current(&self) -> Timecode {
        let state = *self.state.lock();
        self.value_for(&state)
    }

    pub fn formatted(&self) -> String {
        let state = *self.state.lock();
        self.value_for(&state).format(state.frame_rate)
    }

    fn value_for(&self, state: &EngineState) -> Timecode {
        if state.editing {
            state.edit_fields
        } else if state.running {
            derive_timecode(
                self.clock.now_millis(),
                state.offset_millis,
                state.frame_rate,
                &self.zone
            )
        } else {
            state.frozen.unwrap_or_else(|| {
                derive_timecode(
                    self.clock.now_millis(),
                    state.offset_millis,
                    state.frame_rate,
                    &self.zone
                )
            })
        }
    }

    /// Recomputes and republishes the display value.
    pub fn refresh(&self) -> Timecode {
        let tc = self.current();
        self.display.send_replace(tc);
        tc
    }

    pub fn on_visibility(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Visible => {
                let tc = self.refresh();
                let running = self.is_running();
                let ticker_dead = self.ticker.as_ref().is_none_or(JoinHandle::is_finished);
                if running && ticker_dead {
                    self.spawn_ticker();
                }
                debug!(timecode = ?tc, "Refreshed timecode on visibility regain");
            }
            Visibility::Hidden => debug!("View hidden; timecode keeps deriving from wall clock")
        }
    }

    /// Freezes the clock so the fields can be edited directly.
    pub fn begin_edit(&mut self) {
        self.abort_ticker();
        let shown = self.current();
        {
            let mut state = self.state.lock();
            state.editing = true;
            state.running = false;
            state.frozen = None;
            state.edit_fields = shown;
        }
        self.refresh();
    }

    pub fn set_fields(&mut self, fields: Timecode) -> Result<(), TimecodeError> {
        {
            let mut state = self.state.lock();
            if !state.editing {
                return Err(TimecodeError::NotEditing);
            }
            state.edit_fields = Timecode::new(
                fields.hours,
                fields.minutes,
                fields.seconds,
                fields.frames,
                state.frame_rate
            )?;
        }
        self.refresh();
        Ok(())
    }

    /// Only allowed while editing; the edited frame field is clamped to the
    /// new rate and the offset is left alone.
    pub fn set_frame_rate(&mut self, frame_rate: FrameRate) -> Result<(), TimecodeError> {
        {
            let mut state = self.state.lock();
            if !state.editing {
                return Err(TimecodeError::FrameRateLocked);
            }
            state.frame_rate = frame_rate;
            state.edit_fields = state.edit_fields.clamp_frames(frame_rate);
        }
        self.refresh();
        Ok(())
    }

    /// Leaves editing mode: derives the offset that reproduces the entered
    /// fields at this instant, persists it and starts running.
    pub fn commit_edit(&mut self) -> i64 {
        let offset = {
            let mut state = self.state.lock();
            if !state.editing {
                return state.offset_millis;
            }
            let offset = offset_for(
                state.edit_fields,
                self.clock.now_millis(),
                state.frame_rate,
                &self.zone
            );
            state.offset_millis = offset;
            state.editing = false;
            offset
        };

        info!(offset, "Committed timecode edit");
        self.persist_offset(offset);
        self.resume();
        offset
    }

    /// Passthrough wall-clock display: zero offset, running.
    pub fn sync_to_now(&mut self) {
        {
            let mut state = self.state.lock();
            state.offset_millis = 0;
            state.editing = false;
        }
        info!("Synced timecode to wall clock");
        self.persist_offset(0);
        self.resume();
    }

    /// Leaves editing and runs from `offset_millis` as given, without
    /// re-deriving it from the edit fields.
    pub fn start_at_offset(&mut self, offset_millis: i64) {
        {
            let mut state = self.state.lock();
            state.offset_millis = offset_millis;
            state.editing = false;
        }
        self.resume();
    }

    pub fn start(&mut self) {
        if self.is_editing() {
            self.commit_edit();
        } else {
            self.resume();
        }
    }

    pub fn stop(&mut self) {
        self.abort_ticker();
        let shown = self.current();
        {
            let mut state = self.state.lock();
            state.running = false;
            if !state.editing {
                state.frozen = Some(shown);
            }
        }
        self.refresh();
    }

    /// Play/pause button semantics.
    pub fn toggle(&mut self) {
        if self.is_editing() {
            self.commit_edit();
        } else if self.is_running() {
            self.stop();
        } else {
            self.resume();
        }
    }

    /// Loads a session's persisted rate and offset.
    pub fn restore(&mut self, frame_rate: FrameRate, offset_millis: i64) {
        let now = self.clock.now_millis();
        let running = {
            let mut state = self.state.lock();
            state.frame_rate = frame_rate;
            state.offset_millis = offset_millis;
            state.frozen = None;
            if state.editing {
                let restored = derive_timecode(now, offset_millis, frame_rate, &self.zone);
                state.edit_fields = Timecode { frames: 0, ..restored };
            }
            state.running
        };
        if running {
            self.spawn_ticker();
        }
        self.refresh();
    }

    /// Cancels the ticker for good. Later `start` calls are ignored.
    pub fn dispose(&mut self) {
        self.abort_ticker();
        self.state.lock().running = false;
        self.disposed = true;
    }

    fn resume(&mut self) {
        if self.disposed {
            warn!("Ignoring start on a disposed timecode engine");
            return;
        }
        {
            let mut state = self.state.lock();
            state.running = true;
            state.editing = false;
            state.frozen = None;
        }
        self.spawn_ticker();
        self.refresh();
    }

    fn persist_offset(&self, offset: i64) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(OFFSET_CACHE_KEY, &offset.to_string()) {
                debug!("Offset cache write failed: {}", e);
            }
        }
    }

    fn abort_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&mut self) {
        self.abort_ticker();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime; timecode ticker not started");
            return;
        };

        let frame_rate = self.frame_rate();
        let period = Duration::from_secs_f64(1.0 / frame_rate.as_f64());
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let display = Arc::clone(&self.display);
        let zone = self.zone.clone();

        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let snapshot = *state.lock();
                if !snapshot.running || snapshot.editing {
                    break;
                }
                display.send_replace(derive_timecode(
                    clock.now_millis(),
                    snapshot.offset_millis,
                    snapshot.frame_rate,
                    &zone
                ));
            }
        }));
    }
}

impl<Tz: TimeZone> Drop for TimecodeEngine<Tz> {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}
