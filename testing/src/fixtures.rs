use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use errors::StorageError;
use parking_lot::Mutex;
use storage::{InMemorySessionStore, MemoryCache};
use tn_core::{
    Clock, FrameRate, LocalCache, Note, NoteKind, RemoteSessionStore, Session, UserId
};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{id}")
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap_or_else(|| panic!("invalid test user id {id:?}"))
}

/// 2025-06-01 09:00:00 UTC, the default instant for fixtures.
pub fn shoot_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn note(id: &str, timecode: &str) -> Note {
    Note::instant(
        id.to_string(),
        timecode.to_string(),
        format!("note {id}"),
        NoteKind::Quick,
        shoot_day()
    )
}

pub fn tombstone(id: &str, timecode: &str) -> Note {
    Note {
        deleted: true,
        ..note(id, timecode)
    }
}

pub fn session(id: &str, notes: Vec<Note>) -> Session {
    let mut s = Session::new(
        id.to_string(),
        format!("Session {id}"),
        shoot_day(),
        FrameRate::Fps25
    );
    s.notes = notes;
    s
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64
}

impl ManualClock {
    pub fn at(instant: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(instant.timestamp_millis())
        })
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis
            .store(instant.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            millis: AtomicI64::new(shoot_day().timestamp_millis())
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}

/// Local cache that counts writes and can be made to refuse them.
#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    writes: AtomicUsize,
    failing: AtomicBool
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocalCache for RecordingCache {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                backend: "recording-cache".to_string(),
                reason: "quota exceeded".to_string()
            });
        }
        self.inner.set(key, value)
    }
}

/// Session store wrapper with a network switch and call counters.
pub struct FlakyStore<S: RemoteSessionStore = InMemorySessionStore> {
    inner: S,
    online: AtomicBool,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
    last_put: Mutex<Option<Session>>
}

impl FlakyStore<InMemorySessionStore> {
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::wrap(InMemorySessionStore::new()))
    }
}

impl<S: RemoteSessionStore> FlakyStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            online: AtomicBool::new(true),
            fail_gets: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            last_put: Mutex::new(None)
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn set_online(&self, online: bool) {
        tracing::debug!(online, "FlakyStore network switched");
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes `get` fail while `put` keeps working.
    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Makes `put` fail while `get` keeps working.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn last_put(&self) -> Option<Session> {
        self.last_put.lock().clone()
    }

    /// Writes directly to the wrapped store, bypassing counters and the
    /// network switch. Simulates another device.
    pub async fn seed(&self, user_id: &UserId, session: &Session) -> Result<(), StorageError> {
        self.inner.put(user_id, session).await
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable {
                backend: "flaky".to_string(),
                reason: "network offline".to_string()
            })
        }
    }
}

#[async_trait]
impl<S: RemoteSessionStore> RemoteSessionStore for FlakyStore<S> {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        self.check_online()?;
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed {
                backend: "flaky".to_string(),
                reason: "injected read failure".to_string()
            });
        }
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(session_id).await
    }

    async fn put(&self, user_id: &UserId, session: &Session) -> Result<(), StorageError> {
        self.check_online()?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                backend: "flaky".to_string(),
                reason: "injected write failure".to_string()
            });
        }
        self.inner.put(user_id, session).await?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        *self.last_put.lock() = Some(session.clone());
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<Session>, StorageError> {
        self.check_online()?;
        self.inner.list(user_id).await
    }

    async fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        self.check_online()?;
        self.inner.delete(session_id).await
    }
}
