use std::sync::atomic::{AtomicI64, Ordering};

/// Time-based id source.
///
/// Ids embed the creation millisecond. Two ids requested within the same
/// millisecond are bumped so ids from one generator are strictly increasing.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0)
        }
    }

    /// Returns `max(now_millis, previous + 1)`.
    pub fn next_millis(&self, now_millis: i64) -> i64 {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let next = now_millis.max(current + 1);
            match self
                .last
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => current = actual
            }
        }
    }

    pub fn note_id(&self, now_millis: i64) -> String {
        format!("note_{}", self.next_millis(now_millis))
    }

    pub fn session_id(&self, now_millis: i64) -> String {
        format!("session_{}", self.next_millis(now_millis))
    }

    /// Ids for user-added metadata fields carry no ordering meaning.
    pub fn field_id(&self) -> String {
        format!("field_{}", uuid::Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let ids = IdGenerator::new();
        assert_eq!(ids.note_id(1_000), "note_1000");
        assert_eq!(ids.note_id(1_000), "note_1001");
        assert_eq!(ids.note_id(999), "note_1002");
        assert_eq!(ids.note_id(5_000), "note_5000");
    }

    #[test]
    fn test_session_and_note_ids_share_sequence() {
        let ids = IdGenerator::new();
        let s = ids.session_id(42);
        let n = ids.note_id(42);
        assert_eq!(s, "session_42");
        assert_eq!(n, "note_43");
    }

    #[test]
    fn test_field_ids_are_unique() {
        let ids = IdGenerator::new();
        assert_ne!(ids.field_id(), ids.field_id());
        assert!(ids.field_id().starts_with("field_"));
    }
}
