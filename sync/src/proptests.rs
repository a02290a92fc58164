#[cfg(test)]
mod proptests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use tn_core::{FrameRate, Note, NoteKind, Session};

    use crate::merge::merge_pair;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn arb_note() -> impl Strategy<Value = Note> {
        (0u8..12, 0u32..24, 0u32..60, any::<bool>()).prop_map(|(id, h, m, deleted)| Note {
            deleted,
            ..Note::instant(
                format!("note_{id}"),
                format!("{h:02}:{m:02}:00:00"),
                format!("text {id}"),
                NoteKind::Quick,
                base()
            )
        })
    }

    fn arb_session() -> impl Strategy<Value = Session> {
        (
            prop::collection::vec(arb_note(), 0..10),
            prop::option::of(0i64..1_000),
            -5_000i64..5_000
        )
            .prop_map(|(notes, updated, offset)| {
                let mut s = Session::new(
                    "session_1".to_string(),
                    "Shoot".to_string(),
                    base(),
                    FrameRate::Fps25
                );
                s.notes = notes;
                s.updated_at = updated.map(|m| base() + Duration::minutes(m));
                s.tc_offset = offset;
                s
            })
    }

    fn arb_deleted() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set((0u8..12).prop_map(|id| format!("note_{id}")), 0..4)
    }

    fn merge_time(a: &Session, b: &Session, extra: i64) -> DateTime<Utc> {
        let latest = a.updated_at.max(b.updated_at).unwrap_or_else(base);
        latest + Duration::minutes(extra)
    }

    proptest! {
        #[test]
        fn test_merge_is_idempotent(
            a in arb_session(),
            b in arb_session(),
            deleted in arb_deleted(),
            extra in 0i64..100
        ) {
            let at = merge_time(&a, &b, extra);
            let once = merge_pair(&a, &b, &deleted, at).session;
            let twice = merge_pair(&once, &b, &deleted, at).session;
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_tombstoned_ids_never_visible(
            a in arb_session(),
            b in arb_session(),
            deleted in arb_deleted()
        ) {
            let merged = merge_pair(&a, &b, &deleted, base()).session;
            for id in &deleted {
                prop_assert!(merged.visible_notes().all(|n| &n.id != id));
            }
        }

        #[test]
        fn test_union_contains_every_id_exactly_once(a in arb_session(), b in arb_session()) {
            let merged = merge_pair(&a, &b, &BTreeSet::new(), base()).session;
            let expected: BTreeSet<&str> = a
                .notes
                .iter()
                .chain(&b.notes)
                .map(|n| n.id.as_str())
                .collect();
            let ids: Vec<&str> = merged.notes.iter().map(|n| n.id.as_str()).collect();
            let unique: BTreeSet<&str> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());
            prop_assert_eq!(unique, expected);
        }

        #[test]
        fn test_merged_notes_are_sorted(a in arb_session(), b in arb_session()) {
            let merged = merge_pair(&a, &b, &BTreeSet::new(), base()).session;
            for pair in merged.notes.windows(2) {
                let key = |n: &Note| (n.timecode_in.clone(), n.id.clone());
                prop_assert!(key(&pair[0]) <= key(&pair[1]));
            }
        }

        #[test]
        fn test_deletion_on_either_side_sticks(a in arb_session(), b in arb_session()) {
            let merged = merge_pair(&a, &b, &BTreeSet::new(), base()).session;
            for note in a.notes.iter().chain(&b.notes).filter(|n| n.deleted) {
                prop_assert!(merged.note(&note.id).is_some_and(|n| n.deleted));
            }
        }
    }
}
