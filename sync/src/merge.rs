//! Pure merge of a local and a remote copy of one session.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tn_core::{Note, Session};

/// Observable outcome of a merge that added notes the local view lacked.
///
/// Not a failure: the caller should refresh its note list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflictNotice {
    pub session_id: String,
    pub introduced_note_ids: Vec<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedSession {
    pub session: Session,
    pub notice: Option<MergeConflictNotice>
}

impl MergedSession {
    pub fn introduces_notes(&self) -> bool {
        self.notice.is_some()
    }
}

/// Merges two optional copies of a session.
///
/// - one side absent: the other side verbatim
/// - notes: union by id, remote seeded first and local overlaid on top
/// - tombstones: ids in `deleted_ids`, and notes deleted on either side,
///   come out deleted
/// - `mics`, `metadata`, `fps`, `tc_offset`: taken whole from the side with
///   the later `updated_at`, local on ties
/// - `updated_at` is stamped to `merged_at`
///
/// Deterministic for given inputs.
pub fn merge_sessions(
    local: Option<&Session>,
    remote: Option<&Session>,
    deleted_ids: &BTreeSet<String>,
    merged_at: DateTime<Utc>
) -> Option<MergedSession> {
    match (local, remote) {
        (None, None) => None,
        (Some(local), None) => Some(MergedSession {
            session: local.clone(),
            notice: None
        }),
        (None, Some(remote)) => Some(MergedSession {
            session: remote.clone(),
            notice: None
        }),
        (Some(local), Some(remote)) => Some(merge_pair(local, remote, deleted_ids, merged_at))
    }
}

/// Both-sides-present case of [`merge_sessions`].
pub fn merge_pair(
    local: &Session,
    remote: &Session,
    deleted_ids: &BTreeSet<String>,
    merged_at: DateTime<Utc>
) -> MergedSession {
    let notes = union_notes(&local.notes, &remote.notes, deleted_ids);

    let local_ids: HashSet<&str> = local.notes.iter().map(|n| n.id.as_str()).collect();
    let introduced_note_ids: Vec<String> = notes
        .iter()
        .filter(|n| n.is_live() && !local_ids.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect();

    let donor = if remote.updated_at > local.updated_at {
        remote
    } else {
        local
    };

    let session = Session {
        notes,
        mics: donor.mics.clone(),
        metadata: donor.metadata.clone(),
        fps: donor.fps,
        tc_offset: donor.tc_offset,
        updated_at: Some(merged_at),
        ..local.clone()
    };

    let notice = (!introduced_note_ids.is_empty()).then(|| MergeConflictNotice {
        session_id: session.id.clone(),
        introduced_note_ids
    });

    MergedSession { session, notice }
}

fn union_notes(local: &[Note], remote: &[Note], deleted_ids: &BTreeSet<String>) -> Vec<Note> {
    let mut by_id: BTreeMap<&str, Note> = BTreeMap::new();

    for note in remote.iter().chain(local) {
        let deleted_elsewhere = by_id.get(note.id.as_str()).is_some_and(|n| n.deleted);
        let mut merged = note.clone();
        merged.deleted |= deleted_elsewhere;
        by_id.insert(note.id.as_str(), merged);
    }

    for (id, note) in &mut by_id {
        if deleted_ids.contains(*id) {
            note.deleted = true;
        }
    }

    let mut notes: Vec<Note> = by_id.into_values().collect();
    notes.sort_by(|a, b| {
        a.timecode_in
            .cmp(&b.timecode_in)
            .then_with(|| a.id.cmp(&b.id))
    });
    notes
}
