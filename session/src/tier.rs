//! Tier gates. Pure predicates over already-resolved entitlement state.

use config::TierConfig;
use errors::SessionError;
use export::ExportFormat;
use tn_core::Tier;

pub fn can_create_session(tier: Tier, existing_sessions: usize, limits: &TierConfig) -> bool {
    tier == Tier::Pro || existing_sessions < limits.free_session_limit
}

/// `live_notes` excludes tombstones.
pub fn can_create_note(tier: Tier, live_notes: usize, limits: &TierConfig) -> bool {
    tier == Tier::Pro || live_notes < limits.free_note_limit
}

/// CSV is free; every editor interchange format is Pro.
pub fn can_export(tier: Tier, format: ExportFormat) -> bool {
    tier == Tier::Pro || !format.requires_pro()
}

pub(crate) fn session_limit(limits: &TierConfig) -> SessionError {
    SessionError::UpgradeRequired {
        resource: "sessions".to_string(),
        limit: limits.free_session_limit
    }
}

pub(crate) fn note_limit(limits: &TierConfig) -> SessionError {
    SessionError::UpgradeRequired {
        resource: "notes".to_string(),
        limit: limits.free_note_limit
    }
}

pub(crate) fn export_locked(format: ExportFormat) -> SessionError {
    SessionError::UpgradeRequired {
        resource: format!("{format} export"),
        limit: 0
    }
}
