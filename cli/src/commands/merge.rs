use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use sync::merge_sessions;
use tn_core::Session;

use crate::output;
use crate::ux_error;

#[derive(Args)]
pub struct MergeArgs {
    /// Local copy (JSON session record); a missing file counts as absent
    pub local: PathBuf,

    /// Remote copy (JSON session record); a missing file counts as absent
    pub remote: PathBuf,

    /// Note ids deleted locally, comma separated
    #[arg(long, value_delimiter = ',')]
    pub deleted: Vec<String>,

    /// Write the merged record here instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

fn read_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let session = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a session record", path.display()))?;
    Ok(Some(session))
}

pub fn run(args: MergeArgs) -> Result<()> {
    let local = read_session(&args.local)?;
    let remote = read_session(&args.remote)?;
    let deleted: BTreeSet<String> = args.deleted.into_iter().collect();

    let merged = merge_sessions(local.as_ref(), remote.as_ref(), &deleted, Utc::now())
        .ok_or_else(ux_error::merge_inputs_missing)?;

    if let Some(notice) = &merged.notice {
        output::info(&format!(
            "Merge brought in {} note(s) the local copy lacked: {}",
            notice.introduced_note_ids.len(),
            notice.introduced_note_ids.join(", ")
        ));
    }

    let json = serde_json::to_string_pretty(&merged.session)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(&format!("Merged record written to {}", path.display()));
        }
        None => println!("{json}")
    }
    Ok(())
}
