use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use export::ExportFormat;

use crate::app::App;
use crate::output;
use crate::ux_error;

#[derive(Args)]
pub struct ExportArgs {
    /// csv, tsv, edl, fcpxml or ale
    pub format: ExportFormat,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,

    /// Write to this file; a directory gets the suggested file name
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub async fn run(app: &App, args: ExportArgs) -> Result<()> {
    let mut controller = app.open(args.session.as_deref()).await?;
    let rendered = controller
        .export(args.format)
        .map_err(ux_error::from_session)?;
    let title = controller
        .current()
        .map(|s| s.name.clone())
        .unwrap_or_default();
    controller.dispose();

    match args.out {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(export::file_name(args.format, &title))
            } else {
                path
            };
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(&format!("Exported {} to {}", args.format, path.display()));
        }
        None => print!("{rendered}")
    }
    Ok(())
}
