pub mod export;
pub mod merge;
pub mod meta;
pub mod mic;
pub mod note;
pub mod session;
pub mod tc;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tn_core::FrameRate;

#[derive(Parser)]
#[command(
    name = "takenote",
    author,
    version,
    about = "TakeNote - timecoded session notes",
    long_about = "Timecode-stamped notes for a shoot, kept in sessions that sync with a \
                  store.\n\nEvery command works without configuration: sessions live in \
                  ./.takenote unless --data-dir, TN_DATA_DIR or a config file says otherwise."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (TOML or YAML)
    #[arg(long, global = true, env = "TN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding session records and the local cache
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<String>,

    /// Frame rate for new sessions
    #[arg(long, global = true, value_name = "FPS")]
    pub fps: Option<FrameRate>,

    /// User that owns the sessions
    #[arg(long, global = true, env = "TN_USER", default_value = "local")]
    pub user: String,

    /// Treat the user as a Pro subscriber
    #[arg(long, global = true, env = "TN_PRO")]
    pub pro: bool,

    /// Print collected metrics in Prometheus text format on exit
    #[arg(long, global = true)]
    pub metrics: bool
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show, jam or follow the session clock")]
    Tc(tc::TcArgs),

    #[command(subcommand, about = "Create, list, show and delete sessions")]
    Session(session::SessionCommand),

    #[command(subcommand, about = "Add, edit and delete notes")]
    Note(note::NoteCommand),

    #[command(subcommand, about = "Manage wireless mic channels")]
    Mic(mic::MicCommand),

    #[command(subcommand, about = "Edit session metadata (production, scene, take...)")]
    Meta(meta::MetaCommand),

    #[command(about = "Merge two copies of a session record")]
    Merge(merge::MergeArgs),

    #[command(about = "Export a session's notes for an editing system")]
    Export(export::ExportArgs),
}
