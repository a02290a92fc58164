use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::{self, App};
use crate::output;
use crate::ux_error;

#[derive(Subcommand)]
pub enum SessionCommand {
    #[command(about = "Create a session and make it current")]
    New(NewArgs),

    #[command(about = "List sessions, newest first")]
    List(ListArgs),

    #[command(about = "Show notes, mics and metadata of a session")]
    Show(ShowArgs),

    #[command(about = "Rename a session")]
    Rename(RenameArgs),

    #[command(about = "Delete a session and everything in it")]
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Session name (default: "Session N - <date>")
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Session id (default: newest)
    pub id: Option<String>,

    /// Include deleted notes
    #[arg(long)]
    pub all: bool,

    /// Output the full record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RenameArgs {
    /// New name
    pub name: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Session id
    pub id: String,
}

pub async fn run(app: &App, cmd: SessionCommand) -> Result<()> {
    match cmd {
        SessionCommand::New(args) => new(app, args).await,
        SessionCommand::List(args) => list(app, args).await,
        SessionCommand::Show(args) => show(app, args).await,
        SessionCommand::Rename(args) => rename(app, args).await,
        SessionCommand::Delete(args) => delete(app, args).await
    }
}

async fn new(app: &App, args: NewArgs) -> Result<()> {
    let mut controller = app.controller().await?;
    controller
        .list_sessions()
        .await
        .map_err(ux_error::from_session)?;
    let session = controller
        .create_session(args.name.as_deref())
        .await
        .map_err(ux_error::from_session)?;
    output::success(&format!("Created {} ({})", session.name, session.id));
    app::finish(controller).await
}

async fn list(app: &App, args: ListArgs) -> Result<()> {
    let mut controller = app.controller().await?;
    let sessions = controller
        .list_sessions()
        .await
        .map_err(ux_error::from_session)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else if sessions.is_empty() {
        output::info("No sessions yet");
        output::hint("Create one with `takenote session new`");
    } else {
        output::header("Sessions");
        for (i, session) in sessions.iter().enumerate() {
            println!("{}", output::session_line(session, i == 0));
        }
    }
    controller.dispose();
    Ok(())
}

async fn show(app: &App, args: ShowArgs) -> Result<()> {
    let mut controller = app.open(args.id.as_deref()).await?;
    if let Some(session) = controller.current() {
        if args.json {
            println!("{}", serde_json::to_string_pretty(session)?);
        } else {
            output::print_session(session, args.all);
        }
    }
    controller.dispose();
    Ok(())
}

async fn rename(app: &App, args: RenameArgs) -> Result<()> {
    let mut controller = app.open(args.session.as_deref()).await?;
    controller
        .rename_session(&args.name)
        .map_err(ux_error::from_session)?;
    output::success(&format!("Renamed to {}", args.name.trim()));
    app::finish(controller).await
}

async fn delete(app: &App, args: DeleteArgs) -> Result<()> {
    let mut controller = app.controller().await?;
    let owned = controller
        .list_sessions()
        .await
        .map_err(ux_error::from_session)?
        .iter()
        .any(|s| s.id == args.id);
    if !owned {
        return Err(ux_error::session_not_found(&args.id).into());
    }
    controller
        .delete_session(&args.id)
        .await
        .map_err(ux_error::from_session)?;
    output::success(&format!("Deleted {}", args.id));
    app::finish(controller).await
}
