use std::io::BufRead;

use anyhow::Result;
use clap::{Args, Subcommand};
use errors::SessionError;

use crate::app::{self, App};
use crate::output;
use crate::ux_error;

#[derive(Subcommand)]
pub enum NoteCommand {
    #[command(about = "Add a note at the current timecode")]
    Add(AddArgs),

    #[command(about = "Record a note spanning from now until its text is entered")]
    Long(LongArgs),

    #[command(about = "Add a note at a given timecode")]
    Custom(CustomArgs),

    #[command(about = "Replace the text of a note")]
    Edit(EditArgs),

    #[command(about = "Delete a note")]
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct SessionArg {
    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Note text
    pub text: String,

    #[command(flatten)]
    pub target: SessionArg,
}

#[derive(Args)]
pub struct LongArgs {
    #[command(flatten)]
    pub target: SessionArg,
}

#[derive(Args)]
pub struct CustomArgs {
    /// In point, HH:MM:SS:FF
    pub timecode: String,

    /// Note text
    pub text: String,

    #[command(flatten)]
    pub target: SessionArg,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note id
    pub id: String,

    /// New text
    pub text: String,

    #[command(flatten)]
    pub target: SessionArg,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Note id
    pub id: String,

    #[command(flatten)]
    pub target: SessionArg,
}

pub async fn run(app: &App, cmd: NoteCommand) -> Result<()> {
    match cmd {
        NoteCommand::Add(args) => add(app, args).await,
        NoteCommand::Long(args) => long(app, args).await,
        NoteCommand::Custom(args) => custom(app, args).await,
        NoteCommand::Edit(args) => edit(app, args).await,
        NoteCommand::Delete(args) => delete(app, args).await
    }
}

async fn add(app: &App, args: AddArgs) -> Result<()> {
    let mut controller = app.open(args.target.session.as_deref()).await?;
    controller.resume_timecode();
    let note = controller
        .add_quick_note(&args.text)
        .map_err(ux_error::from_session)?;
    println!("{}", output::note_line(&note));
    app::finish(controller).await
}

async fn long(app: &App, args: LongArgs) -> Result<()> {
    let mut controller = app.open(args.target.session.as_deref()).await?;
    controller.resume_timecode();
    let timecode_in = controller
        .start_long_note()
        .map_err(ux_error::from_session)?;
    output::info(&format!(
        "Recording from {timecode_in}. Type the note and press Enter; an empty line cancels"
    ));

    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map(|_| line)
    })
    .await??;

    if line.trim().is_empty() {
        controller.cancel_long_note();
        output::warn("Long note cancelled");
    } else {
        let note = controller
            .finish_long_note(&line)
            .map_err(ux_error::from_session)?;
        println!("{}", output::note_line(&note));
    }
    app::finish(controller).await
}

async fn custom(app: &App, args: CustomArgs) -> Result<()> {
    let mut controller = app.open(args.target.session.as_deref()).await?;
    let note = controller
        .add_custom_note(&args.timecode, &args.text)
        .map_err(|e| match e {
            SessionError::Timecode(tc) => ux_error::invalid_timecode(&args.timecode, &tc).into(),
            other => ux_error::from_session(other)
        })?;
    println!("{}", output::note_line(&note));
    app::finish(controller).await
}

async fn edit(app: &App, args: EditArgs) -> Result<()> {
    let mut controller = app.open(args.target.session.as_deref()).await?;
    controller
        .edit_note(&args.id, &args.text)
        .map_err(ux_error::from_session)?;
    output::success(&format!("Updated {}", args.id));
    app::finish(controller).await
}

async fn delete(app: &App, args: DeleteArgs) -> Result<()> {
    let mut controller = app.open(args.target.session.as_deref()).await?;
    controller
        .delete_note(&args.id)
        .map_err(ux_error::from_session)?;
    output::success(&format!("Deleted {}", args.id));
    app::finish(controller).await
}
