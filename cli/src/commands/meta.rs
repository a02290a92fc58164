use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::{self, App};
use crate::output;
use crate::ux_error;

#[derive(Subcommand)]
pub enum MetaCommand {
    #[command(about = "Set the value of a metadata field")]
    Set(SetArgs),

    #[command(about = "Add a custom metadata field")]
    Add(AddArgs),

    #[command(about = "Rename a metadata field")]
    Relabel(RelabelArgs),

    #[command(about = "Remove a metadata field")]
    Remove(RemoveArgs),
}

#[derive(Args)]
pub struct SetArgs {
    /// Field id, e.g. scene
    pub field: String,

    /// Value; empty clears the field
    #[arg(default_value = "")]
    pub value: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Label shown for the field
    pub label: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct RelabelArgs {
    /// Field id
    pub field: String,

    /// New label
    pub label: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Field id
    pub field: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

pub async fn run(app: &App, cmd: MetaCommand) -> Result<()> {
    let session = match &cmd {
        MetaCommand::Set(args) => args.session.clone(),
        MetaCommand::Add(args) => args.session.clone(),
        MetaCommand::Relabel(args) => args.session.clone(),
        MetaCommand::Remove(args) => args.session.clone()
    };
    let mut controller = app.open(session.as_deref()).await?;

    match cmd {
        MetaCommand::Set(args) => {
            controller
                .set_metadata_value(&args.field, &args.value)
                .map_err(ux_error::from_session)?;
        }
        MetaCommand::Add(args) => {
            let id = controller
                .add_metadata_field(&args.label)
                .map_err(ux_error::from_session)?;
            output::success(&format!("Added field {id}"));
        }
        MetaCommand::Relabel(args) => {
            controller
                .relabel_metadata_field(&args.field, &args.label)
                .map_err(ux_error::from_session)?;
        }
        MetaCommand::Remove(args) => {
            controller
                .remove_metadata_field(&args.field)
                .map_err(ux_error::from_session)?;
        }
    }

    if let Some(session) = controller.current() {
        for field in &session.metadata {
            println!("  {:<12} {:<14} {}", field.id, field.label, field.value);
        }
    }
    app::finish(controller).await
}
