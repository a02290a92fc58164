use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::{self, App};
use crate::output;
use crate::ux_error;

#[derive(Subcommand)]
pub enum MicCommand {
    #[command(about = "Add a wireless mic channel")]
    Add(AddArgs),

    #[command(about = "Remove a channel; the rest are renumbered")]
    Remove(NumberArgs),

    #[command(about = "Record who is wearing a channel from now on")]
    Assign(AssignArgs),

    #[command(about = "Change a channel's frequency")]
    Freq(FreqArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Frequency, e.g. 518.200
    #[arg(default_value = "")]
    pub frequency: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct NumberArgs {
    /// Channel number
    pub number: u32,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct AssignArgs {
    /// Channel number
    pub number: u32,

    /// Person wearing the mic
    pub person: String,

    /// Reference to a photo of the person
    #[arg(long)]
    pub photo: Option<String>,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct FreqArgs {
    /// Channel number
    pub number: u32,

    /// New frequency
    pub frequency: String,

    /// Session id (default: newest)
    #[arg(long)]
    pub session: Option<String>,
}

pub async fn run(app: &App, cmd: MicCommand) -> Result<()> {
    let session = match &cmd {
        MicCommand::Add(args) => args.session.clone(),
        MicCommand::Remove(args) => args.session.clone(),
        MicCommand::Assign(args) => args.session.clone(),
        MicCommand::Freq(args) => args.session.clone()
    };
    let mut controller = app.open(session.as_deref()).await?;
    controller.resume_timecode();

    match cmd {
        MicCommand::Add(args) => {
            let number = controller
                .add_mic(&args.frequency)
                .map_err(ux_error::from_session)?;
            output::success(&format!("Added mic {number}"));
        }
        MicCommand::Remove(args) => {
            controller
                .remove_mic(args.number)
                .map_err(ux_error::from_session)?;
            output::success(&format!("Removed mic {}", args.number));
        }
        MicCommand::Assign(args) => {
            controller
                .assign_mic(args.number, &args.person, args.photo)
                .map_err(ux_error::from_session)?;
            output::success(&format!("Mic {} is on {}", args.number, args.person));
        }
        MicCommand::Freq(args) => {
            controller
                .set_mic_frequency(args.number, &args.frequency)
                .map_err(ux_error::from_session)?;
            output::success(&format!("Mic {} at {}", args.number, args.frequency));
        }
    }

    if let Some(session) = controller.current() {
        for mic in &session.mics {
            println!("{}", output::mic_line(mic));
        }
    }
    app::finish(controller).await
}
