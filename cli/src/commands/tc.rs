use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use errors::SessionError;
use timecode::Timecode;
use tn_core::FrameRate;

use crate::app::{self, App};
use crate::output;
use crate::ux_error;

#[derive(Args)]
pub struct TcArgs {
    /// Session whose clock to use (default: newest)
    #[arg(long)]
    pub session: Option<String>,

    /// Jam the clock so it reads this timecode now
    #[arg(long, value_name = "HH:MM:SS:FF", conflicts_with = "sync")]
    pub set: Option<String>,

    /// Drop any offset so the clock shows time of day
    #[arg(long)]
    pub sync: bool,

    /// Change the session frame rate
    #[arg(long, value_name = "FPS")]
    pub rate: Option<FrameRate>,

    /// Keep printing the running clock for this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub follow: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool
}

pub async fn run(app: &App, args: TcArgs) -> Result<()> {
    let mut controller = app.open(args.session.as_deref()).await?;

    if let Some(rate) = args.rate {
        controller.begin_timecode_edit();
        controller
            .set_frame_rate(rate)
            .map_err(ux_error::from_session)?;
    }

    if let Some(target) = &args.set {
        let fps = controller.timecode().frame_rate();
        let fields = Timecode::parse(target, fps)
            .map_err(|e| ux_error::invalid_timecode(target, &e))?;
        controller.begin_timecode_edit();
        controller
            .set_timecode_fields(fields)
            .map_err(|e| match e {
                SessionError::Timecode(tc) => ux_error::invalid_timecode(target, &tc).into(),
                other => ux_error::from_session(other)
            })?;
        let offset = controller.commit_timecode();
        if !args.json {
            output::success(&format!("Clock jammed to {target} (offset {offset} ms)"));
        }
    } else if args.sync {
        controller.sync_timecode_to_now();
        if !args.json {
            output::success("Clock synced to time of day");
        }
    } else {
        controller.resume_timecode();
    }

    let engine = controller.timecode();
    let fps = engine.frame_rate();

    if args.json {
        let value = serde_json::json!({
            "timecode": engine.formatted(),
            "fps": fps.as_f64(),
            "dropFrame": fps.is_drop_frame(),
            "offsetMillis": engine.offset_millis(),
            "sessionId": controller.current().map(|s| s.id.as_str()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if let Some(seconds) = args.follow {
        let mut rx = engine.subscribe();
        let deadline = tokio::time::sleep(Duration::from_secs(seconds));
        tokio::pin!(deadline);
        let mut stdout = std::io::stdout();
        loop {
            tokio::select! {
                () = &mut deadline => break,
                _ = tokio::signal::ctrl_c() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let tc = *rx.borrow_and_update();
                    write!(stdout, "\r{}", tc.format(fps).bold())?;
                    stdout.flush()?;
                }
            }
        }
        writeln!(stdout)?;
    } else {
        println!("{}  {}", engine.formatted().bold(), format!("@ {fps} fps").dimmed());
    }

    app::finish(controller).await
}
