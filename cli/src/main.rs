use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod commands;
mod output;
pub mod ux_error;

use app::App;
use commands::{Cli, Commands};
use ux_error::UxError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        if let Some(ux) = e.downcast_ref::<UxError>() {
            ux.display();
            std::process::exit(1);
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let app = App::load(&cli.global)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app.config.observability.logging_level))
        )
        .init();

    let metrics = if cli.global.metrics && app.config.observability.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let result = match cli.command {
        Commands::Tc(args) => commands::tc::run(&app, args).await,
        Commands::Session(cmd) => commands::session::run(&app, cmd).await,
        Commands::Note(cmd) => commands::note::run(&app, cmd).await,
        Commands::Mic(cmd) => commands::mic::run(&app, cmd).await,
        Commands::Meta(cmd) => commands::meta::run(&app, cmd).await,
        Commands::Merge(args) => commands::merge::run(args),
        Commands::Export(args) => commands::export::run(&app, args).await
    };

    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }
    result
}
