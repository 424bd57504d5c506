//! Entry point: parse CLI, install logging and dispatch to command handlers.

use clap::Parser;
use pl_collector::{
    cli::{Commands, PlCollector},
    collector::CancelFlag,
    commands::{collect::handle_collect, show::handle_show},
};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = PlCollector::parse();
    init_logging(app.log_level.as_deref());

    match app.command {
        Commands::Collect { args } => {
            let cancel = CancelFlag::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, finishing in-flight work");
                    on_signal.cancel();
                }
            });

            let summary = handle_collect(args, cancel).await?;
            if let Some(reason) = summary.failure() {
                error!(%reason, "collection run failed");
                std::process::exit(1);
            }
        }
        Commands::Show { args } => handle_show(args)?,
    }

    Ok(())
}
