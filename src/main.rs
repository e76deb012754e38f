use std::{io, process::ExitCode};

use clap::Parser;
use revenue::{config::Config, pipeline};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revenue=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::parse();

    match pipeline::run(&config, io::stdout().lock()) {
        Ok(summary) => {
            info!(?summary, "process completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed, revenue table left untouched");
            ExitCode::FAILURE
        }
    }
}
