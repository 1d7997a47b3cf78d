#![forbid(unsafe_code)]

//! ledpipe daemon entry point.

mod app;
mod cli;

use std::process::ExitCode;

use ledpipe_core::lifecycle::{InterruptFlag, LifecycleError};
use tracing_subscriber::EnvFilter;

use crate::app::StartupError;
use crate::cli::Opts;

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_tracing();

    let outcome = InterruptFlag::install()
        .map_err(|err| StartupError::from(LifecycleError::Signal(err)))
        .and_then(|interrupt| app::run(&opts, &interrupt));
    if let Err(err) = &outcome {
        tracing::error!(error = %err, "ledpipe failed");
        eprintln!("ledpipe: {err}");
    }
    ExitCode::from(app::exit_status(&outcome))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEDPIPE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
